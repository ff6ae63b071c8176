//! Signing orchestrator
//!
//! Sequences parameter resolution, timestamp configuration and visible
//! field placement, then hands the assembled configuration to the
//! registered backend. Each call works on its own copy of the document.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::backend::{SignatureBackend, SignatureBackends, TspSource};
use crate::certificate::{CertificateLoader, CertificateToken, X509CertificateLoader};
use crate::config::ServiceConfig;
use crate::error::{BackendError, Error, Result};
use crate::layout::SignatureFieldAllocator;
use crate::pdf_document::PdfDocument;
use crate::requests::{
    CounterSignatureRequest, ExtensionRequest, SignatureDocumentRequest, TimestampRequest,
    VisualSignatureRequest,
};
use crate::signature::{
    BLevelParameters, BackendKind, CounterSignatureParameters, ParameterResolver,
    SignatureFieldParameters, SignatureImageParameters, SignatureImageTextParameters,
    SignatureParameters, TimestampParameters, TimestampRoles,
};
use crate::types::{
    DssDocument, SignatureAlgorithm, SignatureForm, SignatureValue, TimestampToken, ToBeSigned,
};

/// Configuration ready to be handed to a backend
pub struct PreparedSignature {
    pub backend_kind: BackendKind,
    pub backend: Arc<dyn SignatureBackend>,
    /// Document to sign, possibly with a page appended for the visible field
    pub document: DssDocument,
    pub parameters: SignatureParameters,
}

impl std::fmt::Debug for PreparedSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedSignature")
            .field("backend_kind", &self.backend_kind)
            .field("document", &self.document)
            .field("parameters", &self.parameters)
            .finish()
    }
}

pub struct SigningService {
    config: Arc<ServiceConfig>,
    resolver: ParameterResolver,
    allocator: SignatureFieldAllocator,
    backends: SignatureBackends,
    tsp: Arc<dyn TspSource>,
    certificates: Arc<dyn CertificateLoader>,
}

impl SigningService {
    pub fn new(
        config: ServiceConfig,
        backends: SignatureBackends,
        tsp: Arc<dyn TspSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver: ParameterResolver::new(&config),
            allocator: SignatureFieldAllocator::new(&config.layout),
            config: Arc::new(config),
            backends,
            tsp,
            certificates: Arc::new(X509CertificateLoader::new()),
        })
    }

    pub fn with_certificate_loader(mut self, loader: Arc<dyn CertificateLoader>) -> Self {
        self.certificates = loader;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Bytes the signer has to sign for this request
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), form = %request.signature_form))]
    pub async fn get_data_to_sign(&self, request: &SignatureDocumentRequest) -> Result<ToBeSigned> {
        let prepared = self.prepare(request)?;
        let data = prepared
            .backend
            .get_data_to_sign(&prepared.document, &prepared.parameters)
            .await
            .map_err(|e| backend_failure("get_data_to_sign", e))?;
        info!("Computed {} bytes to sign", data.bytes.len());
        Ok(data)
    }

    /// Produces the signed document from the signer's signature value
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), form = %request.signature_form))]
    pub async fn sign_document(&self, request: &SignatureDocumentRequest) -> Result<DssDocument> {
        let value = match &request.signature_value {
            Some(value) if !value.is_empty() => value.clone(),
            _ => return Err(Error::InvalidInput("Signature value is mandatory".into())),
        };
        let algorithm = SignatureAlgorithm::from_parts(
            request.encryption_algorithm.unwrap_or_default(),
            request.digest_algorithm,
        )?;

        let prepared = self.prepare(request)?;
        let signature = SignatureValue { algorithm, value };
        let signed = prepared
            .backend
            .sign_document(
                &prepared.document,
                &prepared.parameters,
                &signature,
                self.tsp.as_ref(),
            )
            .await
            .map_err(|e| backend_failure("sign_document", e))?;

        info!("Signed document with {}", prepared.parameters.level());
        Ok(signed)
    }

    /// Timestamp over the content, obtained before signing
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), form = %request.signature_form))]
    pub async fn get_content_timestamp(
        &self,
        request: &SignatureDocumentRequest,
    ) -> Result<TimestampToken> {
        let prepared = self.prepare(request)?;
        prepared
            .backend
            .get_content_timestamp(&prepared.document, &prepared.parameters, self.tsp.as_ref())
            .await
            .map_err(|e| backend_failure("get_content_timestamp", e))
    }

    /// Raises an existing signature to a higher level
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), form = %request.signature_form))]
    pub async fn extend(&self, request: &ExtensionRequest) -> Result<DssDocument> {
        request.validate()?;
        let resolution = self
            .resolver
            .resolve(request.container_type, request.signature_form)?;
        let parameters = resolution
            .parameters
            .level(request.signature_level)
            .detached_contents(request.original_documents.clone())
            .build()?;

        let backend = self.backends.get(resolution.backend)?;
        let extended = backend
            .extend_document(&request.signed_document, &parameters, self.tsp.as_ref())
            .await
            .map_err(|e| backend_failure("extend_document", e))?;

        info!("Extended signature to {}", request.signature_level);
        Ok(extended)
    }

    /// Timestamps documents without signing them.
    ///
    /// Without a container exactly one document is accepted and it gets a
    /// PAdES document timestamp. With a container every document is wrapped
    /// and timestamped as ASiC with CAdES.
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), documents = request.documents.len()))]
    pub async fn timestamp(&self, request: &TimestampRequest) -> Result<DssDocument> {
        request.validate()?;

        let (kind, parameters) = match request.container_type {
            None => {
                if request.documents.len() != 1 {
                    return Err(Error::TooManyDocuments(request.documents.len()));
                }
                (
                    BackendKind::Pades,
                    TimestampParameters::pades(request.digest_algorithm),
                )
            }
            Some(container) => (
                BackendKind::AsicWithCades,
                TimestampParameters::asic_with_cades(container, request.digest_algorithm),
            ),
        };

        let backend = self.backends.get(kind)?;
        let timestamped = backend
            .timestamp(&request.documents, &parameters, self.tsp.as_ref())
            .await
            .map_err(|e| backend_failure("timestamp", e))?;

        info!("Timestamped {} document(s) with {}", request.documents.len(), kind);
        Ok(timestamped)
    }

    /// Bytes the signer has to sign to counter-sign an existing signature
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), form = %request.signature_form))]
    pub async fn get_data_to_be_counter_signed(
        &self,
        request: &CounterSignatureRequest,
    ) -> Result<ToBeSigned> {
        let (backend, parameters) = self.prepare_counter(request)?;
        backend
            .get_data_to_be_counter_signed(&request.signed_document, &parameters)
            .await
            .map_err(|e| backend_failure("get_data_to_be_counter_signed", e))
    }

    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), form = %request.signature_form))]
    pub async fn counter_sign_signature(
        &self,
        request: &CounterSignatureRequest,
    ) -> Result<DssDocument> {
        let value = match &request.signature_value {
            Some(value) if !value.is_empty() => value.clone(),
            _ => return Err(Error::InvalidInput("Signature value is mandatory".into())),
        };
        let algorithm = SignatureAlgorithm::from_parts(
            request.encryption_algorithm.unwrap_or_default(),
            request.digest_algorithm,
        )?;

        let (backend, parameters) = self.prepare_counter(request)?;
        let signature = SignatureValue { algorithm, value };
        let signed = backend
            .counter_sign_signature(
                &request.signed_document,
                &parameters,
                &signature,
                self.tsp.as_ref(),
            )
            .await
            .map_err(|e| backend_failure("counter_sign_signature", e))?;

        info!(
            "Counter-signed signature {}",
            request.signature_id_to_counter_sign
        );
        Ok(signed)
    }

    /// Resolves and assembles the configuration of a signature request.
    ///
    /// Deterministic for a given request: preparing twice yields the same
    /// document and parameters, which keeps the data-to-sign and sign steps
    /// consistent.
    pub fn prepare(&self, request: &SignatureDocumentRequest) -> Result<PreparedSignature> {
        request.validate()?;

        let form = request.signature_form;
        let container = request.container_type;
        let resolution = self.resolver.resolve(container, form)?;
        debug!("Resolved {} / {:?} to {}", form, container, resolution.backend);

        let signing_certificate = self.load_signing_certificate(
            request.signing_certificate.as_deref(),
            request.signing_date,
            request.sign_with_expired_certificate,
        )?;
        let chain = self.load_chain(&request.certificate_chain)?;

        let timestamps = TimestampParameters::build(form, container, request.digest_algorithm)?;

        let b_level = BLevelParameters {
            signing_date: request.signing_date,
            claimed_signer_roles: request.claimed_signer_roles.clone(),
            signer_location: request.signer_location.clone(),
            signature_policy: request.signature_policy.clone(),
            ..BLevelParameters::default()
        };

        let mut builder = resolution
            .parameters
            .level(request.signature_level)
            .packaging(request.signature_packaging)
            .digest_algorithm(request.digest_algorithm)
            .b_level(b_level)
            .certificate_chain(chain)
            .sign_with_expired_certificate(request.sign_with_expired_certificate)
            .timestamps(TimestampRoles::shared(timestamps));

        if let Some(encryption) = request.encryption_algorithm {
            builder = builder.encryption_algorithm(encryption);
        }
        if let Some(token) = &request.content_timestamp {
            builder = builder.content_timestamp(token.clone());
        }

        let mut document = request.document.clone();
        if let Some(visual) = &request.visual_signature {
            if form != SignatureForm::PAdES {
                return Err(Error::InvalidInput(format!(
                    "Visible signatures are only available for PAdES, not {}",
                    form
                )));
            }
            let (image, placed) =
                self.visual_parameters(visual, &document, &signing_certificate, request)?;
            if let Some(bytes) = placed {
                document = document.with_bytes(bytes);
            }
            builder = builder.image(image);
        }

        let parameters = builder.signing_certificate(signing_certificate).build()?;
        let backend = self.backends.get(resolution.backend)?;

        Ok(PreparedSignature {
            backend_kind: resolution.backend,
            backend,
            document,
            parameters,
        })
    }

    fn prepare_counter(
        &self,
        request: &CounterSignatureRequest,
    ) -> Result<(Arc<dyn SignatureBackend>, CounterSignatureParameters)> {
        request.validate()?;

        let resolution = self
            .resolver
            .resolve_counter(request.container_type.is_some(), request.signature_form)?;
        if request.signature_level.form() != resolution.format.form() {
            return Err(Error::unsupported_with(
                request.signature_form,
                request.container_type,
                format!("level {}", request.signature_level),
            ));
        }

        let signing_certificate = self.load_signing_certificate(
            request.signing_certificate.as_deref(),
            request.signing_date,
            false,
        )?;

        let parameters = CounterSignatureParameters {
            format: resolution.format,
            signature_id: request.signature_id_to_counter_sign.clone(),
            level: request.signature_level,
            digest_algorithm: request.digest_algorithm,
            b_level: BLevelParameters {
                signing_date: request.signing_date,
                claimed_signer_roles: request.claimed_signer_roles.clone(),
                ..BLevelParameters::default()
            },
            signing_certificate,
            certificate_chain: self.load_chain(&request.certificate_chain)?,
        };

        Ok((self.backends.get(resolution.backend)?, parameters))
    }

    /// Builds the overlay and, when no target field was given, places a new
    /// one. Returns the saved document when placement modified it.
    fn visual_parameters(
        &self,
        visual: &VisualSignatureRequest,
        document: &DssDocument,
        signer: &CertificateToken,
        request: &SignatureDocumentRequest,
    ) -> Result<(SignatureImageParameters, Option<Vec<u8>>)> {
        let (field, placed) = match &visual.field {
            Some(field) => (field.clone(), None),
            None => {
                let mut pdf = PdfDocument::load(&document.bytes)?;
                let allocation = self.allocator.allocate(&mut pdf)?;
                let placed = if allocation.document_modified {
                    Some(pdf.save()?)
                } else {
                    None
                };
                (SignatureFieldParameters::from(allocation.placement), placed)
            }
        };

        let text = match &visual.text {
            Some(text) => SignatureImageTextParameters::with_text(text.clone(), &self.config.overlay),
            None => SignatureImageTextParameters::signer_caption(
                signer.signer_name(),
                request.signing_date,
                &self.config.overlay,
            ),
        };

        Ok((
            SignatureImageParameters {
                field,
                image: visual.image.clone(),
                text: Some(text),
            },
            placed,
        ))
    }

    fn load_signing_certificate(
        &self,
        bytes: Option<&[u8]>,
        signing_date: chrono::DateTime<chrono::Utc>,
        allow_expired: bool,
    ) -> Result<CertificateToken> {
        let bytes = bytes
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Error::InvalidInput("Signing certificate is mandatory".into()))?;
        let certificate = self.certificates.load(bytes)?;

        if !allow_expired && !certificate.is_valid_at(signing_date) {
            return Err(Error::InvalidInput(format!(
                "Signing certificate is not valid at {}",
                signing_date
            )));
        }
        Ok(certificate)
    }

    fn load_chain(&self, chain: &[Vec<u8>]) -> Result<Vec<CertificateToken>> {
        chain
            .iter()
            .map(|bytes| self.certificates.load(bytes))
            .collect()
    }
}

fn backend_failure(operation: &'static str, err: BackendError) -> Error {
    error!("Signing backend failed during {}: {}", operation, err);
    Error::backend(operation, err)
}
