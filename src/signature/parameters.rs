//! Signature parameters
//!
//! [`SignatureParameters`] is assembled once per request through
//! [`SignatureParametersBuilder`] and is read-only afterwards. The builder
//! comes out of the resolver already carrying the format-specific defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::certificate::CertificateToken;
use crate::error::{Error, Result};
use crate::signature::image::SignatureImageParameters;
use crate::signature::timestamp::TimestampRoles;
use crate::types::{
    base64_bytes_opt, ContainerType, DigestAlgorithm, DssDocument, EncryptionAlgorithm,
    JwsSerializationType, SigDMechanism, SignatureForm, SignatureLevel, SignaturePackaging,
    TimestampToken,
};

/// Claimed place of signing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerLocation {
    pub country: Option<String>,
    pub locality: Option<String>,
    pub postal_code: Option<String>,
    pub state_or_province: Option<String>,
    pub postal_address: Vec<String>,
}

/// Explicit signature policy reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignaturePolicy {
    pub id: Option<String>,
    pub description: Option<String>,
    pub digest_algorithm: Option<DigestAlgorithm>,
    #[serde(with = "base64_bytes_opt")]
    pub digest_value: Option<Vec<u8>>,
    pub qualifier: Option<String>,
    pub spuri: Option<String>,
}

/// Baseline attributes shared by every standard
#[derive(Debug, Clone, PartialEq)]
pub struct BLevelParameters {
    pub signing_date: DateTime<Utc>,
    pub claimed_signer_roles: Vec<String>,
    pub signer_location: Option<SignerLocation>,
    pub signature_policy: Option<SignaturePolicy>,
    pub trust_anchor_bp_policy: bool,
}

impl Default for BLevelParameters {
    fn default() -> Self {
        Self {
            signing_date: Utc::now(),
            claimed_signer_roles: Vec::new(),
            signer_location: None,
            signature_policy: None,
            trust_anchor_bp_policy: true,
        }
    }
}

/// Format-specific part of the configuration
#[derive(Debug, Clone, PartialEq)]
pub enum FormatParameters {
    Cades,
    Pades {
        /// Bytes reserved for the embedded CMS container
        content_size: usize,
        image: Option<SignatureImageParameters>,
    },
    Xades,
    Jades {
        serialization: JwsSerializationType,
        sig_d_mechanism: SigDMechanism,
    },
    AsicWithCades {
        container: ContainerType,
    },
    AsicWithXades {
        container: ContainerType,
    },
}

impl FormatParameters {
    pub fn form(&self) -> SignatureForm {
        match self {
            FormatParameters::Cades | FormatParameters::AsicWithCades { .. } => SignatureForm::CAdES,
            FormatParameters::Pades { .. } => SignatureForm::PAdES,
            FormatParameters::Xades | FormatParameters::AsicWithXades { .. } => SignatureForm::XAdES,
            FormatParameters::Jades { .. } => SignatureForm::JAdES,
        }
    }

    pub fn container(&self) -> Option<ContainerType> {
        match self {
            FormatParameters::AsicWithCades { container }
            | FormatParameters::AsicWithXades { container } => Some(*container),
            _ => None,
        }
    }
}

/// Fully assembled, immutable configuration handed to a signing backend
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParameters {
    format: FormatParameters,
    level: SignatureLevel,
    packaging: Option<SignaturePackaging>,
    digest_algorithm: DigestAlgorithm,
    encryption_algorithm: Option<EncryptionAlgorithm>,
    b_level: BLevelParameters,
    signing_certificate: Option<CertificateToken>,
    certificate_chain: Vec<CertificateToken>,
    sign_with_expired_certificate: bool,
    content_timestamps: Vec<TimestampToken>,
    timestamps: Option<TimestampRoles>,
    detached_contents: Vec<DssDocument>,
}

impl SignatureParameters {
    pub fn format(&self) -> &FormatParameters {
        &self.format
    }

    pub fn form(&self) -> SignatureForm {
        self.format.form()
    }

    pub fn container(&self) -> Option<ContainerType> {
        self.format.container()
    }

    pub fn level(&self) -> SignatureLevel {
        self.level
    }

    pub fn packaging(&self) -> Option<SignaturePackaging> {
        self.packaging
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    pub fn encryption_algorithm(&self) -> Option<EncryptionAlgorithm> {
        self.encryption_algorithm
    }

    pub fn b_level(&self) -> &BLevelParameters {
        &self.b_level
    }

    pub fn signing_certificate(&self) -> Option<&CertificateToken> {
        self.signing_certificate.as_ref()
    }

    pub fn certificate_chain(&self) -> &[CertificateToken] {
        &self.certificate_chain
    }

    pub fn sign_with_expired_certificate(&self) -> bool {
        self.sign_with_expired_certificate
    }

    pub fn content_timestamps(&self) -> &[TimestampToken] {
        &self.content_timestamps
    }

    pub fn timestamps(&self) -> Option<&TimestampRoles> {
        self.timestamps.as_ref()
    }

    pub fn detached_contents(&self) -> &[DssDocument] {
        &self.detached_contents
    }

    /// Visual overlay, PAdES only
    pub fn image(&self) -> Option<&SignatureImageParameters> {
        match &self.format {
            FormatParameters::Pades { image, .. } => image.as_ref(),
            _ => None,
        }
    }
}

/// Collects the pieces of a [`SignatureParameters`]
#[derive(Debug, Clone)]
pub struct SignatureParametersBuilder {
    format: FormatParameters,
    level: Option<SignatureLevel>,
    packaging: Option<SignaturePackaging>,
    digest_algorithm: DigestAlgorithm,
    encryption_algorithm: Option<EncryptionAlgorithm>,
    b_level: BLevelParameters,
    signing_certificate: Option<CertificateToken>,
    certificate_chain: Vec<CertificateToken>,
    sign_with_expired_certificate: bool,
    content_timestamps: Vec<TimestampToken>,
    timestamps: Option<TimestampRoles>,
    detached_contents: Vec<DssDocument>,
    image: Option<SignatureImageParameters>,
}

impl SignatureParametersBuilder {
    pub fn new(format: FormatParameters) -> Self {
        Self {
            format,
            level: None,
            packaging: None,
            digest_algorithm: DigestAlgorithm::default(),
            encryption_algorithm: None,
            b_level: BLevelParameters::default(),
            signing_certificate: None,
            certificate_chain: Vec::new(),
            sign_with_expired_certificate: false,
            content_timestamps: Vec::new(),
            timestamps: None,
            detached_contents: Vec::new(),
            image: None,
        }
    }

    pub fn format(&self) -> &FormatParameters {
        &self.format
    }

    pub fn level(mut self, level: SignatureLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn packaging(mut self, packaging: SignaturePackaging) -> Self {
        self.packaging = Some(packaging);
        self
    }

    pub fn digest_algorithm(mut self, digest_algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = digest_algorithm;
        self
    }

    pub fn encryption_algorithm(mut self, encryption_algorithm: EncryptionAlgorithm) -> Self {
        self.encryption_algorithm = Some(encryption_algorithm);
        self
    }

    pub fn b_level(mut self, b_level: BLevelParameters) -> Self {
        self.b_level = b_level;
        self
    }

    pub fn signing_certificate(mut self, certificate: CertificateToken) -> Self {
        self.signing_certificate = Some(certificate);
        self
    }

    pub fn certificate_chain(mut self, chain: Vec<CertificateToken>) -> Self {
        self.certificate_chain = chain;
        self
    }

    pub fn sign_with_expired_certificate(mut self, allowed: bool) -> Self {
        self.sign_with_expired_certificate = allowed;
        self
    }

    pub fn content_timestamp(mut self, token: TimestampToken) -> Self {
        self.content_timestamps = vec![token];
        self
    }

    pub fn timestamps(mut self, roles: TimestampRoles) -> Self {
        self.timestamps = Some(roles);
        self
    }

    pub fn detached_contents(mut self, documents: Vec<DssDocument>) -> Self {
        self.detached_contents = documents;
        self
    }

    pub fn image(mut self, image: SignatureImageParameters) -> Self {
        self.image = Some(image);
        self
    }

    /// Freezes the configuration.
    ///
    /// Fails when no level was given, when the level belongs to another
    /// standard, or when a visual overlay is attached to a non-PAdES format.
    pub fn build(self) -> Result<SignatureParameters> {
        let form = self.format.form();
        let container = self.format.container();

        let level = self
            .level
            .ok_or_else(|| Error::InvalidInput("Signature level is mandatory".into()))?;
        if level.form() != form {
            return Err(Error::unsupported_with(
                form,
                container,
                format!("level {}", level),
            ));
        }

        let format = match (self.format, self.image) {
            (FormatParameters::Pades { content_size, .. }, image) => {
                FormatParameters::Pades { content_size, image }
            }
            (format, None) => format,
            (_, Some(_)) => {
                return Err(Error::InvalidInput(format!(
                    "Visible signatures are only available for PAdES, not {}",
                    form
                )));
            }
        };

        Ok(SignatureParameters {
            format,
            level,
            packaging: self.packaging,
            digest_algorithm: self.digest_algorithm,
            encryption_algorithm: self.encryption_algorithm,
            b_level: self.b_level,
            signing_certificate: self.signing_certificate,
            certificate_chain: self.certificate_chain,
            sign_with_expired_certificate: self.sign_with_expired_certificate,
            content_timestamps: self.content_timestamps,
            timestamps: self.timestamps,
            detached_contents: self.detached_contents,
        })
    }
}

/// Format of a counter signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterSignatureFormat {
    Cades,
    Xades,
    Jades { serialization: JwsSerializationType },
}

impl CounterSignatureFormat {
    pub fn form(&self) -> SignatureForm {
        match self {
            CounterSignatureFormat::Cades => SignatureForm::CAdES,
            CounterSignatureFormat::Xades => SignatureForm::XAdES,
            CounterSignatureFormat::Jades { .. } => SignatureForm::JAdES,
        }
    }
}

/// Configuration of a counter signature over an existing signature
#[derive(Debug, Clone, PartialEq)]
pub struct CounterSignatureParameters {
    pub format: CounterSignatureFormat,
    /// Id of the signature being counter-signed
    pub signature_id: String,
    pub level: SignatureLevel,
    pub digest_algorithm: DigestAlgorithm,
    pub b_level: BLevelParameters,
    pub signing_certificate: CertificateToken,
    pub certificate_chain: Vec<CertificateToken>,
}
