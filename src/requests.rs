//! Request models
//!
//! Transport-neutral payloads accepted by the signing service and the form
//! engine. Byte buffers travel as base64 strings when serialized.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::signature::{SignatureFieldParameters, SignaturePolicy, SignerLocation};
use crate::types::{
    base64_bytes_opt, base64_bytes_vec, ContainerType, DigestAlgorithm, DssDocument,
    EncryptionAlgorithm, SignatureForm, SignatureLevel, SignaturePackaging, TimestampToken,
};

/// Visible signature requested with a PAdES signature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSignatureRequest {
    pub image: Option<DssDocument>,
    /// Target field; a new field is placed automatically when absent
    pub field: Option<SignatureFieldParameters>,
    /// Caption; defaults to the signer name and signing date
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureDocumentRequest {
    pub document: DssDocument,
    pub signature_form: SignatureForm,
    #[serde(default)]
    pub container_type: Option<ContainerType>,
    pub signature_packaging: SignaturePackaging,
    pub signature_level: SignatureLevel,
    #[serde(default)]
    pub digest_algorithm: DigestAlgorithm,
    #[serde(default)]
    pub encryption_algorithm: Option<EncryptionAlgorithm>,
    #[serde(default, with = "base64_bytes_opt")]
    pub signing_certificate: Option<Vec<u8>>,
    #[serde(default, with = "base64_bytes_vec")]
    pub certificate_chain: Vec<Vec<u8>>,
    #[serde(default = "Utc::now")]
    pub signing_date: DateTime<Utc>,
    #[serde(default)]
    pub sign_with_expired_certificate: bool,
    #[serde(default)]
    pub content_timestamp: Option<TimestampToken>,
    #[serde(default)]
    pub claimed_signer_roles: Vec<String>,
    #[serde(default)]
    pub signer_location: Option<SignerLocation>,
    #[serde(default)]
    pub signature_policy: Option<SignaturePolicy>,
    #[serde(default)]
    pub visual_signature: Option<VisualSignatureRequest>,
    /// Signature value produced by the signer, required by the sign step
    #[serde(default, with = "base64_bytes_opt")]
    pub signature_value: Option<Vec<u8>>,
}

impl SignatureDocumentRequest {
    /// Minimal request, everything optional left empty
    pub fn new(
        document: DssDocument,
        signature_form: SignatureForm,
        signature_packaging: SignaturePackaging,
        signature_level: SignatureLevel,
    ) -> Self {
        Self {
            document,
            signature_form,
            container_type: None,
            signature_packaging,
            signature_level,
            digest_algorithm: DigestAlgorithm::default(),
            encryption_algorithm: None,
            signing_certificate: None,
            certificate_chain: Vec::new(),
            signing_date: Utc::now(),
            sign_with_expired_certificate: false,
            content_timestamp: None,
            claimed_signer_roles: Vec::new(),
            signer_location: None,
            signature_policy: None,
            visual_signature: None,
            signature_value: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.document.is_empty() {
            return Err(Error::InvalidInput("Document to sign is empty".into()));
        }
        match &self.signing_certificate {
            Some(certificate) if !certificate.is_empty() => Ok(()),
            _ => Err(Error::InvalidInput("Signing certificate is mandatory".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionRequest {
    pub signed_document: DssDocument,
    pub signature_form: SignatureForm,
    #[serde(default)]
    pub container_type: Option<ContainerType>,
    pub signature_level: SignatureLevel,
    /// Documents covered by a detached signature
    #[serde(default)]
    pub original_documents: Vec<DssDocument>,
}

impl ExtensionRequest {
    pub fn validate(&self) -> Result<()> {
        if self.signed_document.is_empty() {
            return Err(Error::InvalidInput("Signed document is empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampRequest {
    pub documents: Vec<DssDocument>,
    #[serde(default)]
    pub container_type: Option<ContainerType>,
    #[serde(default)]
    pub digest_algorithm: DigestAlgorithm,
}

impl TimestampRequest {
    pub fn validate(&self) -> Result<()> {
        if self.documents.is_empty() {
            return Err(Error::InvalidInput("No document to timestamp".into()));
        }
        if self.documents.iter().any(DssDocument::is_empty) {
            return Err(Error::InvalidInput("Document to timestamp is empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSignatureRequest {
    pub signed_document: DssDocument,
    pub signature_form: SignatureForm,
    /// Set when the signature lives inside an ASiC container
    #[serde(default)]
    pub container_type: Option<ContainerType>,
    pub signature_id_to_counter_sign: String,
    pub signature_level: SignatureLevel,
    #[serde(default)]
    pub digest_algorithm: DigestAlgorithm,
    #[serde(default)]
    pub encryption_algorithm: Option<EncryptionAlgorithm>,
    #[serde(default, with = "base64_bytes_opt")]
    pub signing_certificate: Option<Vec<u8>>,
    #[serde(default, with = "base64_bytes_vec")]
    pub certificate_chain: Vec<Vec<u8>>,
    #[serde(default = "Utc::now")]
    pub signing_date: DateTime<Utc>,
    #[serde(default)]
    pub claimed_signer_roles: Vec<String>,
    #[serde(default, with = "base64_bytes_opt")]
    pub signature_value: Option<Vec<u8>>,
}

impl CounterSignatureRequest {
    pub fn validate(&self) -> Result<()> {
        if self.signed_document.is_empty() {
            return Err(Error::InvalidInput("Signed document is empty".into()));
        }
        if self.signature_id_to_counter_sign.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Id of the signature to counter-sign is mandatory".into(),
            ));
        }
        match &self.signing_certificate {
            Some(certificate) if !certificate.is_empty() => Ok(()),
            _ => Err(Error::InvalidInput("Signing certificate is mandatory".into())),
        }
    }
}

/// Values to write into the form fields of a PDF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormUpdateRequest {
    pub document: DssDocument,
    pub fields: BTreeMap<String, String>,
}

impl FormUpdateRequest {
    /// Builds a request from a JSON object of field values.
    ///
    /// Strings are taken as-is, numbers and booleans are rendered to text,
    /// null clears a field. Nested arrays or objects are rejected.
    pub fn from_json_values(document: DssDocument, json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("Malformed field values: {}", e)))?;
        let object = match value {
            Value::Object(object) => object,
            _ => {
                return Err(Error::InvalidInput(
                    "Field values must be a JSON object".into(),
                ))
            }
        };

        let mut fields = BTreeMap::new();
        for (name, value) in object {
            let text = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(Error::InvalidInput(format!(
                        "Value of field '{}' must be a scalar",
                        name
                    )))
                }
            };
            fields.insert(name, text);
        }

        Ok(Self { document, fields })
    }

    pub fn validate(&self) -> Result<()> {
        if self.document.is_empty() {
            return Err(Error::InvalidInput("Document is empty".into()));
        }
        if self.fields.is_empty() {
            return Err(Error::InvalidInput("No field values given".into()));
        }
        Ok(())
    }
}
