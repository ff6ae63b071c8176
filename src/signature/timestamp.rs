//! Timestamp parameter builder
//!
//! Mirrors the signature resolution table but yields the timestamp
//! configuration variant matching a (standard, container) pair.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{ContainerType, DigestAlgorithm, SignatureForm};

/// Timestamp flavour, one per signature format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimestampKind {
    Cades,
    Pades,
    Xades,
    Jades,
    AsicWithCades(ContainerType),
}

/// Configuration of the timestamps requested from the TSA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimestampParameters {
    pub kind: TimestampKind,
    pub digest_algorithm: DigestAlgorithm,
}

impl TimestampParameters {
    /// Builds the variant for `(form, container)` carrying `digest_algorithm`
    pub fn build(
        form: SignatureForm,
        container: Option<ContainerType>,
        digest_algorithm: DigestAlgorithm,
    ) -> Result<Self> {
        let kind = match (container, form) {
            (None, SignatureForm::CAdES) => TimestampKind::Cades,
            (None, SignatureForm::PAdES) => TimestampKind::Pades,
            (None, SignatureForm::XAdES) => TimestampKind::Xades,
            (None, SignatureForm::JAdES) => TimestampKind::Jades,
            (Some(container), SignatureForm::CAdES) => TimestampKind::AsicWithCades(container),
            // XAdES timestamps live inside the signature even when zipped
            (Some(_), SignatureForm::XAdES) => TimestampKind::Xades,
            (Some(_), SignatureForm::PAdES) | (Some(_), SignatureForm::JAdES) => {
                return Err(Error::unsupported_with(form, container, "timestamp"));
            }
        };
        Ok(Self {
            kind,
            digest_algorithm,
        })
    }

    /// Document timestamp over a single PDF
    pub fn pades(digest_algorithm: DigestAlgorithm) -> Self {
        Self {
            kind: TimestampKind::Pades,
            digest_algorithm,
        }
    }

    /// Timestamp over the content of an ASiC container
    pub fn asic_with_cades(container: ContainerType, digest_algorithm: DigestAlgorithm) -> Self {
        Self {
            kind: TimestampKind::AsicWithCades(container),
            digest_algorithm,
        }
    }
}

/// The three timestamp roles of a signature.
///
/// All roles point at one shared configuration so a single digest
/// algorithm choice applies to every timestamp of the signature.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampRoles {
    pub content: Arc<TimestampParameters>,
    pub signature: Arc<TimestampParameters>,
    pub archive: Arc<TimestampParameters>,
}

impl TimestampRoles {
    pub fn shared(parameters: TimestampParameters) -> Self {
        let shared = Arc::new(parameters);
        Self {
            content: Arc::clone(&shared),
            signature: Arc::clone(&shared),
            archive: shared,
        }
    }

    pub fn is_shared(&self) -> bool {
        Arc::ptr_eq(&self.content, &self.signature) && Arc::ptr_eq(&self.signature, &self.archive)
    }
}
