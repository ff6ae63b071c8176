//! Shared enumerations for signature requests and parameters

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Signature packaging convention (the "signature standard")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureForm {
    CAdES,
    PAdES,
    XAdES,
    JAdES,
}

impl SignatureForm {
    pub const ALL: [SignatureForm; 4] = [
        SignatureForm::CAdES,
        SignatureForm::PAdES,
        SignatureForm::XAdES,
        SignatureForm::JAdES,
    ];
}

impl fmt::Display for SignatureForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignatureForm::CAdES => "CAdES",
            SignatureForm::PAdES => "PAdES",
            SignatureForm::XAdES => "XAdES",
            SignatureForm::JAdES => "JAdES",
        };
        write!(f, "{}", name)
    }
}

/// ASiC container flavour wrapping signed documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerType {
    /// Simple container: one signed document
    #[serde(rename = "ASiC-S")]
    AsicS,
    /// Extended container: one or more signed documents
    #[serde(rename = "ASiC-E")]
    AsicE,
}

impl ContainerType {
    pub const ALL: [ContainerType; 2] = [ContainerType::AsicS, ContainerType::AsicE];
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerType::AsicS => write!(f, "ASiC-S"),
            ContainerType::AsicE => write!(f, "ASiC-E"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignaturePackaging {
    Enveloped,
    Enveloping,
    Detached,
    InternallyDetached,
}

/// Baseline profile within a standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BaselineProfile {
    /// Basic signature
    B,
    /// With signature timestamp
    T,
    /// With validation data (long term)
    LT,
    /// With archive timestamp
    LTA,
}

/// Signature level: a baseline profile bound to one standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum SignatureLevel {
    CAdES_BASELINE_B,
    CAdES_BASELINE_T,
    CAdES_BASELINE_LT,
    CAdES_BASELINE_LTA,
    PAdES_BASELINE_B,
    PAdES_BASELINE_T,
    PAdES_BASELINE_LT,
    PAdES_BASELINE_LTA,
    XAdES_BASELINE_B,
    XAdES_BASELINE_T,
    XAdES_BASELINE_LT,
    XAdES_BASELINE_LTA,
    JAdES_BASELINE_B,
    JAdES_BASELINE_T,
    JAdES_BASELINE_LT,
    JAdES_BASELINE_LTA,
}

impl SignatureLevel {
    /// Standard this level belongs to
    pub fn form(&self) -> SignatureForm {
        use SignatureLevel::*;
        match self {
            CAdES_BASELINE_B | CAdES_BASELINE_T | CAdES_BASELINE_LT | CAdES_BASELINE_LTA => {
                SignatureForm::CAdES
            }
            PAdES_BASELINE_B | PAdES_BASELINE_T | PAdES_BASELINE_LT | PAdES_BASELINE_LTA => {
                SignatureForm::PAdES
            }
            XAdES_BASELINE_B | XAdES_BASELINE_T | XAdES_BASELINE_LT | XAdES_BASELINE_LTA => {
                SignatureForm::XAdES
            }
            JAdES_BASELINE_B | JAdES_BASELINE_T | JAdES_BASELINE_LT | JAdES_BASELINE_LTA => {
                SignatureForm::JAdES
            }
        }
    }

    pub fn profile(&self) -> BaselineProfile {
        use SignatureLevel::*;
        match self {
            CAdES_BASELINE_B | PAdES_BASELINE_B | XAdES_BASELINE_B | JAdES_BASELINE_B => {
                BaselineProfile::B
            }
            CAdES_BASELINE_T | PAdES_BASELINE_T | XAdES_BASELINE_T | JAdES_BASELINE_T => {
                BaselineProfile::T
            }
            CAdES_BASELINE_LT | PAdES_BASELINE_LT | XAdES_BASELINE_LT | JAdES_BASELINE_LT => {
                BaselineProfile::LT
            }
            CAdES_BASELINE_LTA | PAdES_BASELINE_LTA | XAdES_BASELINE_LTA | JAdES_BASELINE_LTA => {
                BaselineProfile::LTA
            }
        }
    }

    /// True when producing this level requires a timestamp authority
    pub fn requires_timestamp(&self) -> bool {
        self.profile() >= BaselineProfile::T
    }
}

impl fmt::Display for SignatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = match self.profile() {
            BaselineProfile::B => "B",
            BaselineProfile::T => "T",
            BaselineProfile::LT => "LT",
            BaselineProfile::LTA => "LTA",
        };
        write!(f, "{}-BASELINE-{}", self.form(), profile)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    SHA1,
    #[default]
    SHA256,
    SHA384,
    SHA512,
}

impl DigestAlgorithm {
    pub(crate) fn ring_algorithm(&self) -> &'static ring::digest::Algorithm {
        match self {
            DigestAlgorithm::SHA1 => &ring::digest::SHA1_FOR_LEGACY_USE_ONLY,
            DigestAlgorithm::SHA256 => &ring::digest::SHA256,
            DigestAlgorithm::SHA384 => &ring::digest::SHA384,
            DigestAlgorithm::SHA512 => &ring::digest::SHA512,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DigestAlgorithm::SHA1 => "SHA1",
            DigestAlgorithm::SHA256 => "SHA256",
            DigestAlgorithm::SHA384 => "SHA384",
            DigestAlgorithm::SHA512 => "SHA512",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    #[default]
    RSA,
    ECDSA,
    EdDSA,
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncryptionAlgorithm::RSA => "RSA",
            EncryptionAlgorithm::ECDSA => "ECDSA",
            EncryptionAlgorithm::EdDSA => "EdDSA",
        };
        write!(f, "{}", name)
    }
}

/// Combined encryption + digest algorithm of a signature value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureAlgorithm {
    pub encryption: EncryptionAlgorithm,
    pub digest: DigestAlgorithm,
}

impl SignatureAlgorithm {
    pub fn from_parts(encryption: EncryptionAlgorithm, digest: DigestAlgorithm) -> Result<Self> {
        // Ed25519 hashes internally with SHA-512
        if encryption == EncryptionAlgorithm::EdDSA && digest != DigestAlgorithm::SHA512 {
            return Err(Error::InvalidInput(format!(
                "EdDSA signatures cannot be combined with {}",
                digest
            )));
        }
        Ok(Self { encryption, digest })
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encryption {
            EncryptionAlgorithm::EdDSA => write!(f, "ED25519"),
            _ => write!(f, "{}_{}", self.encryption, self.digest),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JwsSerializationType {
    CompactSerialization,
    JsonSerialization,
    FlattenedJsonSerialization,
}

/// How a detached JAdES signature references its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SigDMechanism {
    HttpHeaders,
    ObjectIdByUri,
    ObjectIdByUriHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignerTextPosition {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
}
