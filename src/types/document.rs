use std::fmt;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DigestAlgorithm, SignatureAlgorithm};

/// In-memory document handed to or returned by a signing backend
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DssDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl DssDocument {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { name: None, bytes }
    }

    pub fn named(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: Some(name.into()),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Same name, new content
    pub fn with_bytes(&self, bytes: Vec<u8>) -> Self {
        Self {
            name: self.name.clone(),
            bytes,
        }
    }
}

impl fmt::Debug for DssDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DssDocument")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// RFC 3161 timestamp token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampToken {
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub generation_time: Option<DateTime<Utc>>,
}

/// Digest value computed over some bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub algorithm: DigestAlgorithm,
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

impl Digest {
    pub fn compute(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        let value = ring::digest::digest(algorithm.ring_algorithm(), data)
            .as_ref()
            .to_vec();
        Self { algorithm, value }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }
}

/// Bytes the signer's private key has to sign
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToBeSigned {
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl ToBeSigned {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Digest handed to external signers (smart cards, HSMs) that only
    /// sign pre-hashed data
    pub fn digest(&self, algorithm: DigestAlgorithm) -> Digest {
        Digest::compute(algorithm, &self.bytes)
    }
}

impl fmt::Debug for ToBeSigned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToBeSigned({} bytes)", self.bytes.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureValue {
    pub algorithm: SignatureAlgorithm,
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

/// Base64 (standard alphabet) serde adapter for byte buffers
pub mod base64_bytes {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&B64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        B64.decode(encoded.trim()).map_err(serde::de::Error::custom)
    }
}

/// Same as [`base64_bytes`] for a list of buffers
pub mod base64_bytes_vec {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<String> = items.iter().map(|b| B64.encode(b)).collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let encoded = Vec::<String>::deserialize(deserializer)?;
        encoded
            .iter()
            .map(|s| B64.decode(s.trim()).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Same as [`base64_bytes`] for an optional buffer
pub mod base64_bytes_opt {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&B64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        encoded
            .map(|s| B64.decode(s.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}
