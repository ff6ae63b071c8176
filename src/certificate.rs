//! Certificate loading
//!
//! Turns the raw certificate bytes carried by a request into a
//! [`CertificateToken`]. A certificate that cannot be parsed rejects the
//! request; there is no fallback.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::parse_x509_certificate;
use x509_parser::pem::parse_x509_pem;

use crate::error::{Error, Result};

/// Parsed X.509 certificate, keeping the original DER encoding
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateToken {
    pub der: Vec<u8>,
    pub subject: String,
    pub issuer: String,
    pub common_name: Option<String>,
    pub serial_hex: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateToken {
    /// Name shown in visible signatures: the subject CN, or the whole subject
    pub fn signer_name(&self) -> &str {
        self.common_name.as_deref().unwrap_or(&self.subject)
    }

    pub fn is_valid_at(&self, instant: DateTime<Utc>) -> bool {
        self.not_before <= instant && instant <= self.not_after
    }

    pub fn is_self_signed(&self) -> bool {
        self.subject == self.issuer
    }
}

impl fmt::Debug for CertificateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateToken")
            .field("subject", &self.subject)
            .field("serial", &self.serial_hex)
            .field("not_after", &self.not_after)
            .finish()
    }
}

/// Source of certificate tokens
pub trait CertificateLoader: Send + Sync {
    fn load(&self, bytes: &[u8]) -> Result<CertificateToken>;
}

/// Loads DER or PEM encoded X.509 certificates
#[derive(Debug, Clone, Default)]
pub struct X509CertificateLoader;

impl X509CertificateLoader {
    pub fn new() -> Self {
        Self
    }
}

impl CertificateLoader for X509CertificateLoader {
    fn load(&self, bytes: &[u8]) -> Result<CertificateToken> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput("Certificate is empty".into()));
        }

        let der = if bytes.starts_with(b"-----BEGIN") {
            let (_, pem) = parse_x509_pem(bytes)
                .map_err(|e| Error::InvalidInput(format!("Malformed PEM certificate: {}", e)))?;
            pem.contents
        } else {
            bytes.to_vec()
        };

        let (_, certificate) = parse_x509_certificate(&der)
            .map_err(|e| Error::InvalidInput(format!("Malformed certificate: {}", e)))?;

        let token = token_from(&certificate, der.clone())?;
        debug!("Loaded certificate {:?}", token);
        Ok(token)
    }
}

fn token_from(certificate: &X509Certificate<'_>, der: Vec<u8>) -> Result<CertificateToken> {
    let common_name = certificate
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);

    let validity = certificate.validity();
    let not_before = timestamp(validity.not_before.timestamp())?;
    let not_after = timestamp(validity.not_after.timestamp())?;

    Ok(CertificateToken {
        der,
        subject: certificate.subject().to_string(),
        issuer: certificate.issuer().to_string(),
        common_name,
        serial_hex: hex::encode(certificate.raw_serial()),
        not_before,
        not_after,
    })
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| Error::InvalidInput("Certificate validity out of range".into()))
}
