//! Error types and handling for the signing and form-filling core
//!
//! Every failure is fatal to the operation that raised it. Nothing here is
//! retried internally; the boundary layer decides how to present it.

use std::{io, result::Result as StdResult};

use thiserror::Error;

use crate::types::{ContainerType, SignatureForm};

/// Custom result type for docsign operations
pub type Result<T> = StdResult<T, Error>;

/// Core error type for docsign operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported combination: {form} with container {container}{detail}")]
    UnsupportedCombination {
        form: SignatureForm,
        container: ContainerLabel,
        detail: String,
    },

    #[error("Only one document is allowed without a container, got {0}")]
    TooManyDocuments(usize),

    #[error("Document analysis error: {0}")]
    DocumentAnalysis(String),

    #[error("Form update failed on field '{field}': {reason}")]
    FormUpdate { field: String, reason: String },

    #[error("Signing backend error during {operation}")]
    SigningBackend {
        operation: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Helper for a rejected (form, container) pair
    pub fn unsupported(form: SignatureForm, container: Option<ContainerType>) -> Self {
        Error::UnsupportedCombination {
            form,
            container: ContainerLabel(container),
            detail: String::new(),
        }
    }

    /// Same as [`Error::unsupported`] with extra context appended to the message
    pub fn unsupported_with(
        form: SignatureForm,
        container: Option<ContainerType>,
        detail: impl Into<String>,
    ) -> Self {
        Error::UnsupportedCombination {
            form,
            container: ContainerLabel(container),
            detail: format!(" ({})", detail.into()),
        }
    }

    pub fn form_update(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::FormUpdate {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn analysis(reason: impl std::fmt::Display) -> Self {
        Error::DocumentAnalysis(reason.to_string())
    }

    pub fn backend(operation: &'static str, source: BackendError) -> Self {
        Error::SigningBackend { operation, source }
    }
}

/// Display wrapper for an optional container kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerLabel(pub Option<ContainerType>);

impl std::fmt::Display for ContainerLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(container) => write!(f, "{}", container),
            None => write!(f, "none"),
        }
    }
}

// -------------------- Backend Errors --------------------

/// Failure surfaced by an external signing backend or timestamp source.
///
/// The message is kept for logs only; [`Error::SigningBackend`] never
/// repeats it in its own `Display`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BackendError {
    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    #[error("Timestamp source failure: {0}")]
    Timestamp(String),

    #[error("Backend operation not supported: {0}")]
    NotSupported(String),

    #[error("Backend internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BackendError {
    /// Helper for creating an `Internal` error with a boxed source
    pub fn internal<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        BackendError::Internal(Box::new(e))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::DocumentAnalysis(err.to_string())
    }
}
