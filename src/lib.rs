//! Document signing and form filling core
//!
//! Resolves signature requests to a signing backend and an immutable
//! configuration, places visible signature fields on PDF pages without
//! overlap, and fills and locks PDF form fields.

pub mod backend;
pub mod certificate;
pub mod config;
pub mod error;
pub mod forms;
pub mod layout;
pub mod pdf_document;
pub mod requests;
pub mod service;
pub mod signature;
pub mod types;

// Shared Utilities
pub mod utils;

// Re-exports for crate consumers
pub use backend::{SignatureBackend, SignatureBackends, TspSource};
pub use certificate::{CertificateLoader, CertificateToken, X509CertificateLoader};
pub use config::ServiceConfig;
pub use error::{BackendError, Error, Result};
pub use forms::{fill_form, list_fields, FormFieldUpdater};
pub use layout::{FieldPlacement, SignatureFieldAllocator};
pub use pdf_document::PdfDocument;
pub use service::SigningService;
pub use signature::{ParameterResolver, SignatureParameters, TimestampParameters};
