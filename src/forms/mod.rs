//! Interactive form filling
//!
//! Reads the AcroForm field tree of a PDF, writes values into the named
//! fields and flattens them to non-editable. Signature fields are left to
//! the signing side.

pub mod appearance;
pub mod fields;
pub mod flags;
pub mod updater;

#[cfg(test)]
pub(crate) mod sample;

use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::pdf_document::PdfDocument;
use crate::requests::FormUpdateRequest;
use crate::types::DssDocument;

pub use fields::{collect_fields, FieldKind, FormField};
pub use flags::{AnnotationFlags, FieldFlags};
pub use updater::{FormFieldUpdater, FormUpdateOutcome, FormUpdateReport};

/// Public view of a form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    pub kind: FieldKind,
    pub value: Option<String>,
    pub read_only: bool,
    pub required: bool,
    pub widgets: usize,
}

impl From<&FormField> for FieldSummary {
    fn from(field: &FormField) -> Self {
        Self {
            name: field.name.clone(),
            kind: field.kind,
            value: field.value.clone(),
            read_only: field.is_read_only(),
            required: field.flags.contains(FieldFlags::REQUIRED),
            widgets: field.widgets.len(),
        }
    }
}

/// Lists the fields a caller can fill
pub fn list_fields(bytes: &[u8]) -> Result<Vec<FieldSummary>> {
    let document = PdfDocument::load(bytes)?;
    Ok(collect_fields(&document)?
        .iter()
        .map(FieldSummary::from)
        .collect())
}

/// Validates a form update request and applies it
#[instrument(skip(request), fields(document = ?request.document.name))]
pub fn fill_form(request: &FormUpdateRequest) -> Result<(DssDocument, FormUpdateReport)> {
    request.validate()?;
    let outcome = FormFieldUpdater::new().update(&request.document.bytes, &request.fields)?;
    Ok((request.document.with_bytes(outcome.bytes), outcome.report))
}
