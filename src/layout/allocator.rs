//! Applies the placement grid to a real document

use tracing::{debug, info};

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::layout::{FieldPlacement, GridGeometry};
use crate::pdf_document::{PageSize, PdfDocument};

/// Result of allocating room for a new signature field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldAllocation {
    pub placement: FieldPlacement,
    /// A page was appended; the caller must persist the document before
    /// handing it to the signer
    pub document_modified: bool,
}

/// Finds room for the next signature widget, appending a page when needed
#[derive(Debug, Clone)]
pub struct SignatureFieldAllocator {
    geometry: GridGeometry,
    new_page: PageSize,
}

impl Default for SignatureFieldAllocator {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl SignatureFieldAllocator {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            geometry: GridGeometry::from(config),
            new_page: PageSize {
                width: config.new_page_width,
                height: config.new_page_height,
            },
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Places the next field on the last page of `document`.
    ///
    /// Signature fields never share a page with unrelated content: when the
    /// last page holds no widget yet, a blank page is appended first. At most
    /// one page is appended per call.
    pub fn allocate(&self, document: &mut PdfDocument) -> Result<FieldAllocation> {
        let mut last_page = document.page_count();
        let mut modified = false;

        let existing = if last_page == 0 {
            0
        } else {
            document.widget_count(last_page)?
        };

        if existing == 0 {
            last_page = document.append_page(self.new_page)?;
            modified = true;
            debug!("Started signature page {}", last_page);
        }

        let size = document.page_size(last_page)?;
        let decision = self.geometry.place(existing, size.width, size.height);
        let placement = decision.on_page(last_page);

        if decision.page_added {
            let appended = document.append_page(self.new_page)?;
            debug_assert_eq!(appended, placement.page);
            modified = true;
        }

        info!(
            "Signature field placed on page {} at ({}, {})",
            placement.page, placement.origin_x, placement.origin_y
        );

        Ok(FieldAllocation {
            placement,
            document_modified: modified,
        })
    }
}
