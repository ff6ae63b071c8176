//! Signature field layout
//!
//! New signature widgets are packed on a fixed grid anchored at the
//! top-left corner of the last page: three 170x50 cells per row, 20pt
//! apart, 20pt from the page edges. When the grid runs out of rows a new
//! page is started.
//!
//! Coordinates follow the signature field convention: origin at the
//! top-left corner of the page, y growing downwards.

pub mod allocator;

pub use allocator::{FieldAllocation, SignatureFieldAllocator};

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// Placement of a signature field on a 1-based page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPlacement {
    pub page: u32,
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Outcome of [`GridGeometry::place`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutDecision {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
    /// The cell does not fit the current page; it belongs on a fresh one
    pub page_added: bool,
}

impl LayoutDecision {
    /// Binds the decision to a document whose last page is `last_page`
    pub fn on_page(&self, last_page: u32) -> FieldPlacement {
        FieldPlacement {
            page: if self.page_added { last_page + 1 } else { last_page },
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Cell geometry of the placement grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub cell_width: f64,
    pub cell_height: f64,
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
    pub margin: f64,
    pub cells_per_row: u32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for GridGeometry {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            cell_width: config.field_width,
            cell_height: config.field_height,
            horizontal_spacing: config.horizontal_spacing,
            vertical_spacing: config.vertical_spacing,
            margin: config.margin,
            cells_per_row: config.fields_per_row,
        }
    }
}

impl GridGeometry {
    /// Position of the next field given how many widgets the page already holds.
    ///
    /// Pure: depends only on the geometry and the three arguments.
    pub fn place(&self, existing: usize, page_width: f64, page_height: f64) -> LayoutDecision {
        let per_row = self.cells_fitting(page_width);
        if per_row == 0 {
            return self.fresh_page();
        }

        let row = existing / per_row;
        let col = existing % per_row;
        let origin_x = self.margin + col as f64 * (self.cell_width + self.horizontal_spacing);
        let origin_y = self.margin + row as f64 * (self.cell_height + self.vertical_spacing);

        // the bottom margin is kept free like the top one
        if origin_y + self.cell_height + self.margin > page_height {
            return self.fresh_page();
        }

        LayoutDecision {
            origin_x,
            origin_y,
            width: self.cell_width,
            height: self.cell_height,
            page_added: false,
        }
    }

    /// Cells of one row that fit horizontally, capped at `cells_per_row`
    fn cells_fitting(&self, page_width: f64) -> usize {
        let available = page_width - self.margin + self.horizontal_spacing;
        let pitch = self.cell_width + self.horizontal_spacing;
        if available < pitch {
            return 0;
        }
        ((available / pitch).floor() as usize).min(self.cells_per_row as usize)
    }

    fn fresh_page(&self) -> LayoutDecision {
        LayoutDecision {
            origin_x: self.margin,
            origin_y: self.margin,
            width: self.cell_width,
            height: self.cell_height,
            page_added: true,
        }
    }
}

/// [`GridGeometry::place`] with the default grid
pub fn place(existing: usize, page_width: f64, page_height: f64) -> LayoutDecision {
    GridGeometry::default().place(existing, page_width, page_height)
}
