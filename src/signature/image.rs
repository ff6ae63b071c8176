//! Visible signature appearance parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::OverlayConfig;
use crate::layout::FieldPlacement;
use crate::types::{DssDocument, SignerTextPosition};

/// Target signature field: an existing field id and/or a rectangle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureFieldParameters {
    #[serde(default)]
    pub field_id: Option<String>,
    pub page: u32,
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<FieldPlacement> for SignatureFieldParameters {
    fn from(placement: FieldPlacement) -> Self {
        Self {
            field_id: None,
            page: placement.page,
            origin_x: placement.origin_x,
            origin_y: placement.origin_y,
            width: placement.width,
            height: placement.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureImageTextParameters {
    pub text: String,
    pub font: FontSpec,
    pub position: SignerTextPosition,
}

impl SignatureImageTextParameters {
    /// Standard caption: who signed and when
    pub fn signer_caption(
        signer: &str,
        signing_date: DateTime<Utc>,
        overlay: &OverlayConfig,
    ) -> Self {
        Self::with_text(
            format!(
                "Signed by: {}\nDate: {}",
                signer,
                signing_date.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            overlay,
        )
    }

    pub fn with_text(text: String, overlay: &OverlayConfig) -> Self {
        Self {
            text,
            font: FontSpec {
                family: overlay.font_family.clone(),
                size: overlay.font_size,
            },
            position: overlay.text_position,
        }
    }
}

/// Visual overlay of a PAdES signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureImageParameters {
    pub field: SignatureFieldParameters,
    #[serde(default)]
    pub image: Option<DssDocument>,
    #[serde(default)]
    pub text: Option<SignatureImageTextParameters>,
}
