//! Configuration types and validation for the signing service
//!
//! Loaded once at start-up and shared read-only across requests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{JwsSerializationType, SigDMechanism, SignerTextPosition};

/// Top-level service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub pades: PadesConfig,
    pub jades: JadesConfig,
    pub layout: LayoutConfig,
    pub overlay: OverlayConfig,
}

/// PAdES-specific defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadesConfig {
    /// Bytes reserved in the PDF for the CMS signature container
    pub content_size: usize,
}

/// JAdES-specific defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JadesConfig {
    /// Serialization for signatures; JSON allows T+ levels and parallel signing
    pub serialization: JwsSerializationType,
    pub sig_d_mechanism: SigDMechanism,
    pub counter_signature_serialization: JwsSerializationType,
}

/// Grid used to auto-place new signature fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub field_width: f64,
    pub field_height: f64,
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
    pub margin: f64,
    pub fields_per_row: u32,
    /// Size of pages appended to make room for signature fields
    pub new_page_width: f64,
    pub new_page_height: f64,
}

/// Text rendered inside a visible signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub font_family: String,
    pub font_size: f32,
    pub text_position: SignerTextPosition,
}

impl Default for PadesConfig {
    fn default() -> Self {
        Self {
            // double the library default so large chains and timestamps fit
            content_size: 9472 * 2,
        }
    }
}

impl Default for JadesConfig {
    fn default() -> Self {
        Self {
            serialization: JwsSerializationType::JsonSerialization,
            sig_d_mechanism: SigDMechanism::ObjectIdByUriHash,
            counter_signature_serialization: JwsSerializationType::FlattenedJsonSerialization,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            field_width: 170.0,
            field_height: 50.0,
            horizontal_spacing: 20.0,
            vertical_spacing: 20.0,
            margin: 20.0,
            fields_per_row: 3,
            // US Letter
            new_page_width: 612.0,
            new_page_height: 792.0,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_family: "Serif".to_string(),
            font_size: 7.0,
            text_position: SignerTextPosition::Left,
        }
    }
}

impl ServiceConfig {
    /// Reads a YAML or JSON configuration file and validates it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses JSON first, then YAML
    pub fn parse(content: &str) -> Result<Self> {
        let config: ServiceConfig = serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| Error::Config(format!("Config parsing error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pades.content_size < 1024 {
            return Err(Error::Config("PAdES content size too small".into()));
        }
        self.layout.validate()?;
        if !(self.overlay.font_size > 0.0) {
            return Err(Error::Config("Overlay font size must be positive".into()));
        }
        Ok(())
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.field_width > 0.0 && self.field_height > 0.0) {
            return Err(Error::Config("Signature field size must be positive".into()));
        }
        if self.horizontal_spacing < 0.0 || self.vertical_spacing < 0.0 || self.margin < 0.0 {
            return Err(Error::Config("Spacing and margin cannot be negative".into()));
        }
        if self.fields_per_row == 0 {
            return Err(Error::Config("At least one field per row is required".into()));
        }
        if self.margin + self.field_width > self.new_page_width
            || 2.0 * self.margin + self.field_height > self.new_page_height
        {
            return Err(Error::Config(
                "Appended pages are too small to hold a signature field".into(),
            ));
        }
        Ok(())
    }
}
