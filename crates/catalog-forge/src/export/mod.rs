//! Document export of a finished catalog.

pub mod docx;
pub mod pdf;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::types::{CatalogData, CatalogError, CatalogResult};

pub use docx::render_docx;
pub use pdf::render_pdf;
pub use text::{to_win_ansi, wrap_text};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => PDF_CONTENT_TYPE,
            ExportFormat::Docx => DOCX_CONTENT_TYPE,
        }
    }
}

/// Requested output quality. Accepted for compatibility; both renderers
/// produce vector output regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    Standard,
    #[default]
    High,
    Print,
}

/// Which catalog sections to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    pub include_images: bool,
    pub include_specs: bool,
    pub include_features: bool,
    pub include_benefits: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_images: true,
            include_specs: true,
            include_features: true,
            include_benefits: true,
        }
    }
}

/// Body of an export call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub catalog_data: CatalogData,
    pub format: ExportFormat,
    #[serde(default)]
    pub quality: ExportQuality,
    #[serde(default)]
    pub options: ExportOptions,
}

impl ExportRequest {
    /// Reject requests whose catalog cannot produce a meaningful document.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.catalog_data.generated_content.title.trim().is_empty() {
            return Err(CatalogError::InvalidInput(
                "generatedContent.title is required".into(),
            ));
        }
        Ok(())
    }
}

/// Download name for a catalog: every non-alphanumeric char becomes `-`.
pub fn export_filename(title: &str, extension: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("{stem}.{extension}")
}
