//! Core data types for scraped products, generated copy, and catalogs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Specification map: attribute name to attribute value.
pub type Specifications = BTreeMap<String, String>;

/// Alt text used when a product image carries none.
pub const DEFAULT_IMAGE_ALT: &str = "Product image";

/// Structured product data extracted from a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedData {
    pub title: String,
    pub description: String,
    pub price: Option<String>,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub images: Vec<ImageCandidate>,
    #[serde(alias = "url")]
    pub source_url: String,
    #[serde(default = "Utc::now")]
    pub scraped_at: DateTime<Utc>,
}

/// A product image reference found on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    pub alt: String,
}

/// Product fields handed to the content generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(alias = "sourceUrl")]
    pub url: String,
}

impl From<&ScrapedData> for ProductInput {
    fn from(data: &ScrapedData) -> Self {
        Self {
            title: data.title.clone(),
            description: data.description.clone(),
            specifications: data.specifications.clone(),
            price: data.price.clone(),
            url: data.source_url.clone(),
        }
    }
}

/// Voice of the generated copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Technical,
}

/// Target length of the generated description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl ContentLength {
    /// Word range requested from the generator.
    pub fn word_range(self) -> &'static str {
        match self {
            ContentLength::Short => "100-200",
            ContentLength::Medium => "200-400",
            ContentLength::Long => "400-600",
        }
    }
}

fn default_true() -> bool {
    true
}

/// Knobs for content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub length: ContentLength,
    #[serde(default = "default_true")]
    pub include_features: bool,
    #[serde(default = "default_true")]
    pub include_benefits: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            tone: Tone::default(),
            length: ContentLength::default(),
            include_features: true,
            include_benefits: true,
        }
    }
}

/// Marketing copy produced for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

/// Improvement suggestions for existing catalog copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title_suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description_improvements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seo_recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layout_suggestions: Vec<String>,
}

/// Visual theme of the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Modern,
    Classic,
    Minimal,
}

/// Accent colour family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    Blue,
    Purple,
    Green,
    Red,
}

impl ColorScheme {
    /// Primary accent as RGB in `0.0..=1.0`.
    pub fn primary_rgb(self) -> [f32; 3] {
        match self {
            ColorScheme::Blue => [0.15, 0.39, 0.92],
            ColorScheme::Purple => [0.49, 0.23, 0.93],
            ColorScheme::Green => [0.02, 0.59, 0.41],
            ColorScheme::Red => [0.92, 0.26, 0.21],
        }
    }

    /// Primary accent as a hex string (no leading `#`).
    pub fn primary_hex(self) -> &'static str {
        match self {
            ColorScheme::Blue => "2563EB",
            ColorScheme::Purple => "7C3AED",
            ColorScheme::Green => "059669",
            ColorScheme::Red => "EB4236",
        }
    }
}

/// Font family for the catalog body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Typography {
    #[default]
    Sans,
    Serif,
    Mono,
}

/// Layout preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layout {
    pub theme: Theme,
    pub color_scheme: ColorScheme,
    pub typography: Typography,
}

/// An image placed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub id: String,
    pub url: String,
    pub alt: String,
    pub position: u32,
}

/// Kind of an editor content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Title,
    Description,
    ImageGallery,
    Features,
    Specifications,
    Benefits,
    Price,
    CustomSection,
}

/// Presentation settings of a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// A reorderable unit of catalog content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub content: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<BlockSettings>,
}

/// Editable catalog record destined for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
    pub product: ScrapedData,
    pub generated_content: GeneratedContent,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
    #[serde(default)]
    pub content_blocks: Vec<ContentBlock>,
}

/// Errors that can occur in the catalog library.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Export error: {0}")]
    Export(String),
}

/// Convenience result type.
pub type CatalogResult<T> = Result<T, CatalogError>;
