//! Heuristic product extraction from an already-loaded page.
//!
//! Extraction never fails for a missing field: title and description fall
//! back to the profile defaults, price becomes `None`, and images and
//! specifications come back empty. The only fallible step is compiling the
//! selector profile, which happens once in [`ProductExtractor::new`].

pub mod gallery;
pub mod selectors;
pub mod specs;

use chrono::{DateTime, Utc};
use scraper::Html;
use url::Url;

pub use gallery::extract_images;
pub use selectors::{SelectorChain, SelectorProfile, DEFAULT_DESCRIPTION, DEFAULT_TITLE, MAX_IMAGES};
pub use specs::{delimited_specs, merge_specs, tabular_specs, SpecSelectors};

use crate::types::{CatalogResult, ScrapedData};

/// Compiled extractor for one selector profile.
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    title: SelectorChain,
    description: SelectorChain,
    price: SelectorChain,
    images: SelectorChain,
    specs: SpecSelectors,
    default_title: String,
    default_description: String,
    images_fall_through_on_empty: bool,
}

impl ProductExtractor {
    /// Compile every selector in the profile.
    pub fn new(profile: &SelectorProfile) -> CatalogResult<Self> {
        Ok(Self {
            title: SelectorChain::compile(&profile.title)?,
            description: SelectorChain::compile(&profile.description)?,
            price: SelectorChain::compile(&profile.price)?,
            images: SelectorChain::compile(&profile.images)?,
            specs: SpecSelectors::compile(profile)?,
            default_title: profile.default_title.clone(),
            default_description: profile.default_description.clone(),
            images_fall_through_on_empty: profile.images_fall_through_on_empty,
        })
    }

    /// Extractor over [`SelectorProfile::default`].
    pub fn with_defaults() -> CatalogResult<Self> {
        Self::new(&SelectorProfile::default())
    }

    /// Extract product data, stamping it with the current time.
    pub fn extract(&self, doc: &Html, source_url: &str) -> ScrapedData {
        self.extract_at(doc, source_url, Utc::now())
    }

    /// Extract product data with an explicit timestamp.
    ///
    /// Pure: the same document, URL and timestamp always yield the same
    /// record.
    pub fn extract_at(
        &self,
        doc: &Html,
        source_url: &str,
        scraped_at: DateTime<Utc>,
    ) -> ScrapedData {
        let base = Url::parse(source_url).ok();

        let title = self
            .title
            .first_text(doc)
            .unwrap_or_else(|| self.default_title.clone());
        let description = self
            .description
            .first_text(doc)
            .unwrap_or_else(|| self.default_description.clone());
        let price = self.price.first_text(doc);

        let specifications = merge_specs(
            tabular_specs(doc, &self.specs),
            delimited_specs(doc, &self.specs),
        );
        let images = extract_images(
            doc,
            &self.images,
            base.as_ref(),
            self.images_fall_through_on_empty,
        );

        tracing::debug!(
            title = %title,
            has_price = price.is_some(),
            specs = specifications.len(),
            images = images.len(),
            "extracted product fields"
        );

        ScrapedData {
            title,
            description,
            price,
            specifications,
            images,
            source_url: source_url.to_string(),
            scraped_at,
        }
    }

    /// Parse raw HTML and extract from it.
    pub fn extract_html(&self, html: &str, source_url: &str) -> ScrapedData {
        let doc = Html::parse_document(html);
        self.extract(&doc, source_url)
    }
}

/// Extract product data from raw HTML with the default profile.
pub fn extract_product_html(html: &str, source_url: &str) -> CatalogResult<ScrapedData> {
    Ok(ProductExtractor::with_defaults()?.extract_html(html, source_url))
}
