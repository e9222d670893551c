//! Selector priority lists and their compiled form.
//!
//! Every field is located through an ordered list of CSS selectors, most
//! specific first. The lists live in [`SelectorProfile`] so a deployment can
//! tune them without touching the extraction logic.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::types::{CatalogError, CatalogResult};

/// Default title when no title selector matches.
pub const DEFAULT_TITLE: &str = "Product Title";

/// Default description when no description selector matches.
pub const DEFAULT_DESCRIPTION: &str = "Product description not available";

/// Maximum number of images kept from the winning image pattern.
pub const MAX_IMAGES: usize = 10;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Ranked selector lists and field defaults used by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectorProfile {
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub price: Vec<String>,
    pub images: Vec<String>,
    /// Elements holding tabular specifications.
    pub spec_containers: Vec<String>,
    /// Row-like children of a spec container.
    pub spec_rows: Vec<String>,
    /// Cell-like children of a spec row. The first two are (key, value).
    pub spec_cells: Vec<String>,
    /// Lists holding `key: value` items.
    pub spec_lists: Vec<String>,
    pub spec_list_items: Vec<String>,
    pub default_title: String,
    pub default_description: String,
    /// When the first matching image pattern filters down to nothing, try
    /// the next pattern instead of returning an empty gallery.
    pub images_fall_through_on_empty: bool,
}

impl Default for SelectorProfile {
    fn default() -> Self {
        Self {
            title: strings(&[
                r#"h1[data-testid="product-title"]"#,
                "h1.product-title",
                "h1#product-title",
                ".product-name h1",
                ".product-title",
                "h1",
                ".title h1",
                r#"[data-cy="product-title"]"#,
            ]),
            description: strings(&[
                ".product-description",
                ".product-details",
                r#"[data-testid="product-description"]"#,
                ".description",
                ".product-info",
                ".product-summary",
                "p",
            ]),
            price: strings(&[
                ".price",
                ".product-price",
                r#"[data-testid="price"]"#,
                ".current-price",
                ".sale-price",
                ".price-current",
            ]),
            images: strings(&[
                ".product-images img",
                ".product-gallery img",
                ".product-photos img",
                r#"[data-testid="product-image"]"#,
                ".main-image img",
                ".hero-image img",
            ]),
            spec_containers: strings(&["table", ".specifications", ".product-specs", ".spec-table"]),
            spec_rows: strings(&["tr", ".spec-row", ".specification-item"]),
            spec_cells: strings(&["td", "th", ".spec-name", ".spec-value", "dt", "dd"]),
            spec_lists: strings(&[".specs ul", ".specifications ul", ".product-details ul"]),
            spec_list_items: strings(&["li"]),
            default_title: DEFAULT_TITLE.to_string(),
            default_description: DEFAULT_DESCRIPTION.to_string(),
            images_fall_through_on_empty: false,
        }
    }
}

/// Parse a single selector string.
pub(crate) fn parse_selector(pattern: &str) -> CatalogResult<Selector> {
    Selector::parse(pattern).map_err(|e| CatalogError::Selector(format!("{pattern}: {e:?}")))
}

/// Parse a list of selectors as one selector group (`a, b, c`).
pub(crate) fn parse_group(patterns: &[String]) -> CatalogResult<Selector> {
    if patterns.is_empty() {
        return Err(CatalogError::Selector("empty selector group".to_string()));
    }
    parse_selector(&patterns.join(", "))
}

/// Compiled, ranked list of selectors for one field.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    patterns: Vec<(String, Selector)>,
}

impl SelectorChain {
    /// Compile patterns in priority order.
    pub fn compile(patterns: &[String]) -> CatalogResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Ok((p.clone(), parse_selector(p)?)))
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Number of patterns in the chain.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Trimmed text of the first element matched by the earliest pattern
    /// that matches at all.
    ///
    /// The search stops at that pattern even when its element is empty; an
    /// empty text yields `None` so the caller applies the field default.
    pub fn first_text(&self, doc: &Html) -> Option<String> {
        let (pattern, element) = self
            .patterns
            .iter()
            .find_map(|(pattern, selector)| Some((pattern, doc.select(selector).next()?)))?;
        let text = element_text(element);
        if text.is_empty() {
            tracing::trace!("selector {pattern} matched an empty element");
            return None;
        }
        Some(text)
    }

    /// All matches of each pattern, in priority order.
    ///
    /// The iterator yields one entry per pattern that matched at least one
    /// element; patterns with no match are skipped.
    pub fn matches<'a>(
        &'a self,
        doc: &'a Html,
    ) -> impl Iterator<Item = (&'a str, Vec<ElementRef<'a>>)> + 'a {
        self.patterns.iter().filter_map(move |(pattern, selector)| {
            let found: Vec<ElementRef<'a>> = doc.select(selector).collect();
            if found.is_empty() {
                None
            } else {
                Some((pattern.as_str(), found))
            }
        })
    }
}

/// Concatenated descendant text of an element, trimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
