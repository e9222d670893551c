//! Specification extraction from tables and `key: value` lists.
//!
//! Two independent passes each produce a partial map. [`merge_specs`] folds
//! them together with list entries overriding table entries of the same key.

use scraper::{Html, Selector};

use super::selectors::{element_text, parse_group, SelectorProfile};
use crate::types::{CatalogResult, Specifications};

/// Keys must be strictly shorter than this many characters.
pub const MAX_KEY_CHARS: usize = 50;

/// Values must be strictly shorter than this many characters.
pub const MAX_VALUE_CHARS: usize = 200;

/// Separator between key and value in list items.
pub const LIST_SEPARATOR: char = ':';

/// Compiled selector groups for both specification passes.
#[derive(Debug, Clone)]
pub struct SpecSelectors {
    containers: Selector,
    rows: Selector,
    cells: Selector,
    lists: Selector,
    items: Selector,
}

impl SpecSelectors {
    pub fn compile(profile: &SelectorProfile) -> CatalogResult<Self> {
        Ok(Self {
            containers: parse_group(&profile.spec_containers)?,
            rows: parse_group(&profile.spec_rows)?,
            cells: parse_group(&profile.spec_cells)?,
            lists: parse_group(&profile.spec_lists)?,
            items: parse_group(&profile.spec_list_items)?,
        })
    }
}

/// Whether a key/value pair is short enough to be a real specification.
///
/// Anything longer is almost always a paragraph that happens to sit in a
/// table cell. Pairs outside the bounds are dropped, never truncated.
pub fn accept_pair(key: &str, value: &str) -> bool {
    !key.is_empty()
        && !value.is_empty()
        && key.chars().count() < MAX_KEY_CHARS
        && value.chars().count() < MAX_VALUE_CHARS
}

/// Tabular pass: first two cells of every row inside every container.
pub fn tabular_specs(doc: &Html, selectors: &SpecSelectors) -> Specifications {
    let mut specs = Specifications::new();
    for container in doc.select(&selectors.containers) {
        for row in container.select(&selectors.rows) {
            let mut cells = row.select(&selectors.cells);
            let (Some(key_cell), Some(value_cell)) = (cells.next(), cells.next()) else {
                continue;
            };
            let key = element_text(key_cell);
            let value = element_text(value_cell);
            if accept_pair(&key, &value) {
                specs.insert(key, value);
            }
        }
    }
    specs
}

/// Split a list item on the first separator.
///
/// `"Ratio: 4:3"` becomes `("Ratio", "4:3")`. Returns `None` when the text
/// has no separator.
pub fn split_item(text: &str) -> Option<(String, String)> {
    let (key, value) = text.split_once(LIST_SEPARATOR)?;
    Some((key.trim().to_string(), value.trim().to_string()))
}

/// Delimited-list pass: `key: value` items inside specification lists.
pub fn delimited_specs(doc: &Html, selectors: &SpecSelectors) -> Specifications {
    let mut specs = Specifications::new();
    for list in doc.select(&selectors.lists) {
        for item in list.select(&selectors.items) {
            let text = element_text(item);
            let Some((key, value)) = split_item(&text) else {
                continue;
            };
            if accept_pair(&key, &value) {
                specs.insert(key, value);
            }
        }
    }
    specs
}

/// Merge the two passes; list entries win over table entries.
pub fn merge_specs(tabular: Specifications, delimited: Specifications) -> Specifications {
    let mut merged = tabular;
    merged.extend(delimited);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> SpecSelectors {
        SpecSelectors::compile(&SelectorProfile::default()).unwrap()
    }

    #[test]
    fn test_table_row_becomes_pair() {
        let doc = Html::parse_document(
            "<table><tr><td>Battery Life</td><td>30 hours</td></tr></table>",
        );
        let specs = tabular_specs(&doc, &selectors());
        assert_eq!(specs.get("Battery Life").map(String::as_str), Some("30 hours"));
    }

    #[test]
    fn test_definition_rows_and_header_cells() {
        let doc = Html::parse_document(
            r#"<div class="product-specs">
                 <div class="spec-row"><dt>Weight</dt><dd>250g</dd></div>
               </div>
               <table><tr><th>Bluetooth</th><td>5.2</td></tr></table>"#,
        );
        let specs = tabular_specs(&doc, &selectors());
        assert_eq!(specs.get("Weight").map(String::as_str), Some("250g"));
        assert_eq!(specs.get("Bluetooth").map(String::as_str), Some("5.2"));
    }

    #[test]
    fn test_single_cell_rows_ignored() {
        let doc = Html::parse_document("<table><tr><td>Only one</td></tr></table>");
        assert!(tabular_specs(&doc, &selectors()).is_empty());
    }

    #[test]
    fn test_length_bounds_are_exclusive() {
        let key49 = "k".repeat(49);
        let key50 = "k".repeat(50);
        let value199 = "v".repeat(199);
        let value200 = "v".repeat(200);
        assert!(accept_pair(&key49, &value199));
        assert!(!accept_pair(&key50, "x"));
        assert!(!accept_pair("x", &value200));
        assert!(!accept_pair("", "x"));
        assert!(!accept_pair("x", ""));
    }

    #[test]
    fn test_oversized_cells_dropped_not_truncated() {
        let long = "word ".repeat(60);
        let html = format!(
            "<table><tr><td>Notes</td><td>{long}</td></tr><tr><td>Color</td><td>Red</td></tr></table>"
        );
        let doc = Html::parse_document(&html);
        let specs = tabular_specs(&doc, &selectors());
        assert!(!specs.contains_key("Notes"));
        assert_eq!(specs.len(), 1);
    }

    #[test]
    fn test_split_item_on_first_separator() {
        assert_eq!(
            split_item("Color: Black"),
            Some(("Color".to_string(), "Black".to_string()))
        );
        assert_eq!(
            split_item("Ratio: 4:3"),
            Some(("Ratio".to_string(), "4:3".to_string()))
        );
        assert_eq!(split_item("No separator here"), None);
    }

    #[test]
    fn test_list_items_outside_spec_lists_ignored() {
        let doc = Html::parse_document(
            r#"<ul><li>Shipping: free</li></ul>
               <div class="specs"><ul><li>Color: Black</li><li>Plain bullet</li></ul></div>"#,
        );
        let specs = delimited_specs(&doc, &selectors());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs.get("Color").map(String::as_str), Some("Black"));
    }

    #[test]
    fn test_list_pass_overrides_table_pass() {
        let doc = Html::parse_document(
            r#"<table><tr><td>Color</td><td>Blue</td></tr><tr><td>Size</td><td>M</td></tr></table>
               <div class="specifications"><ul><li>Color: Black</li></ul></div>"#,
        );
        let sel = selectors();
        let merged = merge_specs(tabular_specs(&doc, &sel), delimited_specs(&doc, &sel));
        assert_eq!(merged.get("Color").map(String::as_str), Some("Black"));
        assert_eq!(merged.get("Size").map(String::as_str), Some("M"));
    }
}
