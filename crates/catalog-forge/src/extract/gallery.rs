//! Product gallery extraction.

use scraper::{ElementRef, Html};
use url::Url;

use super::selectors::{SelectorChain, MAX_IMAGES};
use crate::types::{ImageCandidate, DEFAULT_IMAGE_ALT};

/// Whether an image address is an inline `data:` payload rather than a
/// fetchable resource.
pub fn is_inline_image(src: &str) -> bool {
    src.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Resolve `src` against the page URL the way a browser reports `img.src`.
pub fn resolve_src(src: &str, base: Option<&Url>) -> String {
    match base.and_then(|b| b.join(src).ok()) {
        Some(resolved) => resolved.to_string(),
        None => src.to_string(),
    }
}

fn candidate(element: ElementRef<'_>, base: Option<&Url>) -> Option<ImageCandidate> {
    let src = element.value().attr("src")?.trim();
    if src.is_empty() || is_inline_image(src) {
        return None;
    }
    let alt = element
        .value()
        .attr("alt")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_IMAGE_ALT);
    Some(ImageCandidate {
        url: resolve_src(src, base),
        alt: alt.to_string(),
    })
}

/// Collect the gallery from the first image pattern that matches.
///
/// Only the first matching pattern is used; results are never merged
/// across patterns. With `fall_through_on_empty` unset, a pattern that
/// matched but filtered down to zero usable images still ends the search.
pub fn extract_images(
    doc: &Html,
    chain: &SelectorChain,
    base: Option<&Url>,
    fall_through_on_empty: bool,
) -> Vec<ImageCandidate> {
    for (pattern, elements) in chain.matches(doc) {
        let images: Vec<ImageCandidate> = elements
            .into_iter()
            .filter_map(|el| candidate(el, base))
            .take(MAX_IMAGES)
            .collect();

        if images.is_empty() && fall_through_on_empty {
            tracing::debug!("image pattern {pattern} matched only inline images, trying next");
            continue;
        }
        return images;
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::selectors::SelectorProfile;

    fn chain() -> SelectorChain {
        SelectorChain::compile(&SelectorProfile::default().images).unwrap()
    }

    #[test]
    fn test_inline_detection() {
        assert!(is_inline_image("data:image/png;base64,AAAA"));
        assert!(is_inline_image("  DATA:image/gif;base64,R0lG"));
        assert!(!is_inline_image("https://cdn.example/a.jpg"));
        assert!(!is_inline_image("/img/data.jpg"));
        assert!(!is_inline_image("da"));
    }

    #[test]
    fn test_relative_src_resolved() {
        let base = Url::parse("https://shop.example/products/42").unwrap();
        assert_eq!(
            resolve_src("/img/a.jpg", Some(&base)),
            "https://shop.example/img/a.jpg"
        );
        assert_eq!(resolve_src("a.jpg", None), "a.jpg");
    }

    #[test]
    fn test_cap_and_filter() {
        let mut html = String::from(r#"<div class="product-images">"#);
        html.push_str(r#"<img src="data:image/png;base64,AAAA">"#);
        for i in 0..14 {
            html.push_str(&format!(r#"<img src="https://cdn.example/{i}.jpg" alt="Shot {i}">"#));
        }
        html.push_str("</div>");
        let doc = Html::parse_document(&html);
        let images = extract_images(&doc, &chain(), None, false);
        assert_eq!(images.len(), MAX_IMAGES);
        assert_eq!(images[0].url, "https://cdn.example/0.jpg");
        assert_eq!(images[0].alt, "Shot 0");
        assert!(images.iter().all(|i| !i.url.starts_with("data:")));
    }

    #[test]
    fn test_first_matching_pattern_only() {
        let doc = Html::parse_document(
            r#"<div class="hero-image"><img src="https://cdn.example/hero.jpg"></div>
               <div class="product-gallery"><img src="https://cdn.example/g1.jpg"></div>"#,
        );
        let images = extract_images(&doc, &chain(), None, false);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://cdn.example/g1.jpg");
        assert_eq!(images[0].alt, DEFAULT_IMAGE_ALT);
    }

    #[test]
    fn test_filtered_to_empty_is_terminal_by_default() {
        let doc = Html::parse_document(
            r#"<div class="product-images"><img src="data:image/gif;base64,R0lG"></div>
               <div class="main-image"><img src="https://cdn.example/main.jpg"></div>"#,
        );
        assert!(extract_images(&doc, &chain(), None, false).is_empty());

        let images = extract_images(&doc, &chain(), None, true);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://cdn.example/main.jpg");
    }
}
