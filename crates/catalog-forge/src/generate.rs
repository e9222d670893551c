//! Marketing copy generation: prompt construction and response shaping.
//!
//! The chat-completion call itself lives with the caller. This module only
//! builds prompts and turns whatever text comes back into a complete
//! [`GeneratedContent`], falling back to a fixed payload when the reply is
//! not usable JSON.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::types::{GeneratedContent, GenerationOptions, ProductInput, Specifications, Suggestions};

/// System message for content generation.
pub const CONTENT_SYSTEM_PROMPT: &str =
    "You are an assistant for generating product catalog content.";

/// System message for improvement suggestions.
pub const SUGGESTIONS_SYSTEM_PROMPT: &str =
    "You are an assistant for suggesting product catalog improvements.";

pub const MAX_FEATURES: usize = 8;
pub const MAX_BENEFITS: usize = 6;
pub const MAX_KEYWORDS: usize = 12;

static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

/// Build the content-generation prompt.
pub fn build_content_prompt(product: &ProductInput, options: &GenerationOptions) -> String {
    let specs = serde_json::to_string_pretty(&product.specifications)
        .unwrap_or_else(|_| "{}".to_string());
    let tone = serde_json::to_value(options.tone)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let length = serde_json::to_value(options.length)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();

    format!(
        r#"You are a professional product catalog writer. Generate compelling, accurate, and detailed content for the following product:

PRODUCT INFORMATION:
- Title: {title}
- Description: {description}
- Price: {price}
- Specifications: {specs}
- Source URL: {url}

REQUIREMENTS:
- Tone: {tone}
- Length: {length}
- Include features: {features}
- Include benefits: {benefits}

Please generate the following content in JSON format:

{{
  "title": "Enhanced, compelling product title (max 80 characters)",
  "description": "Professional product description ({words} words)",
  "specifications": {{
    "Enhanced specifications object with improved formatting and additional technical details"
  }},
  "features": [
    "Array of 5-8 key product features as bullet points"
  ],
  "benefits": [
    "Array of 4-6 customer benefits explaining why they should choose this product"
  ],
  "keywords": [
    "Array of 8-12 SEO keywords relevant to this product"
  ],
  "category": "Product category classification",
  "targetAudience": "Primary target audience description"
}}

Guidelines:
- Make the content engaging and persuasive
- Focus on unique selling points
- Use industry-appropriate terminology
- Ensure all content is factual and based on provided information
- Optimize for both readability and SEO
- Maintain consistency in tone throughout
"#,
        title = product.title,
        description = product.description,
        price = product.price.as_deref().unwrap_or("Not specified"),
        url = product.url,
        features = options.include_features,
        benefits = options.include_benefits,
        words = options.length.word_range(),
    )
}

/// Build the improvement-suggestions prompt.
pub fn build_suggestions_prompt(product: &ProductInput) -> String {
    let current = serde_json::to_string_pretty(product).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"Analyze this product catalog content and suggest improvements:

CURRENT CONTENT:
{current}

Provide suggestions in JSON format:
{{
  "titleSuggestions": ["Alternative title 1", "Alternative title 2", "Alternative title 3"],
  "descriptionImprovements": ["Improvement suggestion 1", "Improvement suggestion 2"],
  "missingFeatures": ["Feature that should be highlighted 1", "Feature 2"],
  "seoRecommendations": ["SEO tip 1", "SEO tip 2"],
  "layoutSuggestions": ["Layout improvement 1", "Layout improvement 2"]
}}
"#
    )
}

/// Locate the outermost `{ ... }` span in free text.
pub fn json_span(text: &str) -> Option<&str> {
    JSON_SPAN.find(text).map(|m| m.as_str())
}

/// Parse the JSON object embedded in a model reply.
///
/// Returns `None` when the reply has no braces or the span is not a JSON
/// object (markdown fences and chatter around it are tolerated).
pub fn parse_generated(text: &str) -> Option<Map<String, Value>> {
    let span = json_span(text)?;
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Failed to parse generated content: {e}");
            None
        }
    }
}

/// Deterministic payload used when the model reply cannot be parsed.
pub fn fallback_content(product: &ProductInput) -> Map<String, Value> {
    let value = serde_json::json!({
        "title": product.title,
        "description": product.description,
        "specifications": product.specifications,
        "features": [
            "High-quality construction and materials",
            "User-friendly design and interface",
            "Reliable performance and durability",
            "Excellent value for money",
            "Comprehensive warranty coverage",
        ],
        "benefits": [
            "Saves time and increases efficiency",
            "Provides long-lasting value",
            "Easy to use and maintain",
            "Backed by excellent customer support",
        ],
        "keywords": ["product", "quality", "reliable", "efficient"],
        "category": "General Product",
        "targetAudience": "General consumers",
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn non_empty_str(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn string_list(raw: &Map<String, Value>, key: &str, cap: usize, default: &[&str]) -> Vec<String> {
    match raw.get(key) {
        Some(Value::Array(items)) => items.iter().take(cap).map(value_to_text).collect(),
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// Turn a parsed (or fallback) payload into complete generated content.
///
/// Missing fields fall back to the product input or to fixed defaults;
/// generated specifications are layered over the scraped ones.
pub fn finalize_content(
    raw: &Map<String, Value>,
    product: &ProductInput,
    generated_at: DateTime<Utc>,
) -> GeneratedContent {
    let mut specifications: Specifications = product.specifications.clone();
    if let Some(Value::Object(generated)) = raw.get("specifications") {
        for (key, value) in generated {
            specifications.insert(key.clone(), value_to_text(value));
        }
    }

    GeneratedContent {
        title: non_empty_str(raw, "title").unwrap_or_else(|| product.title.clone()),
        description: non_empty_str(raw, "description")
            .unwrap_or_else(|| product.description.clone()),
        specifications,
        features: string_list(
            raw,
            "features",
            MAX_FEATURES,
            &["High-quality product with excellent features"],
        ),
        benefits: string_list(
            raw,
            "benefits",
            MAX_BENEFITS,
            &["Provides excellent value and performance"],
        ),
        keywords: string_list(raw, "keywords", MAX_KEYWORDS, &["product", "quality"]),
        category: non_empty_str(raw, "category").unwrap_or_else(|| "Product".to_string()),
        target_audience: non_empty_str(raw, "targetAudience")
            .unwrap_or_else(|| "General consumers".to_string()),
        generated_at: Some(generated_at),
    }
}

/// Full shaping step: parse the reply, fall back if needed, finalize.
pub fn content_from_reply(
    reply: &str,
    product: &ProductInput,
    generated_at: DateTime<Utc>,
) -> GeneratedContent {
    let raw = parse_generated(reply).unwrap_or_else(|| {
        tracing::warn!("No valid JSON found in generated reply, using fallback content");
        fallback_content(product)
    });
    finalize_content(&raw, product, generated_at)
}

fn fallback_suggestions() -> Suggestions {
    Suggestions {
        title_suggestions: vec!["Consider adding key benefits to the title".into()],
        description_improvements: vec!["Add more specific technical details".into()],
        missing_features: vec!["Consider highlighting unique selling points".into()],
        seo_recommendations: vec!["Include relevant keywords naturally".into()],
        layout_suggestions: vec!["Use bullet points for better readability".into()],
    }
}

/// Parse a suggestions reply.
///
/// No JSON span yields an empty set; a span that fails to parse yields the
/// stock suggestions.
pub fn parse_suggestions(reply: &str) -> Suggestions {
    let Some(span) = json_span(reply) else {
        return Suggestions::default();
    };
    serde_json::from_str(span).unwrap_or_else(|e| {
        tracing::warn!("Failed to parse suggestions: {e}");
        fallback_suggestions()
    })
}
