use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;

use catalog_forge::generate::{
    build_content_prompt, build_suggestions_prompt, content_from_reply, parse_suggestions,
    CONTENT_SYSTEM_PROMPT, SUGGESTIONS_SYSTEM_PROMPT,
};
use catalog_forge::{GeneratedContent, GenerationOptions, ProductInput, Suggestions};

use super::scrape::validate_url;
use super::ApiJson;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::llm::CompletionRequest;
use crate::state::AppState;

const CONTENT_MAX_TOKENS: usize = 1500;
const SUGGESTIONS_MAX_TOKENS: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub product_data: ProductInput,
    #[serde(default)]
    pub options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub product_data: ProductInput,
}

fn validate_product(product: &ProductInput) -> Result<(), ApiError> {
    if product.title.trim().is_empty() {
        return Err(ApiError::Validation("\"productData.title\" is required".into()));
    }
    if product.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "\"productData.description\" is required".into(),
        ));
    }
    validate_url(&product.url).map(|_| ())
}

/// `POST /api/ai/generate-content`
pub async fn generate_content(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> ApiResult<GeneratedContent> {
    validate_product(&req.product_data)?;
    tracing::info!("Generating content for: {}", req.product_data.title);

    let prompt = build_content_prompt(&req.product_data, &req.options);
    let reply = state
        .generator
        .complete(CompletionRequest {
            system: CONTENT_SYSTEM_PROMPT,
            prompt: &prompt,
            max_tokens: CONTENT_MAX_TOKENS,
        })
        .await
        .map_err(|e| ApiError::failed("Failed to generate AI content", format!("{e:#}")))?;

    let content = content_from_reply(&reply, &req.product_data, Utc::now());
    tracing::info!("Content generated successfully for: {}", req.product_data.title);
    Ok(ApiResponse::ok(content))
}

/// `POST /api/ai/suggest-improvements`
pub async fn suggest_improvements(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SuggestRequest>,
) -> ApiResult<Suggestions> {
    validate_product(&req.product_data)?;
    let prompt = build_suggestions_prompt(&req.product_data);
    let reply = state
        .generator
        .complete(CompletionRequest {
            system: SUGGESTIONS_SYSTEM_PROMPT,
            prompt: &prompt,
            max_tokens: SUGGESTIONS_MAX_TOKENS,
        })
        .await
        .map_err(|e| ApiError::failed("Failed to generate suggestions", format!("{e:#}")))?;

    Ok(ApiResponse::ok(parse_suggestions(&reply)))
}
