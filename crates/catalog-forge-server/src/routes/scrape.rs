use axum::extract::State;
use serde::Deserialize;
use url::Url;

use catalog_forge::ScrapedData;

use super::ApiJson;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::fetcher::FetchError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// Accept only absolute http(s) URLs.
pub fn validate_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ApiError::Validation(format!("\"url\" must be a valid uri: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(ApiError::Validation(
            "\"url\" must be an http or https uri".to_string(),
        )),
    }
}

/// `POST /api/scrape`
pub async fn scrape(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ScrapeRequest>,
) -> ApiResult<ScrapedData> {
    let url = validate_url(&req.url)?;
    tracing::info!("Starting scrape for URL: {url}");

    let page = state.fetcher.fetch(url.as_str()).await.map_err(|e| match e {
        FetchError::Navigation(msg) => {
            tracing::error!("Navigation error for URL {url}: {msg}");
            ApiError::Navigation(msg)
        }
        FetchError::Other(e) => {
            ApiError::failed("Failed to scrape product information", format!("{e:#}"))
        }
    })?;

    let data = state.extractor.extract_html(&page.html, &page.final_url);
    tracing::info!("Successfully scraped product: {}", data.title);
    Ok(ApiResponse::ok(data))
}
