//! HTTP routes.
//!
//! Every JSON route answers with the `{ success, data }` envelope on
//! success and `{ success: false, error, message }` on failure.

pub mod ai;
pub mod catalog;
pub mod export;
pub mod images;
pub mod scrape;

use axum::async_trait;
use axum::extract::{DefaultBodyLimit, FromRequest, Request, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use catalog_forge::images::{MAX_UPLOAD_BYTES, MAX_UPLOAD_FILES};
use catalog_forge::storage::UPLOADS_URL_PREFIX;

use crate::error::ApiError;
use crate::state::AppState;

/// Body limit for the multipart upload route: every file at its cap plus
/// room for the multipart framing.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES * MAX_UPLOAD_FILES + 1024 * 1024;

/// Body limit for JSON routes; catalogs carry inline content only.
const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// JSON body extractor whose rejections use the API error envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Build the axum Router with all endpoints.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let uploads = ServeDir::new(state.uploads.dir());

    Router::new()
        .route("/health", get(health))
        .route("/api/scrape", post(scrape::scrape))
        .route("/api/ai/generate-content", post(ai::generate_content))
        .route("/api/ai/suggest-improvements", post(ai::suggest_improvements))
        .route(
            "/api/images/upload",
            post(images::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/images/search-unsplash", post(images::search_stock))
        .route("/api/images/optimize/:id", post(images::optimize))
        .route("/api/images/:id", delete(images::delete))
        .route("/api/catalog/assemble", post(catalog::assemble))
        .route("/api/catalog/edit", post(catalog::edit))
        .route("/api/export/pdf", post(export::pdf))
        .route("/api/export/docx", post(export::docx))
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
        "fetcher": state.fetcher.name(),
        "timestamp": chrono::Utc::now(),
    }))
}

/// Run CPU-bound library work off the async executor.
pub(crate) async fn blocking<T, F>(summary: &'static str, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> catalog_forge::CatalogResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::failed(summary, e))?
        .map_err(|e| ApiError::from_catalog(summary, e))
}

/// Start the HTTP server on the given address.
pub async fn serve(addr: std::net::SocketAddr, state: AppState) -> anyhow::Result<()> {
    let fetcher = state.fetcher.clone();
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Catalog Forge API listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutting down");
        })
        .await?;
    fetcher.shutdown().await?;
    Ok(())
}
