use axum::extract::{Multipart, Path, State};
use chrono::Utc;

use catalog_forge::images::{
    optimize as optimize_image, process_upload, stock_photos, OptimizeRequest, OptimizedImage,
    StockPhoto, StockQuery, UploadedImage, MAX_UPLOAD_FILES,
};
use catalog_forge::CatalogError;

use super::{blocking, ApiJson};
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the files.
pub const UPLOAD_FIELD: &str = "images";

struct RawUpload {
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

async fn read_uploads(mut multipart: Multipart) -> Result<Vec<RawUpload>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if files.len() == MAX_UPLOAD_FILES {
            return Err(ApiError::Validation(format!(
                "At most {MAX_UPLOAD_FILES} images per upload"
            )));
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let mime = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        files.push(RawUpload {
            name,
            mime,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

/// `POST /api/images/upload`
pub async fn upload(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Vec<UploadedImage>> {
    let files = read_uploads(multipart).await?;
    if files.is_empty() {
        return Err(ApiError::Validation("No files uploaded".into()));
    }

    let store = state.uploads.clone();
    let processed = blocking("Failed to process images", move || {
        files
            .iter()
            .map(|f| process_upload(&f.bytes, &f.name, &f.mime, &store))
            .collect::<Result<Vec<_>, CatalogError>>()
    })
    .await?;

    tracing::info!("Processed {} images", processed.len());
    Ok(ApiResponse::ok(processed))
}

/// `POST /api/images/search-unsplash`
pub async fn search_stock(ApiJson(query): ApiJson<StockQuery>) -> ApiResult<Vec<StockPhoto>> {
    let photos = stock_photos(&query, Utc::now())
        .map_err(|e| ApiError::from_catalog("Failed to search for images", e))?;
    let total = photos.len();
    Ok(ApiResponse::with_total(photos, total))
}

/// `POST /api/images/optimize/:id`
pub async fn optimize(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<OptimizeRequest>,
) -> ApiResult<OptimizedImage> {
    let store = state.uploads.clone();
    let optimized = blocking("Failed to optimize image", move || {
        optimize_image(&id, &req, &store)
    })
    .await?;
    Ok(ApiResponse::ok(optimized))
}

/// `DELETE /api/images/:id`
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.uploads.delete(&id).map_err(|e| match e {
        CatalogError::NotFound(msg) => ApiError::NotFound {
            summary: "Image not found or could not be deleted",
            message: msg,
        },
        other => ApiError::from_catalog("Image not found or could not be deleted", other),
    })?;
    Ok(ApiResponse::<()>::message("Image deleted successfully"))
}
