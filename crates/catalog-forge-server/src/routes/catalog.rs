use serde::Deserialize;

use catalog_forge::{
    apply_edits, assemble_catalog, CatalogData, CatalogEdit, GeneratedContent, ImageCandidate,
    ScrapedData,
};

use super::ApiJson;
use crate::error::{ApiError, ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembleRequest {
    pub product: ScrapedData,
    pub generated_content: GeneratedContent,
    /// Images chosen for the gallery; the scraped images when absent.
    #[serde(default)]
    pub images: Option<Vec<ImageCandidate>>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub catalog: CatalogData,
    #[serde(default)]
    pub edits: Vec<CatalogEdit>,
}

/// `POST /api/catalog/assemble`
pub async fn assemble(ApiJson(req): ApiJson<AssembleRequest>) -> ApiResult<CatalogData> {
    let images = req.images.unwrap_or_else(|| req.product.images.clone());
    let catalog = assemble_catalog(req.product, req.generated_content, &images);
    Ok(ApiResponse::ok(catalog))
}

/// `POST /api/catalog/edit`
pub async fn edit(ApiJson(req): ApiJson<EditRequest>) -> ApiResult<CatalogData> {
    let count = req.edits.len();
    let catalog = apply_edits(&req.catalog, req.edits)
        .map_err(|e| ApiError::from_catalog("Failed to edit catalog", e))?;
    tracing::debug!("Applied {count} catalog edits");
    Ok(ApiResponse::ok(catalog))
}
