use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Local;

use catalog_forge::export::{export_filename, render_docx, render_pdf, ExportFormat, ExportRequest};

use super::{blocking, ApiJson};
use crate::error::ApiError;

/// Render `req` as `format` and answer with a download.
async fn export_as(format: ExportFormat, req: ExportRequest) -> Result<Response, ApiError> {
    let summary = match format {
        ExportFormat::Pdf => "Failed to generate PDF",
        ExportFormat::Docx => "Failed to generate DOCX",
    };
    req.validate().map_err(|e| ApiError::from_catalog(summary, e))?;
    if req.format != format {
        tracing::debug!("Export format {:?} overridden by route ({format:?})", req.format);
    }

    let title = req.catalog_data.generated_content.title.clone();
    tracing::info!("Generating {} for: {title}", format.extension().to_uppercase());

    let today = Local::now().date_naive();
    let bytes = blocking(summary, move || match format {
        ExportFormat::Pdf => render_pdf(&req.catalog_data, &req.options, today),
        ExportFormat::Docx => render_docx(&req.catalog_data, &req.options, today),
    })
    .await?;

    tracing::info!("{} generated successfully for: {title}", format.extension().to_uppercase());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(&title, format.extension())
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// `POST /api/export/pdf`
pub async fn pdf(ApiJson(req): ApiJson<ExportRequest>) -> Result<Response, ApiError> {
    export_as(ExportFormat::Pdf, req).await
}

/// `POST /api/export/docx`
pub async fn docx(ApiJson(req): ApiJson<ExportRequest>) -> Result<Response, ApiError> {
    export_as(ExportFormat::Docx, req).await
}
