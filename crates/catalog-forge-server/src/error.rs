//! API error type and the JSON envelopes every route answers with.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use catalog_forge::CatalogError;

/// Summary reported when a page could not be loaded at all.
pub const NAVIGATION_FAILED: &str =
    "Failed to load the page. The site may be down or blocking bots.";

/// All errors a route can answer with.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{summary}: {message}")]
    NotFound {
        summary: &'static str,
        message: String,
    },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("{summary}: {message}")]
    Failed {
        summary: &'static str,
        message: String,
    },
}

impl ApiError {
    /// Generic failure with a route-specific summary.
    pub fn failed(summary: &'static str, err: impl std::fmt::Display) -> Self {
        ApiError::Failed {
            summary,
            message: err.to_string(),
        }
    }

    /// Map a library error: bad input is a 400, missing files a 404,
    /// anything else a 500 under `summary`.
    pub fn from_catalog(summary: &'static str, err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidInput(msg) | CatalogError::Selector(msg) => {
                ApiError::Validation(msg)
            }
            CatalogError::NotFound(msg) => ApiError::NotFound {
                summary: "Not found",
                message: msg,
            },
            other => ApiError::failed(summary, other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Navigation(_) | ApiError::Failed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short description placed in the envelope's `error` field.
    pub fn summary(&self) -> &str {
        match self {
            ApiError::Validation(_) => "Validation error",
            ApiError::NotFound { summary, .. } | ApiError::Failed { summary, .. } => summary,
            ApiError::Navigation(_) => NAVIGATION_FAILED,
        }
    }

    /// Detail placed in the envelope's `message` field.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg) | ApiError::Navigation(msg) => msg,
            ApiError::NotFound { message, .. } | ApiError::Failed { message, .. } => message,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::debug!("{self}");
        }
        let body = ErrorBody {
            success: false,
            error: self.summary(),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            total: None,
            message: None,
        })
    }

    pub fn with_total(data: T, total: usize) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            total: Some(total),
            message: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            total: None,
            message: Some(message.into()),
        })
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_mapping() {
        let err = ApiError::from_catalog("Failed", CatalogError::InvalidInput("bad".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = ApiError::from_catalog("Failed", CatalogError::NotFound("x".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err = ApiError::from_catalog("Failed to export", CatalogError::Export("zip".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.summary(), "Failed to export");
        assert!(err.message().contains("zip"));
    }

    #[test]
    fn test_navigation_summary() {
        let err = ApiError::Navigation("timeout".into());
        assert_eq!(err.summary(), NAVIGATION_FAILED);
        assert_eq!(err.message(), "timeout");
    }

    #[test]
    fn test_envelopes_serialize() {
        let Json(body) = ApiResponse::with_total(vec![1, 2], 2);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2], "total": 2}));
        let Json(body) = ApiResponse::<()>::message("done");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));
    }
}
