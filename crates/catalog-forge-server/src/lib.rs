//! Catalog Forge server: HTTP API, page fetching and the completion client.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod llm;
pub mod routes;
pub mod state;

pub use config::{ConfigOverrides, ServerConfig};
pub use error::{ApiError, ApiResponse};
pub use routes::{router, serve};
pub use state::AppState;
