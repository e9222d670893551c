//! Shared state handed to every route.

use std::sync::Arc;

use anyhow::{Context, Result};

use catalog_forge::{ProductExtractor, UploadStore};

use crate::config::ServerConfig;
use crate::fetcher::chromium::ChromiumRenderer;
use crate::fetcher::http::HttpFetcher;
use crate::fetcher::{BrowserFetcher, PageFetcher};
use crate::llm::{OpenAiClient, TextGenerator, UnconfiguredGenerator};

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<ProductExtractor>,
    pub uploads: UploadStore,
    pub fetcher: Arc<dyn PageFetcher>,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(
        extractor: ProductExtractor,
        uploads: UploadStore,
        fetcher: Arc<dyn PageFetcher>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            uploads,
            fetcher,
            generator,
        }
    }

    /// Build the production state: default selector profile, upload
    /// directory, Chromium when available (plain HTTP otherwise), and the
    /// OpenAI client when a key is configured.
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let extractor = ProductExtractor::with_defaults()?;
        let uploads = UploadStore::open(&config.uploads_dir).with_context(|| {
            format!("failed to open uploads dir {}", config.uploads_dir.display())
        })?;
        let fetcher = build_fetcher(config).await?;

        let generator: Arc<dyn TextGenerator> = match &config.openai_api_key {
            Some(key) => Arc::new(OpenAiClient::new(
                key.clone(),
                config.openai_model.clone(),
                config.openai_base_url.clone(),
            )?),
            None => {
                tracing::warn!("OPENAI_API_KEY not set; content generation will fail");
                Arc::new(UnconfiguredGenerator)
            }
        };

        Ok(Self::new(extractor, uploads, fetcher, generator))
    }
}

async fn build_fetcher(config: &ServerConfig) -> Result<Arc<dyn PageFetcher>> {
    if config.use_browser {
        match ChromiumRenderer::launch(config.chromium_path.as_deref()).await {
            Ok(renderer) => {
                return Ok(Arc::new(BrowserFetcher::new(
                    Arc::new(renderer),
                    config.navigation.clone(),
                )));
            }
            Err(e) => tracing::warn!("{e:#}; falling back to plain HTTP fetching"),
        }
    }
    Ok(Arc::new(HttpFetcher::new(config.navigation.clone())?))
}
