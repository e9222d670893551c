//! Page fetching: load a product page and hand back its HTML.
//!
//! Two fetchers implement [`PageFetcher`]: [`BrowserFetcher`] renders the
//! page in headless Chromium through the [`Renderer`]/[`RenderContext`]
//! abstraction, and [`http::HttpFetcher`] performs a plain GET for hosts
//! without a browser. Both retry navigation with [`retry_navigation`].

pub mod chromium;
pub mod http;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::NavigationConfig;

/// Result of navigating to a URL.
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A loaded page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    /// Address the page ended up at; extraction resolves relative URLs
    /// against it.
    pub final_url: String,
}

/// Errors while fetching a page.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// Every navigation attempt failed.
    #[error("{0}")]
    Navigation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Loads pages for extraction.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
    /// Short name for logs and `/health`.
    fn name(&self) -> &'static str;
    /// Release engine resources on server shutdown.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL, waiting at most `timeout_ms`.
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A no-op renderer used when Chromium is unavailable.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("Browser not available (HTTP-only mode)"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
}

/// Run `attempt` until it succeeds, at most `1 + nav.retries` times.
///
/// Each attempt is bounded by `nav.timeout` and failed attempts are
/// followed by a `nav.retry_delay` pause. The last error is returned as
/// [`FetchError::Navigation`].
pub async fn retry_navigation<T, F, Fut>(
    url: &str,
    nav: &NavigationConfig,
    mut attempt: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = nav.retries + 1;
    let mut last_error = String::new();

    for n in 1..=attempts {
        tracing::info!("Attempt {n} of {attempts}: Trying to navigate to {url}");
        match tokio::time::timeout(nav.timeout, attempt()).await {
            Ok(Ok(value)) => {
                tracing::info!("Navigation successful");
                return Ok(value);
            }
            Ok(Err(e)) => last_error = format!("{e:#}"),
            Err(_) => {
                last_error = format!("navigation timed out after {}ms", nav.timeout.as_millis())
            }
        }
        tracing::error!("Attempt {n} failed: {last_error}");
        if n < attempts {
            tracing::info!("Retrying in {} seconds...", nav.retry_delay.as_secs_f32());
            tokio::time::sleep(nav.retry_delay).await;
        }
    }
    Err(FetchError::Navigation(last_error))
}

/// Fetcher that renders pages in a browser.
pub struct BrowserFetcher {
    renderer: Arc<dyn Renderer>,
    nav: NavigationConfig,
}

impl BrowserFetcher {
    pub fn new(renderer: Arc<dyn Renderer>, nav: NavigationConfig) -> Self {
        Self { renderer, nav }
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let ctx = self.renderer.new_context().await?;
        let timeout_ms = self.nav.timeout.as_millis() as u64;

        let navigated = retry_navigation(url, &self.nav, || ctx.navigate(url, timeout_ms)).await;
        let page = match navigated {
            Ok(nav) => {
                tracing::debug!(
                    "Loaded {} in {}ms ({} open contexts)",
                    nav.final_url,
                    nav.load_time_ms,
                    self.renderer.active_contexts()
                );
                let html = ctx.get_html().await;
                let current = ctx.get_url().await.unwrap_or_default();
                html.map(|html| FetchedPage {
                    html,
                    final_url: if current.is_empty() { nav.final_url } else { current },
                })
                .map_err(FetchError::from)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = ctx.close().await {
            tracing::warn!("Failed to close browser context: {e}");
        }
        page
    }

    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn shutdown(&self) -> Result<()> {
        self.renderer.shutdown().await
    }
}
