//! Plain HTTP fetcher for hosts without a browser.
//!
//! Script-rendered pages come back as their server-side HTML, so the
//! extraction is only as good as what the site sends without JavaScript.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};

use super::chromium::BROWSER_USER_AGENT;
use super::{retry_navigation, FetchError, FetchedPage, PageFetcher};
use crate::config::NavigationConfig;

const MAX_REDIRECTS: usize = 5;
const MAX_STATUS_RETRIES: u32 = 2;

/// Fetcher backed by reqwest.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    nav: NavigationConfig,
}

impl HttpFetcher {
    pub fn new(nav: NavigationConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://google.com"));

        let client = reqwest::Client::builder()
            .timeout(nav.timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, nav })
    }

    /// One GET with retry on 5xx and backoff on 429.
    async fn get_once(&self, url: &str) -> Result<FetchedPage> {
        let mut retries = 0u32;
        loop {
            let resp = self.client.get(url).send().await?;
            let status = resp.status();

            if status.is_server_error() && retries < MAX_STATUS_RETRIES {
                retries += 1;
                tokio::time::sleep(Duration::from_millis(500 * 2u64.pow(retries - 1))).await;
                continue;
            }
            if status.as_u16() == 429 && retries < MAX_STATUS_RETRIES {
                retries += 1;
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                tokio::time::sleep(Duration::from_secs(retry_after.min(10))).await;
                continue;
            }
            if !status.is_success() {
                bail!("HTTP {status} from {url}");
            }

            let final_url = resp.url().to_string();
            let html = resp.text().await.context("failed to read response body")?;
            return Ok(FetchedPage { html, final_url });
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        retry_navigation(url, &self.nav, || self.get_once(url)).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
