//! Headless Chromium page loading through chromiumoxide.
//!
//! One browser is launched per server process; every fetch opens its own
//! tab with the browser-like headers product sites expect, and closes it
//! afterwards.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::page::Page;
use futures::StreamExt;

use super::{NavigationResult, RenderContext, Renderer};

/// Desktop Chrome user agent presented to product sites.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36";

/// Flags for running inside containers without a sandbox or GPU.
const LAUNCH_ARGS: &[&str] = &[
    "--headless=new",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--disable-gpu",
    "--window-size=1920,1080",
    "--lang=en-US",
];

const MAC_CHROME: &str = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";
const PATH_BINARIES: &[&str] = &["google-chrome", "chromium", "chromium-browser"];

/// Install locations under `~/.catalog-forge/chromium`.
fn managed_installs(home: &Path) -> Vec<PathBuf> {
    let root = home.join(".catalog-forge").join("chromium");
    let mut paths = if cfg!(target_os = "macos") {
        ["chrome-mac-arm64", "chrome-mac-x64"]
            .iter()
            .map(|arch| {
                root.join(arch)
                    .join("Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing")
            })
            .collect()
    } else {
        vec![root.join("chrome-linux64").join("chrome")]
    };
    paths.push(root.join("chrome"));
    paths
}

/// Locate a Chromium binary.
///
/// Order: the configured path, a managed install in the home directory,
/// `google-chrome`/`chromium`/`chromium-browser` on PATH, then the stock
/// macOS application.
pub fn find_chromium(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!("Configured Chromium not found at {}", path.display());
    }

    dirs::home_dir()
        .map(|home| managed_installs(&home))
        .unwrap_or_default()
        .into_iter()
        .find(|p| p.exists())
        .or_else(|| PATH_BINARIES.iter().find_map(|name| which::which(name).ok()))
        .or_else(|| {
            let mac = PathBuf::from(MAC_CHROME);
            (cfg!(target_os = "macos") && mac.exists()).then_some(mac)
        })
}

/// Headless Chromium shared by all scrape requests.
pub struct ChromiumRenderer {
    browser: Browser,
    open_tabs: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch headless Chromium and drive its event loop in the background.
    pub async fn launch(configured: Option<&Path>) -> Result<Self> {
        let executable = find_chromium(configured)
            .context("Chromium not found. Set CATALOG_CHROMIUM_PATH or install Chrome.")?;
        tracing::info!("Launching Chromium from {}", executable.display());

        let config = LAUNCH_ARGS
            .iter()
            .fold(BrowserConfig::builder().chrome_executable(executable), |b, arg| {
                b.arg(*arg)
            })
            .arg(format!("--user-agent={BROWSER_USER_AGENT}"))
            .build()
            .map_err(|e| anyhow!("invalid browser config: {e}"))?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;
        tokio::spawn(async move { while events.next().await.is_some() {} });

        Ok(Self {
            browser,
            open_tabs: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open a tab")?;

        let headers = Headers::new(serde_json::json!({
            "Accept-Language": "en-US,en;q=0.9",
            "Referer": "https://google.com",
        }));
        page.execute(SetExtraHttpHeadersParams::new(headers))
            .await
            .context("failed to set request headers")?;

        self.open_tabs.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(ChromiumTab {
            page,
            open_tabs: Arc::clone(&self.open_tabs),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        // The browser process exits when the renderer is dropped.
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.open_tabs.load(Ordering::Relaxed)
    }
}

/// One tab, used for a single fetch.
pub struct ChromiumTab {
    page: Page,
    open_tabs: Arc<AtomicUsize>,
}

impl ChromiumTab {
    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self
            .page
            .url()
            .await
            .context("failed to read the tab URL")?
            .map(|u| u.to_string()))
    }
}

#[async_trait]
impl RenderContext for ChromiumTab {
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let started = Instant::now();
        let load = async {
            self.page.goto(url).await?;
            // Late redirects are best-effort; goto already waited for load.
            if let Err(e) = self.page.wait_for_navigation().await {
                tracing::debug!("wait_for_navigation after {url}: {e}");
            }
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        tokio::time::timeout(Duration::from_millis(timeout_ms), load)
            .await
            .map_err(|_| anyhow!("navigation timed out after {timeout_ms}ms"))?
            .map_err(|e| anyhow!("navigation failed: {e}"))?;

        let final_url = self
            .current_url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());
        Ok(NavigationResult {
            final_url,
            load_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn get_html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .context("failed to read the rendered document")
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.current_url().await?.unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.open_tabs.fetch_sub(1, Ordering::Relaxed);
        if let Err(e) = self.page.close().await {
            tracing::debug!("Tab close failed: {e}");
        }
        Ok(())
    }
}
