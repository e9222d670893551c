//! Configuration loading and resolution.
//!
//! Every setting resolves in the same order: explicit CLI flag, then
//! environment variable, then built-in default.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_ADDR: &str = "127.0.0.1:3001";
pub const DEFAULT_UPLOADS_DIR: &str = "./uploads";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Retry policy for page navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConfig {
    /// Extra attempts after the first one.
    pub retries: u32,
    pub retry_delay: Duration,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub addr: Option<String>,
    pub uploads_dir: Option<PathBuf>,
    pub model: Option<String>,
    pub no_browser: bool,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub uploads_dir: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub chromium_path: Option<PathBuf>,
    pub use_browser: bool,
    pub navigation: NavigationConfig,
}

impl ServerConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with(
        overrides: &ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let addr = overrides
            .addr
            .clone()
            .or_else(|| var("CATALOG_ADDR"))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("invalid listen address: {addr}"))?;

        let uploads_dir = overrides
            .uploads_dir
            .clone()
            .or_else(|| var("CATALOG_UPLOADS_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR));

        let openai_model = overrides
            .model
            .clone()
            .or_else(|| var("CATALOG_OPENAI_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let openai_base_url = var("CATALOG_OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut navigation = NavigationConfig::default();
        if let Some(retries) = var("CATALOG_NAV_RETRIES") {
            navigation.retries = retries
                .parse()
                .with_context(|| format!("invalid CATALOG_NAV_RETRIES: {retries}"))?;
        }
        if let Some(secs) = var("CATALOG_NAV_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("invalid CATALOG_NAV_TIMEOUT_SECS: {secs}"))?;
            navigation.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            addr,
            uploads_dir,
            openai_api_key: var("OPENAI_API_KEY"),
            openai_model,
            openai_base_url,
            chromium_path: var("CATALOG_CHROMIUM_PATH").map(PathBuf::from),
            use_browser: !overrides.no_browser,
            navigation,
        })
    }
}
