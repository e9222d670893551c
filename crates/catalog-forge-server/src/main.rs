//! Catalog Forge server and CLI entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use catalog_forge::ProductExtractor;
use catalog_forge_server::config::{ConfigOverrides, ServerConfig};
use catalog_forge_server::fetcher::http::HttpFetcher;
use catalog_forge_server::fetcher::PageFetcher;
use catalog_forge_server::state::AppState;

#[derive(Parser)]
#[command(
    name = "catalog-forge",
    about = "Turn product pages into editable, exportable product catalogs",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (default).
    Serve {
        /// Listen address (host:port). Also reads CATALOG_ADDR.
        #[arg(long)]
        addr: Option<String>,

        /// Directory for processed uploads. Also reads CATALOG_UPLOADS_DIR.
        #[arg(long)]
        uploads_dir: Option<PathBuf>,

        /// Chat-completion model. Also reads CATALOG_OPENAI_MODEL.
        #[arg(long)]
        model: Option<String>,

        /// Fetch pages over plain HTTP instead of headless Chromium.
        #[arg(long)]
        no_browser: bool,
    },

    /// Fetch a product page over HTTP and print the extracted data as JSON.
    Scrape {
        url: String,
    },

    /// Extract product data from a saved HTML file.
    Extract {
        file: PathBuf,

        /// Address the page was saved from; relative image URLs resolve
        /// against it.
        #[arg(long, default_value = "http://localhost/")]
        url: String,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   catalog-forge completions bash > ~/.local/share/bash-completion/completions/catalog-forge
    ///   catalog-forge completions zsh > ~/.zfunc/_catalog-forge
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        addr: None,
        uploads_dir: None,
        model: None,
        no_browser: false,
    }) {
        Commands::Serve {
            addr,
            uploads_dir,
            model,
            no_browser,
        } => {
            let overrides = ConfigOverrides {
                addr,
                uploads_dir,
                model,
                no_browser,
            };
            let config = ServerConfig::resolve(&overrides)?;
            tracing::info!("Catalog Forge server");
            tracing::info!("Uploads: {}", config.uploads_dir.display());
            tracing::info!("Model: {}", config.openai_model);

            let state = AppState::from_config(&config).await?;
            catalog_forge_server::serve(config.addr, state).await?;
        }

        Commands::Scrape { url } => {
            let config = ServerConfig::resolve(&ConfigOverrides::default())?;
            let fetcher = HttpFetcher::new(config.navigation)?;
            let page = fetcher.fetch(&url).await?;
            let data = ProductExtractor::with_defaults()?.extract_html(&page.html, &page.final_url);
            println!("{}", serde_json::to_string_pretty(&data)?);
        }

        Commands::Extract { file, url } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let data = catalog_forge::extract_product_html(&html, &url)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "catalog-forge", &mut std::io::stdout());
        }
    }

    Ok(())
}
