use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use instafeed_core::{CacheStore, FeedConfig, FeedService, HttpFetcher, JsonFileStore, JsonLinesSink};
use tracing::error;
use tracing_subscriber::EnvFilter;

const TOKEN_ENV: &str = "INSTAFEED_ACCESS_TOKEN";

/// Fetch an Instagram media feed and print its items as JSON lines.
#[derive(Parser)]
#[command(name = "instafeed", version)]
struct Cli {
    /// Config file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Access token; overrides the config file and the environment.
    #[arg(long)]
    token: Option<String>,
    /// Feed identity used to namespace the cache.
    #[arg(long)]
    feed_id: Option<String>,
    /// Fetch even when the cached entry is fresh; it is still used if the fetch fails.
    #[arg(long)]
    refresh: bool,
    /// Disable caching for this run.
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| config_dir().join("config.json"));
    let config = apply_overrides(FeedConfig::from_file(&config_path), &cli);

    let fetcher = match HttpFetcher::from_config(&config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };
    let store = JsonFileStore::load_from(config_dir().join("cache.json")).await;
    let cache = CacheStore::with_ttl_minutes(Arc::new(store), config.cache_ttl_minutes);

    let service = FeedService::new(config, cache, Arc::new(fetcher)).with_force_refresh(cli.refresh);
    let stdout = JsonLinesSink::new(std::io::stdout());
    match service.run(&[&stdout]).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(u8::try_from(err.code()).unwrap_or(1)),
    }
}

fn apply_overrides(mut config: FeedConfig, cli: &Cli) -> FeedConfig {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            config.access_token = token;
        }
    }
    if let Some(token) = &cli.token {
        config.access_token = token.clone();
    }
    if let Some(feed_id) = &cli.feed_id {
        config.feed_id = feed_id.clone();
    }
    if cli.no_cache {
        config.cache_ttl_minutes = 0;
    }
    config
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn config_dir() -> PathBuf {
    // Linux: ~/.config/instafeed
    let mut dir = dirs::config_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();
    dir.push("instafeed");
    dir
}
