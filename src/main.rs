use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use amal_backend::config::{AppConfig, load_config};
use amal_backend::http::{AppState, HttpServer};
use amal_backend::security::RateLimiters;
use amal_backend::store::{ContentStore, Seed};

#[derive(Parser)]
#[command(name = "amal-backend", about = "Content backend for the Amal association website")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amal_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = if args.config.exists() {
        load_config(&args.config)?
    } else {
        tracing::warn!(path = %args.config.display(), "Config file not found, using defaults");
        AppConfig::default()
    };

    tracing::info!(
        bind_address = %config.server.bind_address,
        store_path = %config.store.path.display(),
        production = config.security.production,
        "Configuration loaded"
    );

    let seed = match &config.store.seed_path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            serde_json::from_slice::<Seed>(&bytes)?
        }
        None => Seed::default(),
    };

    let store = Arc::new(ContentStore::new(config.store.path.clone()));
    store.initialize(seed).await?;

    let limiters = Arc::new(RateLimiters::from_config(&config.rate_limits));
    limiters.spawn_sweepers();

    let state = AppState {
        store,
        limiters,
        config: Arc::new(config),
    };

    let listener = TcpListener::bind(&state.config.server.bind_address).await?;
    let server = HttpServer::new(state);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
