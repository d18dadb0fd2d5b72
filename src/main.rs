use anyhow::Context;
use config::{Config, StoreCredentials};
use log::{LevelFilter, error, info};
use std::{net::SocketAddr, process::exit, sync::Arc};
use store::{SharedStore, postgrest::PostgrestStore};
use tokio::signal;

mod config;
mod http;
mod store;
mod utils;

/// The server version extracted from the Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    // Values from a .env file are only used when not already set
    _ = dotenvy::dotenv();

    let config = match config::load_config() {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Failed to load config: {err}");
            exit(1);
        }
    };

    let logging = config.logging;
    utils::logging::setup(logging);

    info!("Starting sensor relay v{VERSION}");

    if let Err(err) = run(config).await {
        match FailureOutput::for_level(logging) {
            FailureOutput::Logger => error!("{err:?}"),
            FailureOutput::Stderr => eprintln!("{err:#}"),
        }
        exit(1);
    }
}

/// Where a startup failure is reported, exactly one is used so the
/// failure isn't printed twice
#[derive(Debug, PartialEq, Eq)]
enum FailureOutput {
    Logger,
    /// Logger was never initialized
    Stderr,
}

impl FailureOutput {
    fn for_level(logging: LevelFilter) -> Self {
        if logging == LevelFilter::Off {
            Self::Stderr
        } else {
            Self::Logger
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let credentials = StoreCredentials::from_env().context("Store is not configured")?;
    let store = PostgrestStore::new(&credentials, &config.store)
        .context("Failed to create store client")?;
    let store: SharedStore = Arc::new(store);

    info!("Using store at {}", credentials.url);

    let cors = http::cors_layer(&config.cors).context("Invalid CORS configuration")?;
    let router = http::routes::router(store, cors, config.reverse_proxy);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {addr}"))?;

    info!("Listening on {addr}");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        _ = signal::ctrl_c().await;
    })
    .await
    .context("Error while running server")?;

    info!("Server stopped");
    Ok(())
}
