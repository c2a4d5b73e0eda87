//! # Kham Server
//!
//! Progress and leaderboard backend for the Kham vocabulary game.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kham_server::{metrics, AppState, Config, DocumentStore, TokenIssuer};

const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,kham_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kham_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing();

    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {}", e))?;
    tracing::info!("Prometheus metrics initialized");

    let lexicon = Arc::new(config.load_lexicon()?);
    tracing::info!(levels = lexicon.level_count(), "Lexicon loaded");

    let store = match &config.data_dir {
        Some(dir) => DocumentStore::with_data_dir(dir)?,
        None => {
            tracing::warn!("No data directory configured; documents are kept in memory only");
            DocumentStore::new()
        }
    };

    let state = AppState::new(store, lexicon, config.token_ttl()).with_metrics(metrics_handle);
    spawn_token_purge(state.tokens.clone());
    let app = kham_server::app(state, &config.allowed_origins);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        origins = ?config.allowed_origins,
        token_ttl_days = config.token_ttl_days,
        "Kham server listening on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Kham server stopped");
    Ok(())
}

fn spawn_token_purge(tokens: TokenIssuer) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = tokens.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Expired tokens removed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
