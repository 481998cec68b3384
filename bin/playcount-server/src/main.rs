//! playcount-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Open the SQLite database and run pending migrations.
//! 4. Build the osu! API client and the tracker.
//! 5. Start the tracking scheduler in a background task.
//! 6. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod error;
mod fetcher;
mod middleware;
mod routes;
mod scheduler;
mod schemas;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use playcount_core::Store;
use playcount_osuapi::OsuClient;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::fetcher::OsuFetcher;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: PLAYCOUNT_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "playcount-server starting");

    // ── 3. Database ────────────────────────────────────────────────────────────
    let store = Store::connect(&cfg.database_url).await?;
    info!(database_url = %cfg.database_url, "database ready");

    // ── 4. osu! API client ─────────────────────────────────────────────────────
    if cfg.osu_api_token.is_empty() {
        warn!("PLAYCOUNT_OSU_API_TOKEN is not set; osu! API requests will be unauthenticated");
    }
    let client = OsuClient::builder()
        .base_url(cfg.osu_api_url.clone())
        .token(cfg.osu_api_token.clone())
        .retry_count(cfg.api_retries)
        .build()?;

    let state = Arc::new(AppState::new(cfg.clone(), store, OsuFetcher::new(client)));

    // ── 5. Scheduler ───────────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = match cfg.track_interval() {
        Some(interval) => Some(tokio::spawn(scheduler::run(
            Arc::clone(&state.tracker),
            interval,
            shutdown_rx,
        ))),
        None => {
            info!("scheduled tracking disabled");
            None
        }
    };

    // ── 6. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // A pass in flight runs to completion before the scheduler stops.
    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler {
        if let Err(e) = handle.await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
    }

    info!("playcount-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
