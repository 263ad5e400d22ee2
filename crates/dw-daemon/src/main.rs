//! dw-daemon entry point.
//!
//! Sets up tracing, loads the persisted state, runs the start-up cycle,
//! spawns the hourly tick and serves the HTTP API. Handlers live in
//! `routes.rs`; shared state in `state.rs`.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use dw_config::{JsonFileStore, ResolvedSecrets, Settings, StateStore};
use dw_daemon::{routes, state};
use dw_runtime::{HttpProviders, ReconcileContext, SystemClock};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let settings = Settings::from_env().context("invalid daemon settings")?;
    let secrets = ResolvedSecrets::from_env();
    info!(?settings, ?secrets, "dw-daemon starting");

    let store = JsonFileStore::new(&settings.state_path);
    let loaded = store
        .load()
        .with_context(|| format!("failed to load state from {}", store.describe()))?;
    for m in &loaded.migrations {
        info!(migration = ?m, "legacy state upgraded");
    }
    if loaded.is_dirty() {
        store.save(&loaded.snapshot).context("failed to save upgraded state")?;
    }

    let ctx = ReconcileContext::new(loaded.snapshot)
        .with_secrets(secrets)
        .with_fetch_timeout(settings.fetch_timeout);
    let shared = Arc::new(state::AppState::new(
        ctx,
        Arc::new(store),
        Arc::new(SystemClock),
        Arc::new(HttpProviders::default()),
    ));

    // A failed start-up cycle is retried on the next tick.
    if let Err(e) = shared.run_cycle(false).await {
        warn!(error = %format!("{e:#}"), "start-up cycle failed");
    }

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));
    state::spawn_hourly_tick(Arc::clone(&shared));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = settings.daemon_addr;
    info!("dw-daemon listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
