// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Pingback Service
//!
//! Receives Pingback 1.0 notifications for the pages it publishes, stores
//! verified pingbacks as comments, and can ping the pages it links to.
//!
//! ## Configuration
//!
//! Configuration is read from the JSON file named by `CONFIG_FILE` (if
//! set), then overridden by environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `PUBLIC_DIR`: Directory of published pages (default: ./public)
//! - `URL_PREFIX`: Public URL of `PUBLIC_DIR` (default: http://127.0.0.1:8080/)
//! - `REQUEST_TIMEOUT_MS`: Deadline for outbound requests (default: 10000)
//! - `CACHE_CAPACITY`: Anti-abuse cache size per set (default: 200)
//! - `METRICS_ENABLED`: Expose `/metrics` (default: true)
//!
//! On startup every page in `PUBLIC_DIR` becomes a comment resource. Pages
//! listed in `SEND_PINGBACKS` (comma separated) are scanned and their
//! outbound links pinged. Stored pingbacks are listed at `/comments`.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pingback_engine::{
    comments::{Comments, MemoryCommentStore},
    config::Config,
    handlers::{router, AppState},
    hooks::PingbackHooks,
    PingbackEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = load_config()?;
    info!(
        bind_addr = %config.bind_addr,
        url_prefix = %config.comments.url_prefix,
        public_directory = %config.comments.public_directory.display(),
        cache_capacity = config.limits.cache_capacity,
        "Starting pingback service"
    );

    let store = Arc::new(MemoryCommentStore::new());
    register_pages(&store, &config).await;

    let comments = Comments::new(store, config.comments.clone())?;
    let hooks = PingbackHooks::new()
        .with_acceptance(Arc::new(comments.clone()))
        .with_sink(Arc::new(comments.clone()));
    let engine = PingbackEngine::new(config.clone(), hooks)?;

    let state = Arc::new(AppState {
        engine: engine.clone(),
        comments: comments.clone(),
        config: config.clone(),
    });
    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    if let Ok(pages) = std::env::var("SEND_PINGBACKS") {
        let sender = engine.sender().clone();
        tokio::spawn(async move {
            for page in pages.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                match comments.send_pingbacks(&sender, page).await {
                    Ok(results) => {
                        let sent = results.iter().filter(|(_, r)| r.is_ok()).count();
                        info!(page, sent, attempted = results.len(), "Sent pingbacks");
                    }
                    Err(e) => warn!(page, error = %e, "Could not send pingbacks"),
                }
            }
        });
    }

    axum::serve(listener, app).await?;

    Ok(())
}

/// Register every file in the public directory as a comment resource.
async fn register_pages(store: &MemoryCommentStore, config: &Config) {
    match store
        .register_directory(&config.comments.public_directory)
        .await
    {
        Ok(count) => info!(count, "Registered comment resources"),
        Err(e) => warn!(error = %e, "Public directory unreadable, no resources registered"),
    }
}

/// Load configuration from `CONFIG_FILE` and environment variables.
fn load_config() -> anyhow::Result<Config> {
    let defaults = match std::env::var("CONFIG_FILE") {
        Ok(path) => serde_json::from_str(&std::fs::read_to_string(&path)?)?,
        Err(_) => Config::default(),
    };
    Ok(Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        limits: pingback_engine::config::LimitsConfig {
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.limits.request_timeout_ms),
            cache_capacity: std::env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.limits.cache_capacity),
            ..defaults.limits
        },
        comments: pingback_engine::config::CommentsConfig {
            public_directory: std::env::var("PUBLIC_DIR")
                .map(Into::into)
                .unwrap_or(defaults.comments.public_directory),
            url_prefix: std::env::var("URL_PREFIX").unwrap_or(defaults.comments.url_prefix),
            ..defaults.comments
        },
        metrics: pingback_engine::config::MetricsConfig {
            enabled: std::env::var("METRICS_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.metrics.enabled),
            ..defaults.metrics
        },
        ..defaults
    })
}
