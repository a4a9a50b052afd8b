// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the pingback service.
//!
//! The pingback endpoint streams the request body into a session and stops
//! reading as soon as the size cap is passed. Published pages are served
//! with an `X-Pingback` header so other sites can discover the endpoint.
//! Stored pingbacks are listed as JSON under `/comments`.

use crate::comments::{CommentStore, Comments};
use crate::config::Config;
use crate::engine::PingbackEngine;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Shared application state.
pub struct AppState {
    pub engine: PingbackEngine,
    pub comments: Comments,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Query of the comment listing.
#[derive(Debug, Default, Deserialize)]
pub struct CommentsQuery {
    /// Only comments on this resource
    pub res: Option<String>,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/comments", get(list_comments))
        .route(&state.config.comments.pingback_path, post(pingback));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.route("/*path", get(public_page))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pingback-engine",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Receive a pingback.
pub async fn pingback(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Body) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let mut session = state.engine.session(content_type);
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                if session.write(&bytes).is_err() {
                    // Stop reading attacker-controlled data
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed reading pingback body");
                session.abort();
                break;
            }
        }
    }
    drop(stream);

    let reply = session.finish().await;
    let mut response = reply.into_response();
    if session.is_aborted() {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}

/// Stored comments, oldest first.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommentsQuery>,
) -> Response {
    match state.comments.store().comments(query.res.as_deref()).await {
        Ok(comments) => Json(comments).into_response(),
        Err(e) => {
            warn!(res = ?query.res, error = %e, "Failed to list comments");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.engine.metrics().render() {
        Ok(text) => text.into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve a published page, advertising the pingback endpoint.
pub async fn public_page(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    if path.split('/').any(|part| part == ".." || part.is_empty()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let file = state.config.comments.public_directory.join(&path);
    let content_type = match file.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    };

    match tokio::fs::read(&file).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::HeaderName::from_static("x-pingback"),
                    state.config.comments.pingback_path.clone(),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            debug!(path = %path, error = %e, "Page not found");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
