// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Throwaway HTTP peers bound to loopback.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use pingback_engine::{config::Config, fault::FaultCode, xmlrpc};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Serve `app` on an ephemeral loopback port.
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Serve the router built for the address it will listen on.
pub async fn spawn_with(build: impl FnOnce(SocketAddr) -> Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build(addr);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A fresh directory of published pages.
pub fn public_dir(name: &str, pages: &[(&str, &str)]) -> std::path::PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "pingback-{}-{}-{}",
        std::process::id(),
        name,
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    for (file, body) in pages {
        std::fs::write(dir.join(file), body).unwrap();
    }
    dir
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Engine configuration suited to loopback tests.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.limits.request_timeout_ms = 5_000;
    config
}

/// One recorded request.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Scripted page: path, extra headers, body.
#[derive(Debug, Clone)]
pub struct Page {
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Page {
    pub fn html(path: &str, body: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// How a scripted site answers POSTs.
#[derive(Debug, Clone, Copy)]
pub enum RpcReply {
    Success,
    Fault(FaultCode),
    Raw(&'static str),
}

#[derive(Clone)]
struct SiteState {
    pages: Arc<Vec<Page>>,
    rpc: RpcReply,
    delay: Duration,
    hits: Arc<Mutex<Vec<Hit>>>,
}

/// A scripted site: serves `pages` on GET, answers any POST with `rpc`,
/// and records every request.
pub struct Site {
    pub addr: SocketAddr,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl Site {
    pub async fn start(pages: Vec<Page>, rpc: RpcReply) -> Self {
        Self::start_delayed(pages, rpc, Duration::ZERO).await
    }

    pub async fn start_delayed(pages: Vec<Page>, rpc: RpcReply, delay: Duration) -> Self {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let state = SiteState {
            pages: Arc::new(pages),
            rpc,
            delay,
            hits: hits.clone(),
        };
        let app = Router::new().fallback(handle).with_state(state);
        let addr = spawn(app).await;
        Self { addr, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn hits(&self) -> Vec<Hit> {
        self.hits.lock().await.clone()
    }

    pub async fn posts(&self) -> Vec<Hit> {
        self.hits()
            .await
            .into_iter()
            .filter(|h| h.method == "POST")
            .collect()
    }
}

async fn handle(
    State(state): State<SiteState>,
    method: axum::http::Method,
    uri: Uri,
    _headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    state.hits.lock().await.push(Hit {
        method: method.to_string(),
        path: path.clone(),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    if method == axum::http::Method::POST {
        let body = match state.rpc {
            RpcReply::Success => xmlrpc::success_response("Pingback registered."),
            RpcReply::Fault(fault) => xmlrpc::fault_response(fault),
            RpcReply::Raw(body) => body.to_string(),
        };
        return (StatusCode::OK, [(header::CONTENT_TYPE, "text/xml")], body).into_response();
    }

    match state.pages.iter().find(|p| p.path == path || p.path == uri.path()) {
        Some(page) => {
            let mut response = page.body.clone().into_response();
            for (name, value) in &page.headers {
                response.headers_mut().insert(
                    axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                    axum::http::HeaderValue::from_str(value).unwrap(),
                );
            }
            response
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
