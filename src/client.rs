// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Bounded HTTP client for outbound pingback traffic.
//!
//! Every request asks for `bytes=0-<cap>` and stops reading once the cap is
//! reached, keeping the partial body instead of waiting on a slow or
//! oversized peer. Each request also runs under a wall-clock deadline.

use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, CONTENT_TYPE, RANGE};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Content type of outbound XML-RPC calls.
const CALL_CONTENT_TYPE: &str = "text/xml";

/// A response read up to the byte cap.
#[derive(Debug, Clone)]
pub struct BoundedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Body decoded as UTF-8 (lossy at a truncated code point)
    pub body: String,
    /// True when reading stopped at the cap
    pub truncated: bool,
}

/// HTTP client with a per-response byte cap and a per-request deadline.
#[derive(Clone)]
pub struct BoundedClient {
    client: reqwest::Client,
    max_bytes: usize,
    timeout: Duration,
}

impl BoundedClient {
    /// Create a client from the configured limits.
    pub fn new(limits: &LimitsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pingback-engine/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_bytes: limits.max_response_bytes,
            timeout: limits.request_timeout(),
        })
    }

    /// Issue a GET.
    pub async fn get(&self, url: &Url) -> Result<BoundedResponse> {
        self.request(url, None).await
    }

    /// Issue a POST carrying an XML-RPC body.
    pub async fn post(&self, url: &Url, body: String) -> Result<BoundedResponse> {
        self.request(url, Some(body)).await
    }

    /// GET when `body` is `None`, POST otherwise.
    pub async fn request(&self, url: &Url, body: Option<String>) -> Result<BoundedResponse> {
        let range = format!("bytes=0-{}", self.max_bytes);
        let builder = match body {
            Some(body) => self
                .client
                .post(url.clone())
                .header(CONTENT_TYPE, CALL_CONTENT_TYPE)
                .body(body),
            None => self.client.get(url.clone()),
        }
        .header(RANGE, range);

        tokio::time::timeout(self.timeout, self.read_bounded(builder))
            .await
            .map_err(|_| Error::Timeout(url.to_string()))?
    }

    async fn read_bounded(&self, builder: reqwest::RequestBuilder) -> Result<BoundedResponse> {
        let mut response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        let mut buf: Vec<u8> = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await? {
            buf.extend_from_slice(&chunk);
            if buf.len() >= self.max_bytes {
                // Dropping `response` closes the connection
                buf.truncate(self.max_bytes);
                truncated = true;
                break;
            }
        }

        debug!(
            url = %response.url(),
            status = status.as_u16(),
            bytes = buf.len(),
            truncated,
            "Outbound request complete"
        );

        Ok(BoundedResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&buf).into_owned(),
            truncated,
        })
    }
}
