// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound pingbacks.
//!
//! Discovery prefers the `X-Pingback` response header and falls back to the
//! first `<link rel="pingback">` in the target page. A host-relative endpoint
//! is resolved against the target's scheme and host.

use crate::client::BoundedClient;
use crate::error::{Error, Result};
use crate::fault::FaultCode;
use crate::metrics::Metrics;
use crate::xmlrpc;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Header advertising a pingback endpoint.
pub const X_PINGBACK: &str = "x-pingback";

lazy_static! {
    static ref PINGBACK_LINK: Regex = Regex::new(r"(?i)<link[^>]+pingback[^>]*>").unwrap(/* known good */);
    pub(crate) static ref HREF: Regex =
        Regex::new(r#"(?i)href\s*=\s*["']?([^"'\s>]+)"#).unwrap(/* known good */);
}

/// Clean an attribute value: drop quotes, decode `&amp;`, trim.
pub(crate) fn clean_href(raw: &str) -> String {
    xmlrpc::decode_amp(&raw.replace(['"', '\''], ""))
        .trim()
        .to_string()
}

/// Locate the pingback endpoint advertised by a fetched target page.
pub fn endpoint_from_page(headers: &HeaderMap, body: &str, target: &Url) -> Option<Url> {
    let advertised = headers
        .get(X_PINGBACK)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            let link = PINGBACK_LINK.find(body)?;
            let caps = HREF.captures(link.as_str())?;
            Some(clean_href(&caps[1]))
        })?;

    if advertised.contains("//") {
        return Url::parse(&advertised).ok();
    }

    // Host-relative: anchor at the target's root
    let host = target.host_str()?;
    let authority = match target.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let path = advertised.strip_prefix('/').unwrap_or(&advertised);
    Url::parse(&format!("{}://{}/{}", target.scheme(), authority, path)).ok()
}

/// Discovers pingback endpoints and posts `pingback.ping` calls.
#[derive(Clone)]
pub struct PingbackSender {
    client: BoundedClient,
    metrics: Arc<Metrics>,
}

impl PingbackSender {
    pub fn new(client: BoundedClient, metrics: Arc<Metrics>) -> Self {
        Self { client, metrics }
    }

    /// Fetch `target` and find its pingback endpoint.
    pub async fn discover(&self, target: &Url) -> Result<Url> {
        let page = self.client.get(target).await?;
        let endpoint =
            endpoint_from_page(&page.headers, &page.body, target).ok_or(Error::NoPingbackUri)?;
        debug!(target = %target, endpoint = %endpoint, "Discovered pingback endpoint");
        Ok(endpoint)
    }

    /// Notify `target` that `source` links to it. Returns the endpoint used.
    pub async fn send(&self, target: &Url, source: &Url) -> Result<Url> {
        let result = self.try_send(target, source).await;
        match &result {
            Ok(endpoint) => {
                info!(source = %source, target = %target, endpoint = %endpoint, "Pingback sent");
                self.metrics.outbound("sent");
            }
            Err(Error::Remote { code, message }) => {
                match FaultCode::try_from(*code) {
                    Ok(fault) => {
                        info!(source = %source, target = %target, code, fault = ?fault, message = %message, "Pingback refused")
                    }
                    Err(e) => {
                        info!(source = %source, target = %target, code, message = %message, error = %e, "Pingback refused")
                    }
                }
                self.metrics.outbound("fault");
            }
            Err(e) => {
                warn!(source = %source, target = %target, error = %e, "Pingback failed");
                self.metrics.outbound("error");
            }
        }
        result
    }

    async fn try_send(&self, target: &Url, source: &Url) -> Result<Url> {
        let endpoint = self.discover(target).await?;
        let call = xmlrpc::method_call(source.as_str(), target.as_str());
        let response = self.client.post(&endpoint, call).await?;

        if let Some((code, message)) = xmlrpc::parse_fault(&response.body) {
            return Err(Error::Remote { code, message });
        }
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn target() -> Url {
        Url::parse("http://b.example:8081/posts/1").unwrap()
    }

    #[test]
    fn test_header_wins_over_link() {
        let mut headers = HeaderMap::new();
        headers.insert(X_PINGBACK, HeaderValue::from_static("http://b.example/xmlrpc"));
        let body = r#"<link rel="pingback" href="http://elsewhere.example/rpc">"#;
        assert_eq!(
            endpoint_from_page(&headers, body, &target()).unwrap().as_str(),
            "http://b.example/xmlrpc"
        );
    }

    #[test]
    fn test_link_tag_fallback() {
        let body = r#"<html><head>
<link rel="stylesheet" href="/style.css">
<link rel="pingback" href="http://b.example/rpc.php?a=1&amp;b=2" />
</head></html>"#;
        assert_eq!(
            endpoint_from_page(&HeaderMap::new(), body, &target()).unwrap().as_str(),
            "http://b.example/rpc.php?a=1&b=2"
        );
    }

    #[test]
    fn test_relative_endpoint_resolved_against_target() {
        let mut headers = HeaderMap::new();
        headers.insert(X_PINGBACK, HeaderValue::from_static("/pingback"));
        assert_eq!(
            endpoint_from_page(&headers, "", &target()).unwrap().as_str(),
            "http://b.example:8081/pingback"
        );

        let body = "<link href='xmlrpc.php' rel='pingback'>";
        assert_eq!(
            endpoint_from_page(&HeaderMap::new(), body, &target()).unwrap().as_str(),
            "http://b.example:8081/xmlrpc.php"
        );
    }

    #[test]
    fn test_no_endpoint() {
        assert!(endpoint_from_page(&HeaderMap::new(), "<html></html>", &target()).is_none());
    }
}
