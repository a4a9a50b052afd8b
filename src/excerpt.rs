// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Source page verification and excerpt extraction.
//!
//! The source page is fetched under the bounded client, checked for the
//! literal target URI, and reduced to a short plain-text window around the
//! link. Markup stripping is pattern based and deliberately crude.

use crate::client::BoundedClient;
use crate::config::ExcerptConfig;
use crate::error::{Error, Result};
use crate::fault::FaultCode;
use crate::validator::PingbackRequest;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

/// Private marker placed around the link text.
const MARK: &str = "##";

lazy_static! {
    static ref TITLE: Regex = Regex::new(r"(?i)<title>([^<]+)</title>").unwrap(/* known good */);
    static ref MARKUP: Regex = Regex::new(r"<[^>]+>|&[^\s]+;").unwrap(/* known good */);
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap(/* known good */);
}

/// Title and excerpt of a verified source page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub title: String,
    pub excerpt: String,
}

/// Pure title/excerpt extraction over an already fetched page.
#[derive(Debug, Clone)]
pub struct ExcerptExtractor {
    config: ExcerptConfig,
    window: Regex,
}

impl ExcerptExtractor {
    pub fn new(config: ExcerptConfig) -> Result<Self> {
        let n = config.context_words;
        let window = Regex::new(&format!(
            r"((?:\S+\s+){{0,{n}}}){MARK}([\s\S]+?){MARK}((?:\s+\S+){{0,{n}}})"
        ))
        .map_err(|e| Error::Config(format!("excerpt window: {e}")))?;
        Ok(Self { config, window })
    }

    /// Page title, or the source hostname when missing or too long.
    pub fn title(&self, body: &str, source: &Url) -> String {
        TITLE
            .captures(body)
            .map(|caps| caps[1].trim().to_string())
            .filter(|t| !t.is_empty() && t.chars().count() <= self.config.max_title_chars)
            .unwrap_or_else(|| source.host_str().unwrap_or_default().to_string())
    }

    /// Plain-text window of words around the anchor that links to `target`.
    pub fn excerpt(&self, body: &str, target: &Url) -> std::result::Result<String, FaultCode> {
        let href = target.as_str();
        if !body.contains(href) {
            return Err(FaultCode::NoLinkToTarget);
        }

        let anchor = Regex::new(&format!(
            r"(?i)<a[^>]+{}[^>]+>([\s\S]+?)</a>",
            regex::escape(href)
        ))
        .map_err(|_| FaultCode::NoLinkToTarget)?;

        let text = body.replace(MARK, "");
        let text = anchor.replace_all(&text, format!("{MARK}${{1}}{MARK}").as_str());
        let text = MARKUP.replace_all(&text, "");

        let caps = self.window.captures(&text).ok_or(FaultCode::NoLinkToTarget)?;
        let joined = [&caps[1], &caps[2], &caps[3]].join(" ");
        let collapsed = WHITESPACE.replace_all(&joined, " ");
        let truncated: String = collapsed.chars().take(self.config.max_excerpt_chars).collect();
        Ok(truncated.trim().to_string())
    }

    /// Title, link check and excerpt in one pass.
    pub fn extract(
        &self,
        body: &str,
        source: &Url,
        target: &Url,
    ) -> std::result::Result<Verified, FaultCode> {
        let title = self.title(body, source);
        let excerpt = self.excerpt(body, target)?;
        Ok(Verified { title, excerpt })
    }
}

/// Fetches a source page and confirms it links to the target.
#[derive(Clone)]
pub struct ExcerptVerifier {
    client: BoundedClient,
    extractor: ExcerptExtractor,
}

impl ExcerptVerifier {
    pub fn new(client: BoundedClient, extractor: ExcerptExtractor) -> Self {
        Self { client, extractor }
    }

    /// Verify `req`, returning the page title and excerpt or the fault to send.
    pub async fn verify(&self, req: &PingbackRequest) -> std::result::Result<Verified, FaultCode> {
        let page = match self.client.get(&req.source).await {
            Ok(page) if page.status.is_success() && !page.body.is_empty() => page,
            Ok(page) => {
                info!(source = %req.source, status = page.status.as_u16(), "Source returned nothing usable");
                return Err(FaultCode::SourceDoesNotExist);
            }
            Err(e) => {
                info!(source = %req.source, error = %e, "Source fetch failed");
                return Err(FaultCode::SourceDoesNotExist);
            }
        };

        let verified = self.extractor.extract(&page.body, &req.source, &req.target)?;
        debug!(
            source = %req.source,
            title = %verified.title,
            excerpt_chars = verified.excerpt.chars().count(),
            "Source verified"
        );
        Ok(verified)
    }
}
