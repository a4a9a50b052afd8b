// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The pingback engine: shared state behind every inbound session and every
//! outbound send.

use crate::cache::AntiAbuseCache;
use crate::client::BoundedClient;
use crate::config::Config;
use crate::error::Result;
use crate::excerpt::{ExcerptExtractor, ExcerptVerifier};
use crate::hooks::PingbackHooks;
use crate::metrics::Metrics;
use crate::scanner::ScanCallback;
use crate::sender::PingbackSender;
use crate::session::{PingbackSession, Reply};
use crate::validator::PingbackValidator;
use std::sync::Arc;
use url::Url;

pub(crate) struct Inner {
    pub(crate) config: Config,
    pub(crate) validator: PingbackValidator,
    pub(crate) cache: AntiAbuseCache,
    pub(crate) verifier: ExcerptVerifier,
    pub(crate) sender: PingbackSender,
    pub(crate) hooks: PingbackHooks,
    pub(crate) metrics: Arc<Metrics>,
}

/// Cheaply cloneable handle to one engine instance.
#[derive(Clone)]
pub struct PingbackEngine {
    pub(crate) inner: Arc<Inner>,
}

impl PingbackEngine {
    /// Create an engine with its own anti-abuse cache.
    pub fn new(config: Config, hooks: PingbackHooks) -> Result<Self> {
        let cache = AntiAbuseCache::new(config.limits.cache_capacity);
        Self::with_cache(config, hooks, cache)
    }

    /// Create an engine sharing an existing anti-abuse cache.
    pub fn with_cache(config: Config, hooks: PingbackHooks, cache: AntiAbuseCache) -> Result<Self> {
        let client = BoundedClient::new(&config.limits)?;
        let metrics = Arc::new(Metrics::new()?);
        let extractor = ExcerptExtractor::new(config.excerpt.clone())?;
        Ok(Self {
            inner: Arc::new(Inner {
                validator: PingbackValidator::new(),
                cache,
                verifier: ExcerptVerifier::new(client.clone(), extractor),
                sender: PingbackSender::new(client, metrics.clone()),
                hooks,
                metrics,
                config,
            }),
        })
    }

    /// Open a session for one inbound request.
    pub fn session(&self, content_type: Option<&str>) -> PingbackSession {
        PingbackSession::new(self.clone(), content_type)
    }

    /// Handle a fully buffered request body.
    pub async fn receive(&self, content_type: Option<&str>, body: &[u8]) -> Reply {
        let mut session = self.session(content_type);
        // An oversized body closes the session; finish reports the fault
        let _ = session.write(body);
        session.finish().await
    }

    /// Discover `target`'s endpoint and ping it on behalf of `source`.
    pub async fn send(&self, target: &Url, source: &Url) -> Result<Url> {
        self.inner.sender.send(target, source).await
    }

    /// Ping every cross-host link in `text`. See [`PingbackSender::scan`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn scan(&self, text: &str, source: &Url, on_complete: Option<ScanCallback>) -> Vec<Url> {
        self.inner.sender.scan(text, source, on_complete)
    }

    pub fn sender(&self) -> &PingbackSender {
        &self.inner.sender
    }

    pub fn cache(&self) -> &AntiAbuseCache {
        &self.inner.cache
    }

    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
