// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Extension points for the application that owns the pingback targets.
//!
//! Two ways of wiring a collaborator are supported:
//!
//! 1. **Acceptance check**: consulted after validation and before the source
//!    is fetched. Accepted pingbacks are reported to the [`OutcomeSink`].
//! 2. **Finalizer**: consulted only after the source has been verified, for
//!    collaborators that prefer to check and persist in one step.
//!
//! When an acceptance check is registered the finalizer is not called.

use crate::fault::FaultCode;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// A verified pingback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub source: Url,
    pub target: Url,
    pub title: String,
    pub excerpt: String,
}

/// Veto a pingback before the source page is fetched.
#[async_trait]
pub trait AcceptanceCheck: Send + Sync {
    /// `Ok(())` to continue, or the fault to answer with.
    async fn accept(&self, source: &Url, target: &Url) -> Result<(), FaultCode>;
}

/// Check and persist a verified pingback when no acceptance check is set.
#[async_trait]
pub trait Finalizer: Send + Sync {
    async fn finalize(&self, accepted: &Accepted) -> Result<(), FaultCode>;
}

/// Observe the outcome of every session.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    async fn on_success(&self, accepted: &Accepted);

    async fn on_fault(&self, _source: Option<&Url>, _fault: FaultCode) {}
}

/// Collaborators registered with an engine.
#[derive(Clone, Default)]
pub struct PingbackHooks {
    pub acceptance: Option<Arc<dyn AcceptanceCheck>>,
    pub finalizer: Option<Arc<dyn Finalizer>>,
    pub sink: Option<Arc<dyn OutcomeSink>>,
}

impl PingbackHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_acceptance(mut self, check: Arc<dyn AcceptanceCheck>) -> Self {
        self.acceptance = Some(check);
        self
    }

    pub fn with_finalizer(mut self, finalizer: Arc<dyn Finalizer>) -> Self {
        self.finalizer = Some(finalizer);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn OutcomeSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}
