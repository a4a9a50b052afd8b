// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Inbound pingback session.
//!
//! A session buffers one request body, runs the receive pipeline once and
//! composes exactly one reply. Once a reply exists the session is closed:
//! further writes are rejected and `finish` returns the same reply.
//!
//! Pipeline after stateless validation:
//! 1. Source already recorded: `ALREADY_REGISTERED`
//! 2. Source already attempted: `ACCESS_DENIED`
//! 3. Source marked as attempted, whatever happens next
//! 4. Acceptance check, if registered
//! 5. Source fetched and verified, source marked as recorded
//! 6. Finalizer, only when no acceptance check is registered

use crate::cache::Seen;
use crate::engine::PingbackEngine;
use crate::error::{Error, Result};
use crate::fault::FaultCode;
use crate::hooks::Accepted;
use crate::validator::{PingbackRequest, ValidationResult};
use crate::xmlrpc::{self, XML_CONTENT_TYPE};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info};
use url::Url;

/// Message carried by every success response.
pub const SUCCESS_MESSAGE: &str = "Pingback successful.";

/// Terminal outcome of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Accepted),
    Fault(FaultCode),
}

/// The HTTP reply for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn fault(fault: FaultCode) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: xmlrpc::fault_response(fault),
        }
    }

    pub fn success() -> Self {
        Self {
            status: StatusCode::OK,
            body: xmlrpc::success_response(SUCCESS_MESSAGE),
        }
    }

    pub fn content_type(&self) -> &'static str {
        XML_CONTENT_TYPE
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
            self.body,
        )
            .into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    /// Body rejected before the pipeline ran
    Aborted,
    Closed,
}

/// One inbound pingback request.
pub struct PingbackSession {
    engine: PingbackEngine,
    content_type: Option<String>,
    body: Vec<u8>,
    state: State,
    aborted: bool,
    request: Option<PingbackRequest>,
    outcome: Option<Outcome>,
    reply: Option<Reply>,
}

impl PingbackSession {
    pub(crate) fn new(engine: PingbackEngine, content_type: Option<&str>) -> Self {
        Self {
            engine,
            content_type: content_type.map(str::to_string),
            body: Vec::new(),
            state: State::Open,
            aborted: false,
            request: None,
            outcome: None,
            reply: None,
        }
    }

    /// Append a chunk of the request body.
    ///
    /// Fails with [`Error::BodyTooLarge`] once the body passes the configured
    /// cap; the caller should stop reading and drop the connection. The
    /// session then answers `GENERAL_ERROR` from [`finish`](Self::finish).
    pub fn write(&mut self, chunk: &[u8]) -> Result<()> {
        if self.state != State::Open {
            return Err(Error::SessionClosed);
        }
        let limit = self.engine.inner.config.limits.max_body_bytes;
        self.body.extend_from_slice(chunk);
        if self.body.len() > limit {
            info!(bytes = self.body.len(), limit, "Pingback body too large, aborting");
            self.body.clear();
            self.state = State::Aborted;
            self.aborted = true;
            return Err(Error::BodyTooLarge { limit });
        }
        Ok(())
    }

    /// Give up on the body, e.g. after a transport error. Answers `GENERAL_ERROR`.
    pub fn abort(&mut self) {
        if self.state == State::Open {
            self.body.clear();
            self.state = State::Aborted;
            self.aborted = true;
        }
    }

    /// True when the body was rejected before it was fully read.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    pub fn source(&self) -> Option<&Url> {
        self.request.as_ref().map(|r| &r.source)
    }

    pub fn target(&self) -> Option<&Url> {
        self.request.as_ref().map(|r| &r.target)
    }

    pub fn title(&self) -> Option<&str> {
        match &self.outcome {
            Some(Outcome::Success(a)) => Some(&a.title),
            _ => None,
        }
    }

    pub fn excerpt(&self) -> Option<&str> {
        match &self.outcome {
            Some(Outcome::Success(a)) => Some(&a.excerpt),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Run the pipeline and return the reply to write.
    pub async fn finish(&mut self) -> Reply {
        if let Some(reply) = &self.reply {
            return reply.clone();
        }
        let outcome = match self.state {
            State::Aborted => Err(FaultCode::GeneralError),
            _ => self.run().await,
        };
        match outcome {
            Ok(accepted) => self.succeed(accepted).await,
            Err(fault) => self.fail(fault).await,
        }
    }

    async fn run(&mut self) -> std::result::Result<Accepted, FaultCode> {
        let inner = self.engine.inner.clone();
        let body = String::from_utf8_lossy(&self.body).into_owned();

        let req = match inner.validator.validate(self.content_type.as_deref(), &body) {
            ValidationResult::Valid(req) => req,
            ValidationResult::Invalid(e) => {
                debug!(error = %e, "Pingback rejected by validator");
                return Err(e.fault());
            }
        };
        self.request = Some(req.clone());

        let source = req.source.as_str();
        match inner.cache.check(source).await {
            Seen::Recorded => return Err(FaultCode::AlreadyRegistered),
            // Retried before the first attempt succeeded
            Seen::Attempted => return Err(FaultCode::AccessDenied),
            Seen::New => {}
        }
        inner.cache.mark_attempted(source).await;

        if let Some(check) = &inner.hooks.acceptance {
            check.accept(&req.source, &req.target).await?;
        }

        let verified = inner.verifier.verify(&req).await?;
        inner.cache.mark_recorded(source).await;

        let accepted = Accepted {
            source: req.source,
            target: req.target,
            title: verified.title,
            excerpt: verified.excerpt,
        };

        if inner.hooks.acceptance.is_none() {
            if let Some(finalizer) = &inner.hooks.finalizer {
                finalizer.finalize(&accepted).await?;
            }
        }
        Ok(accepted)
    }

    async fn succeed(&mut self, accepted: Accepted) -> Reply {
        let inner = self.engine.inner.clone();
        info!(
            source = %accepted.source,
            target = %accepted.target,
            title = %accepted.title,
            "Pingback accepted"
        );
        inner.metrics.inbound_success();
        if let Some(sink) = &inner.hooks.sink {
            sink.on_success(&accepted).await;
        }
        self.close(Outcome::Success(accepted), Reply::success())
    }

    async fn fail(&mut self, fault: FaultCode) -> Reply {
        let inner = self.engine.inner.clone();
        let source = self.request.as_ref().map(|r| r.source.clone());
        info!(
            source = ?source.as_ref().map(Url::as_str),
            code = fault.code(),
            message = fault.message(),
            "Received bad pingback"
        );
        inner.metrics.inbound_fault(fault);
        if let Some(sink) = &inner.hooks.sink {
            sink.on_fault(source.as_ref(), fault).await;
        }
        self.close(Outcome::Fault(fault), Reply::fault(fault))
    }

    fn close(&mut self, outcome: Outcome, reply: Reply) -> Reply {
        self.state = State::Closed;
        self.body = Vec::new();
        self.outcome = Some(outcome);
        self.reply = Some(reply.clone());
        reply
    }
}
