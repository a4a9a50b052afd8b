// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Inbound pingback request validator.
//!
//! Implements the stateless part of the receive pipeline, in order:
//! - Content-Type must be some flavour of XML
//! - Body must name `pingback.ping`
//! - First two string parameters must parse as source and target URIs
//! - Self-ping blocking (same host, including port)
//! - Source must have a host
//! - Target must have a host and a path or query that can identify a post
//!
//! The first failure wins. Each failure maps onto one protocol fault code.

use crate::fault::FaultCode;
use crate::xmlrpc::{self, PING_METHOD};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid Content-Type: expected an XML media type, got {actual:?}")]
    InvalidContentType { actual: Option<String> },

    #[error("Empty request body")]
    EmptyBody,

    #[error("Body does not call pingback.ping")]
    MethodNotFound,

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid URL format for {param}: {url}")]
    InvalidUrl { param: &'static str, url: String },

    #[error("Self-ping blocked: source and target share host {host}")]
    SelfPingBlocked { host: String },

    #[error("Source has no host: {url}")]
    SourceWithoutHost { url: String },

    #[error("Target cannot identify a resource: {url}")]
    UnusableTarget { url: String },
}

impl ValidationError {
    /// Fault code sent back to the peer.
    pub fn fault(&self) -> FaultCode {
        match self {
            Self::InvalidContentType { .. } | Self::EmptyBody => FaultCode::GeneralError,
            Self::MethodNotFound => FaultCode::MethodNotFound,
            Self::MissingParameter(_) | Self::InvalidUrl { .. } | Self::SourceWithoutHost { .. } => {
                FaultCode::SourceDoesNotExist
            }
            Self::SelfPingBlocked { .. } | Self::UnusableTarget { .. } => {
                FaultCode::TargetCannotBeUsed
            }
        }
    }
}

/// A syntactically valid pingback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingbackRequest {
    pub source: Url,
    pub target: Url,
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Request is valid
    Valid(PingbackRequest),
    /// Request is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<PingbackRequest, ValidationError> {
        match self {
            ValidationResult::Valid(req) => Ok(req),
            ValidationResult::Invalid(e) => Err(e),
        }
    }
}

/// `host[:port]` of a URL, as used for same-host comparisons.
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Stateless pingback request validator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PingbackValidator;

impl PingbackValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate the Content-Type header.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> Result<(), ValidationError> {
        // Extract just the media type, ignoring charset etc.
        let ct = content_type.map(|s| s.split(';').next().unwrap_or(s).trim().to_lowercase());

        match &ct {
            Some(actual) if actual.ends_with("xml") => Ok(()),
            _ => {
                debug!(content_type = ?ct, "Content-Type invalid");
                Err(ValidationError::InvalidContentType { actual: ct })
            }
        }
    }

    /// Validate the extracted source and target parameters.
    pub fn validate_source_target(
        &self,
        source: Option<&str>,
        target: Option<&str>,
    ) -> ValidationResult {
        let source_url = match parse_param("source", source) {
            Ok(u) => u,
            Err(e) => return ValidationResult::Invalid(e),
        };
        let target_url = match parse_param("target", target) {
            Ok(u) => u,
            Err(e) => return ValidationResult::Invalid(e),
        };

        let source_host = authority(&source_url);
        let target_host = authority(&target_url);

        // A resource cannot ping itself
        if source_host == target_host {
            debug!(source = %source_url, target = %target_url, "Self-ping detected");
            return ValidationResult::Invalid(ValidationError::SelfPingBlocked {
                host: source_host.unwrap_or_default(),
            });
        }

        if source_host.is_none() {
            debug!(source = %source_url, "Source has no host");
            return ValidationResult::Invalid(ValidationError::SourceWithoutHost {
                url: source_url.to_string(),
            });
        }

        // The post id lives in the path or the query string
        let path = target_url.path();
        let query = target_url.query().filter(|q| !q.is_empty());
        let no_post_id = path.len() < 2 && query.is_none();
        if target_host.is_none() || no_post_id {
            debug!(target = %target_url, "Target cannot identify a resource");
            return ValidationResult::Invalid(ValidationError::UnusableTarget {
                url: target_url.to_string(),
            });
        }

        debug!(source = %source_url, target = %target_url, "Source/target valid");
        ValidationResult::Valid(PingbackRequest {
            source: source_url,
            target: target_url,
        })
    }

    /// Validate a complete buffered pingback request.
    pub fn validate(&self, content_type: Option<&str>, body: &str) -> ValidationResult {
        if let Err(e) = self.validate_content_type(content_type) {
            return ValidationResult::Invalid(e);
        }
        if body.is_empty() {
            return ValidationResult::Invalid(ValidationError::EmptyBody);
        }

        if !body.contains(PING_METHOD) {
            debug!("Body does not name the pingback method");
            return ValidationResult::Invalid(ValidationError::MethodNotFound);
        }

        // Positional: first string is the source, second the target
        let params = xmlrpc::string_params(body);
        self.validate_source_target(
            params.first().map(String::as_str),
            params.get(1).map(String::as_str),
        )
    }
}

fn parse_param(param: &'static str, value: Option<&str>) -> Result<Url, ValidationError> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            debug!(param, "Missing parameter");
            return Err(ValidationError::MissingParameter(param));
        }
    };
    Url::parse(value).map_err(|_| {
        debug!(param, url = %value, "Invalid URL format");
        ValidationError::InvalidUrl {
            param,
            url: value.to_string(),
        }
    })
}
