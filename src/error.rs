// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Local and transport error types.
//!
//! Protocol faults are [`crate::fault::FaultCode`] values; the errors here are
//! reported to the immediate caller only.

use thiserror::Error;

/// Errors raised while fetching, sending or configuring.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No pingback URI.")]
    NoPingbackUri,

    #[error("Remote fault {code}: {message}")]
    Remote { code: i32, message: String },

    #[error("Body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Unknown fault code: {0}")]
    UnknownFaultCode(i32),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
