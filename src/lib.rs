// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Pingback Engine
//!
//! This crate implements both sides of the Pingback 1.0 protocol:
//!
//! - Receiving: bounded body buffering, XML-RPC parameter extraction,
//!   self-ping and root-target blocking, duplicate and retry suppression,
//!   source verification with title and excerpt extraction
//! - Sending: endpoint discovery via `X-Pingback` or `<link rel="pingback">`,
//!   `pingback.ping` calls, remote fault parsing
//! - Scanning: one fire-and-forget send per cross-host link in a page
//!
//! Storage is left to a collaborator plugged in through [`hooks`]; an
//! in-memory comment store is provided in [`comments`].

pub mod cache;
pub mod client;
pub mod comments;
pub mod config;
pub mod engine;
pub mod error;
pub mod excerpt;
pub mod fault;
pub mod handlers;
pub mod hooks;
pub mod metrics;
pub mod scanner;
pub mod sender;
pub mod session;
pub mod validator;
pub mod xmlrpc;

pub use cache::AntiAbuseCache;
pub use config::Config;
pub use engine::PingbackEngine;
pub use error::{Error, Result};
pub use fault::FaultCode;
pub use hooks::{Accepted, AcceptanceCheck, Finalizer, OutcomeSink, PingbackHooks};
pub use session::{Outcome, PingbackSession, Reply};
pub use validator::{PingbackRequest, PingbackValidator, ValidationResult};
