// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the pingback engine and its service.
//!
//! Default values follow the Pingback 1.0 receiver limits: 5 KiB request
//! bodies, 5 KiB fetched pages and a 200-entry anti-abuse memory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the pingback service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Size, time and cache limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Title and excerpt extraction
    #[serde(default)]
    pub excerpt: ExcerptConfig,

    /// Comment collaborator configuration
    #[serde(default)]
    pub comments: CommentsConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Resource bounds for inbound and outbound traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum inbound XML-RPC body in bytes (default: 5120)
    #[serde(default = "default_max_bytes")]
    pub max_body_bytes: usize,

    /// Maximum bytes read from a fetched page or endpoint (default: 5120)
    #[serde(default = "default_max_bytes")]
    pub max_response_bytes: usize,

    /// Deadline for each outbound GET or POST in milliseconds (default: 10000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Entries kept in each anti-abuse set before it is reset (default: 200)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

/// Title and excerpt extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcerptConfig {
    /// Longest title accepted before falling back to the hostname (default: 150)
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: usize,

    /// Excerpt truncation length (default: 300)
    #[serde(default = "default_max_excerpt_chars")]
    pub max_excerpt_chars: usize,

    /// Words captured on each side of the link (default: 10)
    #[serde(default = "default_context_words")]
    pub context_words: usize,
}

/// Settings for the comment collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsConfig {
    /// Directory of published pages (default: ./public)
    #[serde(default = "default_public_directory")]
    pub public_directory: PathBuf,

    /// Public URL under which `public_directory` is served
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    /// Path of the pingback endpoint (default: /pingback)
    #[serde(default = "default_pingback_path")]
    pub pingback_path: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_bytes() -> usize {
    5 * 1024
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_cache_capacity() -> usize {
    200
}

fn default_max_title_chars() -> usize {
    150
}

fn default_max_excerpt_chars() -> usize {
    300
}

fn default_context_words() -> usize {
    10
}

fn default_public_directory() -> PathBuf {
    PathBuf::from("./public")
}

fn default_url_prefix() -> String {
    "http://127.0.0.1:8080/".to_string()
}

fn default_pingback_path() -> String {
    "/pingback".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            limits: LimitsConfig::default(),
            excerpt: ExcerptConfig::default(),
            comments: CommentsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_bytes(),
            max_response_bytes: default_max_bytes(),
            request_timeout_ms: default_request_timeout_ms(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        Self {
            max_title_chars: default_max_title_chars(),
            max_excerpt_chars: default_max_excerpt_chars(),
            context_words: default_context_words(),
        }
    }
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            public_directory: default_public_directory(),
            url_prefix: default_url_prefix(),
            pingback_path: default_pingback_path(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl LimitsConfig {
    /// Get the outbound request deadline
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
