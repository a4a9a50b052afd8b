// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for inbound and outbound pingbacks.

use crate::error::{Error, Result};
use crate::fault::FaultCode;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Per-engine metrics registry.
pub struct Metrics {
    registry: Registry,
    inbound: IntCounterVec,
    outbound: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let inbound = IntCounterVec::new(
            Opts::new("pingback_inbound_total", "Inbound pingbacks by outcome"),
            &["outcome"],
        )?;
        let outbound = IntCounterVec::new(
            Opts::new("pingback_outbound_total", "Outbound pingbacks by result"),
            &["result"],
        )?;
        registry.register(Box::new(inbound.clone()))?;
        registry.register(Box::new(outbound.clone()))?;
        Ok(Self {
            registry,
            inbound,
            outbound,
        })
    }

    pub fn inbound_success(&self) {
        self.inbound.with_label_values(&["success"]).inc();
    }

    pub fn inbound_fault(&self, fault: FaultCode) {
        self.inbound
            .with_label_values(&[fault.code().to_string().as_str()])
            .inc();
    }

    pub fn inbound_count(&self, outcome: &str) -> u64 {
        self.inbound.with_label_values(&[outcome]).get()
    }

    /// `result` is one of `sent`, `fault` or `error`.
    pub fn outbound(&self, result: &str) {
        self.outbound.with_label_values(&[result]).inc();
    }

    pub fn outbound_count(&self, result: &str) -> u64 {
        self.outbound.with_label_values(&[result]).get()
    }

    /// Prometheus text exposition of every counter.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::Config(e.to_string()))
    }
}
