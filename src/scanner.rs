// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Link scanner: finds cross-host links in a block of HTML and pings each.

use crate::error::Result;
use crate::sender::{clean_href, PingbackSender, HREF};
use crate::validator::authority;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Called once per completed send with the target and the send result.
pub type ScanCallback = Arc<dyn Fn(Url, Result<Url>) + Send + Sync>;

/// Every distinct link in `text` whose host differs from `source`'s, in
/// document order. Relative links resolve against `source` and are dropped
/// as same-host.
pub fn candidates(text: &str, source: &Url) -> Vec<Url> {
    let source_host = authority(source);
    let mut found: Vec<Url> = Vec::new();

    for caps in HREF.captures_iter(text) {
        let href = clean_href(&caps[1]);
        let Ok(link) = source.join(&href) else {
            debug!(href = %href, "Skipping unparseable link");
            continue;
        };
        let host = authority(&link);
        if host.is_none() || host == source_host {
            continue;
        }
        if !found.contains(&link) {
            found.push(link);
        }
    }
    found
}

impl PingbackSender {
    /// Send a pingback for every candidate link in `text`.
    ///
    /// Each send runs as its own task; none waits on another and this call
    /// returns as soon as they are spawned. `on_complete` (if any) is invoked
    /// once per finished send. Returns the targets that were dispatched.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn scan(&self, text: &str, source: &Url, on_complete: Option<ScanCallback>) -> Vec<Url> {
        let targets = candidates(text, source);
        debug!(source = %source, count = targets.len(), "Dispatching pingbacks");

        for target in &targets {
            let sender = self.clone();
            let source = source.clone();
            let target = target.clone();
            let on_complete = on_complete.clone();
            tokio::spawn(async move {
                let result = sender.send(&target, &source).await;
                if let Some(cb) = on_complete {
                    cb(target, result);
                }
            });
        }
        targets
    }
}
