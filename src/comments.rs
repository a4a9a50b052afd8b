// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Comment collaborator.
//!
//! Pages published under `url_prefix` are comment resources, keyed by their
//! path relative to the prefix. Accepted pingbacks are stored as comments on
//! the target resource, and pages can be scanned to ping whatever they link
//! to.

use crate::config::CommentsConfig;
use crate::error::{Error, Result};
use crate::fault::FaultCode;
use crate::hooks::{Accepted, AcceptanceCheck, Finalizer, OutcomeSink};
use crate::scanner::ScanCallback;
use crate::sender::PingbackSender;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use url::Url;

/// A comment attached to a resource. Pingbacks are stored as comments whose
/// author is the source page title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    /// Resource the comment belongs to
    pub res: String,
    pub author: String,
    pub website: String,
    pub message: String,
    pub created: DateTime<Utc>,
}

/// Storage backing the comment collaborator.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn resource_exists(&self, res: &str) -> Result<bool>;

    async fn has_pingback(&self, res: &str, source: &str) -> Result<bool>;

    /// Persist `comment`, assigning its id.
    async fn save_comment(&self, comment: Comment) -> Result<Comment>;

    /// Comments on `res` (or on every resource), oldest first.
    async fn comments(&self, res: Option<&str>) -> Result<Vec<Comment>>;

    async fn count(&self, res: Option<&str>) -> Result<usize> {
        Ok(self.comments(res).await?.len())
    }
}

/// In-process comment store.
#[derive(Default)]
pub struct MemoryCommentStore {
    resources: RwLock<HashSet<String>>,
    comments: RwLock<Vec<Comment>>,
    next_id: AtomicU64,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource that may receive comments.
    pub async fn add_resource(&self, res: &str) {
        self.resources.write().await.insert(res.to_string());
    }

    /// Register every file name in `dir` as a resource. A failed entry read
    /// stops the walk; the count registered so far is returned.
    pub async fn register_directory(&self, dir: &Path) -> Result<usize> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut registered = 0;
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    if let Some(name) = entry.file_name().to_str() {
                        self.add_resource(name).await;
                        registered += 1;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %dir.display(), registered, error = %e, "Directory read failed, registration stopped");
                    break;
                }
            }
        }
        Ok(registered)
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn resource_exists(&self, res: &str) -> Result<bool> {
        Ok(self.resources.read().await.contains(res))
    }

    async fn has_pingback(&self, res: &str, source: &str) -> Result<bool> {
        Ok(self
            .comments
            .read()
            .await
            .iter()
            .any(|c| c.res == res && c.website == source))
    }

    async fn save_comment(&self, mut comment: Comment) -> Result<Comment> {
        comment.id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.comments.write().await.push(comment.clone());
        Ok(comment)
    }

    async fn comments(&self, res: Option<&str>) -> Result<Vec<Comment>> {
        let mut found: Vec<Comment> = self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| res.map_or(true, |r| c.res == r))
            .cloned()
            .collect();
        found.sort_by_key(|c| (c.created, c.id));
        Ok(found)
    }
}

/// Comment collaborator wired into a pingback engine.
#[derive(Clone)]
pub struct Comments {
    store: Arc<dyn CommentStore>,
    config: CommentsConfig,
    /// `url_prefix` with its path ending in `/`
    prefix: Url,
}

/// Parse `raw` as a directory URL: `http://host/blog` becomes `http://host/blog/`.
fn directory_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl(raw.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl Comments {
    /// Fails when `config.url_prefix` is not an absolute hierarchical URL.
    pub fn new(store: Arc<dyn CommentStore>, config: CommentsConfig) -> Result<Self> {
        let prefix = directory_url(&config.url_prefix)?;
        Ok(Self {
            store,
            config,
            prefix,
        })
    }

    pub fn store(&self) -> &Arc<dyn CommentStore> {
        &self.store
    }

    /// Resource key for `target`, or `None` when it is not one of ours.
    pub fn resource_of(&self, target: &Url) -> Option<String> {
        if target.origin() != self.prefix.origin() || !target.path().starts_with(self.prefix.path())
        {
            return None;
        }
        self.prefix
            .make_relative(target)
            .filter(|res| !res.is_empty())
    }

    /// Public URL of a page in the public directory.
    pub fn url_of(&self, file: &str) -> Result<Url> {
        self.prefix
            .join(file)
            .map_err(|e| Error::InvalidUrl(format!("{file}: {e}")))
    }

    async fn check(&self, source: &Url, target: &Url) -> std::result::Result<String, FaultCode> {
        let res = self.resource_of(target).ok_or(FaultCode::TargetCannotBeUsed)?;
        match self.store.resource_exists(&res).await {
            Ok(true) => {}
            Ok(false) => return Err(FaultCode::TargetDoesNotExist),
            Err(e) => {
                warn!(res = %res, error = %e, "Comment store unavailable");
                return Err(FaultCode::GeneralError);
            }
        }
        match self.store.has_pingback(&res, source.as_str()).await {
            Ok(false) => Ok(res),
            Ok(true) => Err(FaultCode::AlreadyRegistered),
            Err(e) => {
                warn!(res = %res, error = %e, "Comment store unavailable");
                Err(FaultCode::GeneralError)
            }
        }
    }

    async fn save(&self, res: String, accepted: &Accepted) -> Result<Comment> {
        let comment = self
            .store
            .save_comment(Comment {
                id: 0,
                res,
                author: accepted.title.clone(),
                website: accepted.source.to_string(),
                message: accepted.excerpt.clone(),
                created: Utc::now(),
            })
            .await?;
        info!(id = comment.id, res = %comment.res, website = %comment.website, "Pingback saved as comment");
        Ok(comment)
    }

    /// Read `file` from the public directory and ping every page it links
    /// to on other hosts. Returns one result per dispatched target.
    pub async fn send_pingbacks(
        &self,
        sender: &PingbackSender,
        file: &str,
    ) -> Result<Vec<(Url, Result<Url>)>> {
        if file.split(['/', '\\']).any(|part| part == "..") {
            return Err(Error::InvalidUrl(file.to_string()));
        }
        let text = tokio::fs::read_to_string(self.config.public_directory.join(file)).await?;
        let source = self.url_of(file)?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let on_complete: ScanCallback = Arc::new(move |target: Url, result: Result<Url>| {
            // Receiver outlives every send
            let _ = tx.send((target, result));
        });
        let targets = sender.scan(&text, &source, Some(on_complete));
        debug!(file = %file, source = %source, count = targets.len(), "Sending pingbacks");

        let mut results = Vec::with_capacity(targets.len());
        while results.len() < targets.len() {
            match rx.recv().await {
                Some(result) => results.push(result),
                None => break,
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl AcceptanceCheck for Comments {
    async fn accept(&self, source: &Url, target: &Url) -> std::result::Result<(), FaultCode> {
        self.check(source, target).await.map(|_| ())
    }
}

#[async_trait]
impl Finalizer for Comments {
    async fn finalize(&self, accepted: &Accepted) -> std::result::Result<(), FaultCode> {
        let res = self.check(&accepted.source, &accepted.target).await?;
        self.save(res, accepted).await.map(|_| ()).map_err(|e| {
            warn!(error = %e, "Failed to save pingback");
            FaultCode::GeneralError
        })
    }
}

#[async_trait]
impl OutcomeSink for Comments {
    async fn on_success(&self, accepted: &Accepted) {
        // Already saved by the finalizer when running without an acceptance check
        let Ok(res) = self.check(&accepted.source, &accepted.target).await else {
            return;
        };
        if let Err(e) = self.save(res, accepted).await {
            warn!(source = %accepted.source, error = %e, "Failed to save pingback");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comments(store: Arc<MemoryCommentStore>) -> Comments {
        with_prefix(store, "http://127.0.0.1:1338/")
    }

    fn with_prefix(store: Arc<MemoryCommentStore>, prefix: &str) -> Comments {
        Comments::new(
            store,
            CommentsConfig {
                url_prefix: prefix.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn accepted(source: &str, target: &str) -> Accepted {
        Accepted {
            source: Url::parse(source).unwrap(),
            target: Url::parse(target).unwrap(),
            title: "Hello".to_string(),
            excerpt: "see this post".to_string(),
        }
    }

    #[tokio::test]
    async fn test_store_filters_and_counts() {
        let store = MemoryCommentStore::new();
        for res in ["a.html", "b.html", "a.html"] {
            store
                .save_comment(Comment {
                    id: 0,
                    res: res.to_string(),
                    author: "x".to_string(),
                    website: "http://x.example/".to_string(),
                    message: "m".to_string(),
                    created: Utc::now(),
                })
                .await
                .unwrap();
        }
        assert_eq!(store.count(Some("a.html")).await.unwrap(), 2);
        assert_eq!(store.count(None).await.unwrap(), 3);
        let ids: Vec<u64> = store.comments(None).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_acceptance_faults() {
        let store = Arc::new(MemoryCommentStore::new());
        store.add_resource("world.html").await;
        let comments = comments(store.clone());
        let source = Url::parse("http://127.0.0.1:1337/hello.html").unwrap();

        let foreign = Url::parse("http://elsewhere.example/world.html").unwrap();
        assert_eq!(
            comments.accept(&source, &foreign).await,
            Err(FaultCode::TargetCannotBeUsed)
        );

        let missing = Url::parse("http://127.0.0.1:1338/missing.html").unwrap();
        assert_eq!(
            comments.accept(&source, &missing).await,
            Err(FaultCode::TargetDoesNotExist)
        );

        let world = Url::parse("http://127.0.0.1:1338/world.html").unwrap();
        assert_eq!(comments.accept(&source, &world).await, Ok(()));
    }

    #[tokio::test]
    async fn test_finalize_then_success_saves_once() {
        let store = Arc::new(MemoryCommentStore::new());
        store.add_resource("world.html").await;
        let comments = comments(store.clone());
        let ping = accepted("http://127.0.0.1:1337/hello.html", "http://127.0.0.1:1338/world.html");

        comments.finalize(&ping).await.unwrap();
        comments.on_success(&ping).await;

        let saved = store.comments(Some("world.html")).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].author, "Hello");
        assert_eq!(saved[0].website, "http://127.0.0.1:1337/hello.html");
        assert_eq!(saved[0].message, "see this post");

        assert_eq!(comments.finalize(&ping).await, Err(FaultCode::AlreadyRegistered));
    }

    #[test]
    fn test_resource_and_url_mapping() {
        let comments = comments(Arc::new(MemoryCommentStore::new()));
        let url = comments.url_of("hello.html").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:1338/hello.html");
        assert_eq!(comments.resource_of(&url).as_deref(), Some("hello.html"));
        assert_eq!(
            comments.resource_of(&Url::parse("http://127.0.0.1:1338/").unwrap()),
            None
        );
    }

    #[tokio::test]
    async fn test_prefix_without_trailing_slash() {
        let store = Arc::new(MemoryCommentStore::new());
        store.add_resource("world.html").await;
        let comments = with_prefix(store, "http://127.0.0.1:1338");

        let world = comments.url_of("world.html").unwrap();
        assert_eq!(world.as_str(), "http://127.0.0.1:1338/world.html");
        assert_eq!(comments.resource_of(&world).as_deref(), Some("world.html"));

        let source = Url::parse("http://127.0.0.1:1337/hello.html").unwrap();
        assert_eq!(comments.accept(&source, &world).await, Ok(()));
    }

    #[tokio::test]
    async fn test_prefix_with_path() {
        let store = Arc::new(MemoryCommentStore::new());
        store.add_resource("hello.html").await;
        let comments = with_prefix(store, "http://127.0.0.1:1338/blog");

        let hello = comments.url_of("hello.html").unwrap();
        assert_eq!(hello.as_str(), "http://127.0.0.1:1338/blog/hello.html");
        assert_eq!(comments.resource_of(&hello).as_deref(), Some("hello.html"));

        let source = Url::parse("http://127.0.0.1:1337/hello.html").unwrap();
        assert_eq!(comments.accept(&source, &hello).await, Ok(()));

        // Same origin, outside the prefix path
        let outside = Url::parse("http://127.0.0.1:1338/hello.html").unwrap();
        assert_eq!(comments.resource_of(&outside), None);
        assert_eq!(
            comments.accept(&source, &outside).await,
            Err(FaultCode::TargetCannotBeUsed)
        );
        // Other port
        let other = Url::parse("http://127.0.0.1:1339/blog/hello.html").unwrap();
        assert_eq!(comments.resource_of(&other), None);
    }

    #[test]
    fn test_unusable_prefix_rejected() {
        for prefix in ["not a url", "mailto:someone@example.org"] {
            let result = Comments::new(
                Arc::new(MemoryCommentStore::new()),
                CommentsConfig {
                    url_prefix: prefix.to_string(),
                    ..Default::default()
                },
            );
            assert!(matches!(result, Err(Error::InvalidUrl(_))), "{prefix}");
        }
    }

    #[tokio::test]
    async fn test_register_directory() {
        let dir = std::env::temp_dir().join(format!("pingback-register-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("one.html"), "<p>one</p>").unwrap();
        std::fs::write(dir.join("two.html"), "<p>two</p>").unwrap();

        let store = MemoryCommentStore::new();
        assert_eq!(store.register_directory(&dir).await.unwrap(), 2);
        assert!(store.resource_exists("one.html").await.unwrap());
        assert!(store.resource_exists("two.html").await.unwrap());
        assert!(!store.resource_exists("three.html").await.unwrap());

        let missing = dir.join("missing");
        assert!(matches!(store.register_directory(&missing).await, Err(Error::Io(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
