//! Whole-page cache.
//!
//! Rendered pages are kept for a fixed lifetime and then rendered again.
//! Nothing invalidates an entry early: a new post shows up on a cached page
//! only after the entry expires. Time is read through an injected
//! [`Clock`](yatube_common::Clock) so tests can step past the lifetime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use yatube_common::{AppResult, SharedClock};

/// Key prefix of the landing page.
pub const INDEX_PAGE_KEY: &str = "index_page";

#[derive(Debug, Clone)]
struct CachedPage {
    body: String,
    stored_at: DateTime<Utc>,
}

/// Time-boxed cache of rendered pages.
#[derive(Clone)]
pub struct PageCache {
    ttl: Duration,
    clock: SharedClock,
    entries: Arc<RwLock<HashMap<String, CachedPage>>>,
}

impl PageCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: std::time::Duration, clock: SharedClock) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
            clock,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Cache key for `prefix`, one viewer and one resolved page number.
    ///
    /// Pages carry the viewer's navigation bar, so each viewer gets their
    /// own entry.
    #[must_use]
    pub fn key(prefix: &str, viewer: Option<&str>, page: u64) -> String {
        format!("{prefix}:{}:{page}", viewer.unwrap_or("anonymous"))
    }

    /// Fresh cached body for `key`.
    pub async fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|page| self.is_fresh(page, now))
            .map(|page| page.body.clone())
    }

    /// Store a rendered body under `key`.
    pub async fn insert(&self, key: impl Into<String>, body: String) {
        let page = CachedPage {
            body,
            stored_at: self.clock.now(),
        };
        self.entries.write().await.insert(key.into(), page);
    }

    /// Return the cached body, or render, store and return a new one.
    ///
    /// Render failures are returned and nothing is stored.
    pub async fn get_or_render<F, Fut>(&self, key: &str, render: F) -> AppResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<String>>,
    {
        if let Some(body) = self.get(key).await {
            tracing::debug!(key = %key, "Page cache hit");
            return Ok(body);
        }

        let body = render().await?;
        self.insert(key, body.clone()).await;
        tracing::debug!(key = %key, "Page cache miss, stored");
        Ok(body)
    }

    /// Drop expired entries.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, page| self.is_fresh(page, now));
        before - entries.len()
    }

    /// Drop everything.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn is_fresh(&self, page: &CachedPage, now: DateTime<Utc>) -> bool {
        now - page.stored_at < self.ttl
    }
}
