//! Boundary with the per-source data client and the connection registry.
//!
//! The engine never talks HTTP itself. It asks a [`SourceConnector`] for an
//! authenticated [`SourceHandle`] and then for whole collections of records.

use crate::error::{AnalyticsError, Result};
use crate::schema::*;
use async_trait::async_trait;
use log::debug;
use moka::sync::Cache;
use std::sync::Arc;

/// Opaque authentication token bound to one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle {
    source_id: i64,
    alias: String,
    api_url: String,
    token: String,
}

impl SourceHandle {
    pub fn new(source: &Source, token: impl Into<String>) -> Self {
        Self {
            source_id: source.id,
            alias: source.alias.clone(),
            api_url: source.api_url.clone(),
            token: token.into(),
        }
    }

    pub fn source_id(&self) -> i64 {
        self.source_id
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Client able to log into a source and pull each entity collection.
///
/// Fetch methods may be called concurrently on the same handle.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn authenticate(&self, source: &Source) -> Result<SourceHandle>;

    async fn fetch_invoices(&self, handle: &SourceHandle) -> Result<Vec<Invoice>>;
    async fn fetch_invoice_items(&self, handle: &SourceHandle) -> Result<Vec<InvoiceItem>>;
    async fn fetch_purchases(&self, handle: &SourceHandle) -> Result<Vec<Purchase>>;
    async fn fetch_receivables(&self, handle: &SourceHandle) -> Result<Vec<Receivable>>;
    async fn fetch_payables(&self, handle: &SourceHandle) -> Result<Vec<Payable>>;
    async fn fetch_products(&self, handle: &SourceHandle) -> Result<Vec<Product>>;
    async fn fetch_customers(&self, handle: &SourceHandle) -> Result<Vec<Customer>>;
    async fn fetch_sellers(&self, handle: &SourceHandle) -> Result<Vec<Seller>>;
}

/// Registry of configured sources.
#[async_trait]
pub trait SourceDirectory: Send + Sync {
    async fn list_sources(&self) -> Result<Vec<Source>>;

    async fn find_source(&self, id: i64) -> Result<Source> {
        self.list_sources()
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(AnalyticsError::UnknownSource(id))
    }
}

/// Directory backed by a fixed list, usually the one in [`crate::EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct StaticSourceDirectory {
    sources: Vec<Source>,
}

impl StaticSourceDirectory {
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl SourceDirectory for StaticSourceDirectory {
    async fn list_sources(&self) -> Result<Vec<Source>> {
        Ok(self.sources.clone())
    }
}

/// Cache of authenticated handles keyed by `(source_id, user_id)`.
pub trait HandleCache: Send + Sync {
    fn get(&self, source_id: i64, user_id: i64) -> Option<SourceHandle>;
    fn put(&self, user_id: i64, handle: SourceHandle);
    fn invalidate(&self, source_id: i64, user_id: i64);
}

const DEFAULT_HANDLE_CAPACITY: u64 = 10_000;

/// Process-local handle cache. Handles live until evicted by a failed request
/// or pushed out once `capacity` entries are held.
#[derive(Clone)]
pub struct InMemoryHandleCache {
    handles: Cache<(i64, i64), SourceHandle>,
}

impl InMemoryHandleCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HANDLE_CAPACITY)
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            handles: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn len(&self) -> u64 {
        self.handles.run_pending_tasks();
        self.handles.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryHandleCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleCache for InMemoryHandleCache {
    fn get(&self, source_id: i64, user_id: i64) -> Option<SourceHandle> {
        self.handles.get(&(source_id, user_id))
    }

    fn put(&self, user_id: i64, handle: SourceHandle) {
        self.handles.insert((handle.source_id(), user_id), handle);
    }

    fn invalidate(&self, source_id: i64, user_id: i64) {
        if self.handles.remove(&(source_id, user_id)).is_some() {
            debug!(
                "Evicted cached handle for source {} / user {}",
                source_id, user_id
            );
        }
    }
}

/// Cache that never stores anything; every request authenticates afresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHandleCache;

impl HandleCache for NoHandleCache {
    fn get(&self, _source_id: i64, _user_id: i64) -> Option<SourceHandle> {
        None
    }

    fn put(&self, _user_id: i64, _handle: SourceHandle) {}

    fn invalidate(&self, _source_id: i64, _user_id: i64) {}
}

pub type SharedConnector = Arc<dyn SourceConnector>;

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: i64) -> Source {
        Source {
            id,
            alias: format!("Branch {}", id),
            api_url: "http://localhost".to_string(),
            api_user: "user".to_string(),
            api_password: "pass".to_string(),
            refresh_seconds: 0,
        }
    }

    #[test]
    fn test_handle_cache_is_keyed_by_source_and_user() {
        let cache = InMemoryHandleCache::new();
        cache.put(7, SourceHandle::new(&source(1), "token-a"));
        cache.put(8, SourceHandle::new(&source(1), "token-b"));

        assert_eq!(cache.get(1, 7).unwrap().token(), "token-a");
        assert_eq!(cache.get(1, 8).unwrap().token(), "token-b");
        assert!(cache.get(2, 7).is_none());

        cache.invalidate(1, 7);
        assert!(cache.get(1, 7).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_is_visible_to_clones() {
        let cache = InMemoryHandleCache::new();
        let shared = cache.clone();
        cache.put(7, SourceHandle::new(&source(3), "stale"));
        assert_eq!(shared.get(3, 7).unwrap().token(), "stale");

        shared.invalidate(3, 7);
        assert!(cache.get(3, 7).is_none());

        cache.put(7, SourceHandle::new(&source(3), "fresh"));
        assert_eq!(shared.get(3, 7).unwrap().token(), "fresh");
        assert!(!shared.is_empty());
    }

    #[tokio::test]
    async fn test_static_directory_lookup() {
        let directory = StaticSourceDirectory::new(vec![source(1), source(2)]);

        assert_eq!(directory.list_sources().await.unwrap().len(), 2);
        assert_eq!(directory.find_source(2).await.unwrap().alias, "Branch 2");
        assert!(matches!(
            directory.find_source(9).await,
            Err(AnalyticsError::UnknownSource(9))
        ));
    }
}
