//! In-memory cache storage for testing
//!
//! Mirrors the SQLite backend's matching rules without touching disk, and
//! lets tests inject storage failures and inspect call counts.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::key::normalize_url;
use super::{CacheResult as Result, CacheStorage, CacheStore, ensure_cacheable, is_cacheable};
use crate::error::CacheError;
use crate::models::{Request, Response};

/// (method, normalized url) -> response
type Entries = Vec<((String, String), Response)>;

#[derive(Default)]
struct Inner {
    /// Caches in creation order
    caches: Mutex<Vec<(String, Entries)>>,
    /// Cache names whose deletion fails
    failing_deletes: Mutex<Vec<String>>,
    /// Error to return from the next put/put_all - consumed on first use
    put_error: Mutex<Option<CacheError>>,
    call_count: Mutex<CallCounts>,
}

/// Tracks storage call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub open: usize,
    pub match_request: usize,
    pub put: usize,
    pub delete: usize,
    pub keys: usize,
}

/// Mock cache storage for testing.
///
/// ```ignore
/// let storage = MemoryCacheStorage::new().with_cache("old-v0").await;
/// assert_eq!(storage.keys().await?, vec!["old-v0"]);
/// ```
#[derive(Clone, Default)]
pub struct MemoryCacheStorage {
    inner: Arc<Inner>,
}

pub struct MemoryCacheStore {
    name: String,
    inner: Arc<Inner>,
}

fn entry_key(request: &Request) -> (String, String) {
    (request.method.to_string(), normalize_url(&request.url))
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty named cache.
    pub async fn with_cache(self, name: &str) -> Self {
        self.inner
            .caches
            .lock()
            .await
            .push((name.to_string(), Vec::new()));
        self
    }

    /// Create a named cache pre-populated with entries.
    pub async fn with_entries(self, name: &str, entries: Vec<(Request, Response)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(req, resp)| (entry_key(&req), resp))
            .collect();
        self.inner
            .caches
            .lock()
            .await
            .push((name.to_string(), entries));
        self
    }

    /// Make deletion of the named cache fail.
    pub async fn fail_delete(self, name: &str) -> Self {
        self.inner
            .failing_deletes
            .lock()
            .await
            .push(name.to_string());
        self
    }

    /// Configure an error to return on the next write.
    pub async fn fail_next_put(self, error: CacheError) -> Self {
        *self.inner.put_error.lock().await = Some(error);
        self
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.inner.call_count.lock().await.clone()
    }

    /// Number of entries in a cache, or None if it does not exist.
    pub async fn entry_count(&self, name: &str) -> Option<usize> {
        self.inner
            .caches
            .lock()
            .await
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entries)| entries.len())
    }
}

impl Inner {
    async fn lookup(&self, request: &Request, cache_name: Option<&str>) -> Option<Response> {
        self.call_count.lock().await.match_request += 1;
        if !is_cacheable(request) {
            return None;
        }
        let key = entry_key(request);
        let caches = self.caches.lock().await;
        caches
            .iter()
            .filter(|(name, _)| cache_name.is_none_or(|wanted| wanted == name))
            .find_map(|(_, entries)| {
                entries
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, resp)| resp.clone())
            })
    }

    async fn insert(&self, cache_name: &str, entries: &[(Request, Response)]) -> Result<()> {
        self.call_count.lock().await.put += 1;
        if let Some(err) = self.put_error.lock().await.take() {
            return Err(err);
        }
        for (request, _) in entries {
            ensure_cacheable(request)?;
        }

        let mut caches = self.caches.lock().await;
        let index = match caches.iter().position(|(n, _)| n == cache_name) {
            Some(index) => index,
            None => {
                caches.push((cache_name.to_string(), Vec::new()));
                caches.len() - 1
            }
        };
        let stored = &mut caches[index].1;
        for (request, response) in entries {
            let key = entry_key(request);
            stored.retain(|(k, _)| *k != key);
            stored.push((key, response.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    type Store = MemoryCacheStore;

    async fn open(&self, name: &str) -> Result<MemoryCacheStore> {
        self.inner.call_count.lock().await.open += 1;
        let mut caches = self.inner.caches.lock().await;
        if !caches.iter().any(|(n, _)| n == name) {
            caches.push((name.to_string(), Vec::new()));
        }
        Ok(MemoryCacheStore {
            name: name.to_string(),
            inner: Arc::clone(&self.inner),
        })
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.entry_count(name).await.is_some())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        self.inner.call_count.lock().await.delete += 1;
        if self.inner.failing_deletes.lock().await.iter().any(|n| n == name) {
            return Err(CacheError::Io(format!("Failed to delete cache {}", name)));
        }
        let mut caches = self.inner.caches.lock().await;
        let before = caches.len();
        caches.retain(|(n, _)| n != name);
        Ok(caches.len() < before)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.call_count.lock().await.keys += 1;
        let caches = self.inner.caches.lock().await;
        Ok(caches.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn match_request(
        &self,
        request: &Request,
        cache_name: Option<&str>,
    ) -> Result<Option<Response>> {
        Ok(self.inner.lookup(request, cache_name).await)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        Ok(self.inner.lookup(request, Some(&self.name)).await)
    }

    async fn put(&self, request: &Request, response: &Response) -> Result<()> {
        self.inner
            .insert(&self.name, &[(request.clone(), response.clone())])
            .await
    }

    async fn put_all(&self, entries: &[(Request, Response)]) -> Result<()> {
        self.inner.insert(&self.name, entries).await
    }

    async fn delete(&self, request: &Request) -> Result<bool> {
        let key = entry_key(request);
        let mut caches = self.inner.caches.lock().await;
        let Some((_, entries)) = caches.iter_mut().find(|(n, _)| *n == self.name) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|(k, _)| *k != key);
        Ok(entries.len() < before)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let caches = self.inner.caches.lock().await;
        Ok(caches
            .iter()
            .find(|(n, _)| *n == self.name)
            .map(|(_, entries)| entries.iter().map(|((_, url), _)| url.clone()).collect())
            .unwrap_or_default())
    }
}
