//! Named, versioned request/response caches
//!
//! `CacheStorage` is the registry of every named cache the host knows about;
//! `CacheStore` is a single named cache. The SQLite backend keeps small bodies
//! inline and large bodies as blob files.

use async_trait::async_trait;

use crate::error::CacheError;
use crate::models::{Request, Response};

pub mod key;
#[cfg(test)]
pub mod mock;
pub mod storage;

#[cfg(test)]
pub use mock::MemoryCacheStorage;
pub use storage::{CacheSummary, EntrySummary, SqliteCacheStorage};

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Registry of named caches: `{open, match, delete, keys}`.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    type Store: CacheStore;

    /// Open the named cache, creating it if absent
    async fn open(&self, name: &str) -> CacheResult<Self::Store>;

    /// Whether a cache with this name exists
    async fn has(&self, name: &str) -> CacheResult<bool>;

    /// Delete the named cache and all its entries. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> CacheResult<bool>;

    /// Names of all caches, in creation order
    async fn keys(&self) -> CacheResult<Vec<String>>;

    /// Look a request up, either in one named cache or across all caches in
    /// creation order. Never creates a cache.
    async fn match_request(
        &self,
        request: &Request,
        cache_name: Option<&str>,
    ) -> CacheResult<Option<Response>>;
}

/// A single named cache: `{match, put, delete, keys}`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    fn name(&self) -> &str;

    async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>>;

    /// Store one entry, replacing any previous entry for the same request
    async fn put(&self, request: &Request, response: &Response) -> CacheResult<()>;

    /// Store every entry or none of them
    async fn put_all(&self, entries: &[(Request, Response)]) -> CacheResult<()>;

    async fn delete(&self, request: &Request) -> CacheResult<bool>;

    /// URLs of all stored requests
    async fn keys(&self) -> CacheResult<Vec<String>>;
}

/// Non-GET requests are never matched and cannot be stored.
pub(crate) fn is_cacheable(request: &Request) -> bool {
    request.method == reqwest::Method::GET
}

pub(crate) fn ensure_cacheable(request: &Request) -> CacheResult<()> {
    if is_cacheable(request) {
        Ok(())
    } else {
        Err(CacheError::UnsupportedMethod(request.method.to_string()))
    }
}
