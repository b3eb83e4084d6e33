//! SQLite-based cache storage with file blob support
//!
//! Stores small bodies inline in SQLite, large bodies (>10KB) as files.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use super::key::{cache_key, normalize_url};
use super::{CacheResult as Result, CacheStorage, CacheStore, ensure_cacheable, is_cacheable};
use crate::error::CacheError;
use crate::models::{Request, Response};

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// Bodies larger than this are stored as external blobs
const INLINE_THRESHOLD: usize = 10 * 1024; // 10KB

/// status, response_url, headers, body, blob_path
type EntryRow = (u16, String, String, Option<Vec<u8>>, Option<String>);

struct Shared {
    conn: Mutex<Connection>,
    blobs_dir: PathBuf,
}

/// SQLite-backed registry of named caches
#[derive(Clone)]
pub struct SqliteCacheStorage {
    shared: Arc<Shared>,
}

/// Handle to one named cache inside a `SqliteCacheStorage`
#[derive(Clone)]
pub struct SqliteCacheStore {
    name: String,
    shared: Arc<Shared>,
}

impl SqliteCacheStorage {
    /// Get the default cache directory path (~/.cache/offcache on Linux)
    pub fn default_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("offcache"))
    }

    /// Open cache storage at a specific directory
    pub fn open_at(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("cache.db");
        let blobs_dir = cache_dir.join("blobs");
        std::fs::create_dir_all(&blobs_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create blobs dir: {}", e)))?;

        let conn = Connection::open(&db_path)?;

        // Check schema version - nuke if mismatched
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            nuke(&db_path, &blobs_dir)?;
            return Self::open_at(cache_dir);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS caches (
                name TEXT PRIMARY KEY NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cache_entries (
                cache_key TEXT PRIMARY KEY NOT NULL,
                cache_name TEXT NOT NULL,
                method TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                response_url TEXT NOT NULL,
                headers TEXT NOT NULL,
                body BLOB,
                blob_path TEXT,
                created_at INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entries_cache_name ON cache_entries(cache_name);
            CREATE INDEX IF NOT EXISTS idx_entries_url ON cache_entries(method, url);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            shared: Arc::new(Shared {
                conn: Mutex::new(conn),
                blobs_dir,
            }),
        })
    }

    /// Per-cache entry counts and sizes, in creation order
    pub fn summaries(&self) -> Result<Vec<CacheSummary>> {
        let conn = self.shared.conn();
        let mut stmt = conn.prepare(
            "SELECT c.name, c.created_at, COUNT(e.cache_key), COALESCE(SUM(e.size_bytes), 0)
             FROM caches c LEFT JOIN cache_entries e ON e.cache_name = c.name
             GROUP BY c.name
             ORDER BY c.rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CacheSummary {
                name: row.get(0)?,
                created_at: row.get(1)?,
                entries: row.get::<_, i64>(2)? as usize,
                size_bytes: row.get::<_, i64>(3)? as usize,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Entries of one named cache, sorted by URL
    pub fn entries(&self, name: &str) -> Result<Vec<EntrySummary>> {
        let conn = self.shared.conn();
        let mut stmt = conn.prepare(
            "SELECT method, url, status, size_bytes, created_at, blob_path IS NOT NULL
             FROM cache_entries WHERE cache_name = ?1
             ORDER BY url",
        )?;
        let rows = stmt.query_map([name], |row| {
            Ok(EntrySummary {
                method: row.get(0)?,
                url: row.get(1)?,
                status: row.get(2)?,
                size_bytes: row.get::<_, i64>(3)? as usize,
                created_at: row.get(4)?,
                external: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Delete every cache and every blob
    pub fn clear_all(&self) -> Result<ClearStats> {
        let conn = self.shared.conn();
        let caches: i64 = conn.query_row("SELECT COUNT(*) FROM caches", [], |r| r.get(0))?;
        let entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;

        conn.execute_batch("DELETE FROM cache_entries; DELETE FROM caches;")?;

        let blobs_dir = &self.shared.blobs_dir;
        if blobs_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(blobs_dir) {
                log::warn!("Failed to clear blobs directory: {}", e);
            }
            std::fs::create_dir_all(blobs_dir)
                .map_err(|e| CacheError::Io(format!("Failed to recreate blobs dir: {}", e)))?;
        }

        Ok(ClearStats {
            caches_removed: caches as usize,
            entries_removed: entries as usize,
        })
    }
}

impl Shared {
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lookup(&self, request: &Request, cache_name: Option<&str>) -> Result<Option<Response>> {
        if !is_cacheable(request) {
            return Ok(None);
        }

        let row: Option<(String, EntryRow)> = {
            let conn = self.conn();
            match cache_name {
                Some(name) => {
                    let key = cache_key(name, &request.method, &request.url);
                    conn.query_row(
                        "SELECT cache_key, status, response_url, headers, body, blob_path
                         FROM cache_entries WHERE cache_key = ?1",
                        [&key],
                        read_row,
                    )
                    .optional()?
                }
                None => conn
                    .query_row(
                        "SELECT e.cache_key, e.status, e.response_url, e.headers, e.body, e.blob_path
                         FROM cache_entries e JOIN caches c ON c.name = e.cache_name
                         WHERE e.method = ?1 AND e.url = ?2
                         ORDER BY c.rowid
                         LIMIT 1",
                        params![request.method.as_str(), normalize_url(&request.url)],
                        read_row,
                    )
                    .optional()?,
            }
        };

        match row {
            Some((key, entry)) => self.decode(&key, entry),
            None => Ok(None),
        }
    }

    fn decode(&self, key: &str, row: EntryRow) -> Result<Option<Response>> {
        let (status, url, headers, body, blob_path) = row;
        let headers: Vec<(String, String)> =
            serde_json::from_str(&headers).map_err(|e| CacheError::Corrupt(e.to_string()))?;

        let body = match (body, blob_path) {
            (Some(body), None) => body,
            (None, Some(blob_path)) => match std::fs::read(self.blobs_dir.join(&blob_path)) {
                Ok(data) => data,
                Err(e) => {
                    // Treated as a miss; the row is replaced by the next install
                    log::warn!("Failed to read blob {} for entry {}: {}", blob_path, key, e);
                    return Ok(None);
                }
            },
            _ => return Err(CacheError::Corrupt(format!("entry {} has no body", key))),
        };

        Ok(Some(Response {
            url,
            status,
            headers,
            body,
        }))
    }

    fn insert(&self, cache_name: &str, entries: &[(Request, Response)]) -> Result<()> {
        for (request, _) in entries {
            ensure_cacheable(request)?;
        }

        // Every write gets fresh blob names, so committed rows never point at
        // a file this batch touches. Blobs of a failed batch are removed.
        let generation = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let mut written = Vec::new();
        match self.write_entries(cache_name, entries, generation, &mut written) {
            Ok(orphaned) => {
                self.remove_blobs(&orphaned);
                Ok(())
            }
            Err(e) => {
                self.remove_blobs(&written);
                Err(e)
            }
        }
    }

    /// Write blobs, then every row in one transaction. Returns the blobs the
    /// replaced rows referenced.
    fn write_entries(
        &self,
        cache_name: &str,
        entries: &[(Request, Response)],
        generation: i64,
        written: &mut Vec<String>,
    ) -> Result<Vec<String>> {
        let mut prepared = Vec::with_capacity(entries.len());
        for (i, (request, response)) in entries.iter().enumerate() {
            let key = cache_key(cache_name, &request.method, &request.url);
            let headers = serde_json::to_string(&response.headers)
                .map_err(|e| CacheError::Corrupt(e.to_string()))?;
            let blob_path = if response.body.len() > INLINE_THRESHOLD {
                let suffix = format!("{}-{}", generation, i);
                let path = self.write_blob(&key, &suffix, &response.body)?;
                written.push(path.clone());
                Some(path)
            } else {
                None
            };
            prepared.push((key, request, response, headers, blob_path));
        }

        let now = Utc::now().timestamp();
        let mut orphaned = Vec::new();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
            params![cache_name, now],
        )?;

        for (key, request, response, headers, blob_path) in &prepared {
            let previous: Option<String> = tx
                .query_row(
                    "SELECT blob_path FROM cache_entries WHERE cache_key = ?1",
                    [key],
                    |r| r.get::<_, Option<String>>(0),
                )
                .optional()?
                .flatten();
            if let Some(previous) = previous {
                if blob_path.as_deref() != Some(previous.as_str()) {
                    orphaned.push(previous);
                }
            }

            let inline = if blob_path.is_none() {
                Some(response.body.as_slice())
            } else {
                None
            };
            tx.execute(
                "INSERT OR REPLACE INTO cache_entries
                 (cache_key, cache_name, method, url, status, response_url, headers,
                  body, blob_path, created_at, size_bytes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    key,
                    cache_name,
                    request.method.as_str(),
                    normalize_url(&request.url),
                    response.status,
                    response.url,
                    headers,
                    inline,
                    blob_path,
                    now,
                    response.body.len()
                ],
            )?;
        }
        tx.commit()?;

        Ok(orphaned)
    }

    fn delete_entry(&self, cache_name: &str, request: &Request) -> Result<bool> {
        if !is_cacheable(request) {
            return Ok(false);
        }
        let key = cache_key(cache_name, &request.method, &request.url);
        let blob: Option<String> = {
            let conn = self.conn();
            let blob = conn
                .query_row(
                    "SELECT blob_path FROM cache_entries WHERE cache_key = ?1",
                    [&key],
                    |r| r.get::<_, Option<String>>(0),
                )
                .optional()?;
            let deleted = conn.execute("DELETE FROM cache_entries WHERE cache_key = ?1", [&key])?;
            if deleted == 0 {
                return Ok(false);
            }
            blob.flatten()
        };
        self.remove_blobs(blob.as_slice());
        Ok(true)
    }

    fn delete_cache(&self, name: &str) -> Result<bool> {
        let (removed, blobs) = {
            let mut conn = self.conn();
            let tx = conn.transaction()?;
            let blobs: Vec<String> = {
                let mut stmt = tx.prepare(
                    "SELECT blob_path FROM cache_entries
                     WHERE cache_name = ?1 AND blob_path IS NOT NULL",
                )?;
                let rows = stmt.query_map([name], |r| r.get(0))?;
                rows.collect::<std::result::Result<_, _>>()?
            };
            tx.execute("DELETE FROM cache_entries WHERE cache_name = ?1", [name])?;
            let removed = tx.execute("DELETE FROM caches WHERE name = ?1", [name])?;
            tx.commit()?;
            (removed, blobs)
        };

        self.remove_blobs(&blobs);
        Ok(removed > 0)
    }

    /// Write a blob file, sharded by first 2 chars of key
    fn write_blob(&self, key: &str, suffix: &str, data: &[u8]) -> Result<String> {
        let shard = &key[..2.min(key.len())];
        let shard_dir = self.blobs_dir.join(shard);
        std::fs::create_dir_all(&shard_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create shard dir: {}", e)))?;

        let filename = format!("{}.{}.bin", key, suffix);
        let rel_path = format!("{}/{}", shard, filename);

        std::fs::write(shard_dir.join(&filename), data)
            .map_err(|e| CacheError::Io(format!("Failed to write blob: {}", e)))?;

        Ok(rel_path)
    }

    fn remove_blobs(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = std::fs::remove_file(self.blobs_dir.join(path)) {
                log::warn!("Failed to remove blob {}: {}", path, e);
            }
        }
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, EntryRow)> {
    Ok((
        row.get(0)?,
        (row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?),
    ))
}

/// Nuke the cache (delete DB and all blobs)
fn nuke(db_path: &Path, blobs_dir: &Path) -> Result<()> {
    if db_path.exists() {
        std::fs::remove_file(db_path)
            .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
    }
    if blobs_dir.exists() {
        std::fs::remove_dir_all(blobs_dir)
            .map_err(|e| CacheError::Io(format!("Failed to remove blobs dir: {}", e)))?;
    }
    Ok(())
}

#[async_trait]
impl CacheStorage for SqliteCacheStorage {
    type Store = SqliteCacheStore;

    async fn open(&self, name: &str) -> Result<SqliteCacheStore> {
        self.shared.conn().execute(
            "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().timestamp()],
        )?;
        Ok(SqliteCacheStore {
            name: name.to_string(),
            shared: Arc::clone(&self.shared),
        })
    }

    async fn has(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .shared
            .conn()
            .query_row("SELECT 1 FROM caches WHERE name = ?1", [name], |r| r.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        self.shared.delete_cache(name)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let conn = self.shared.conn();
        let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY rowid")?;
        let rows = stmt.query_map([], |r| r.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn match_request(
        &self,
        request: &Request,
        cache_name: Option<&str>,
    ) -> Result<Option<Response>> {
        self.shared.lookup(request, cache_name)
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        self.shared.lookup(request, Some(&self.name))
    }

    async fn put(&self, request: &Request, response: &Response) -> Result<()> {
        self.shared.insert(&self.name, &[(request.clone(), response.clone())])
    }

    async fn put_all(&self, entries: &[(Request, Response)]) -> Result<()> {
        self.shared.insert(&self.name, entries)
    }

    async fn delete(&self, request: &Request) -> Result<bool> {
        self.shared.delete_entry(&self.name, request)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let conn = self.shared.conn();
        let mut stmt = conn.prepare(
            "SELECT url FROM cache_entries WHERE cache_name = ?1 ORDER BY created_at, url",
        )?;
        let rows = stmt.query_map([&self.name], |r| r.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

/// One row of `cache list`
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub name: String,
    pub created_at: i64,
    pub entries: usize,
    pub size_bytes: usize,
}

/// One row of `cache entries`
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub size_bytes: usize,
    pub created_at: i64,
    /// Body stored as a blob file rather than inline
    pub external: bool,
}

/// Statistics about cache clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub caches_removed: usize,
    pub entries_removed: usize,
}
