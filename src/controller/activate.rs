//! Activate handler: purge every cache that is not the current generation

use futures::future::try_join_all;
use serde::Serialize;

use crate::cache::CacheStorage;
use crate::config::Config;
use crate::error::Result;

/// Outcome of a successful activation
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub current: String,
    /// Stale caches removed, in registry order
    pub deleted: Vec<String>,
}

/// Delete every cache whose name differs from the version tag.
///
/// Deletions run concurrently; the first failure aborts the wait and fails
/// the activation. Deletions that already completed stay committed.
pub async fn purge_stale<S: CacheStorage>(config: &Config, storage: &S) -> Result<ActivateReport> {
    let names = storage.keys().await?;

    let deletions = names
        .into_iter()
        .filter(|name| *name != config.version_tag)
        .map(|name| async move {
            log::info!("Deleting stale cache: {}", name);
            storage.delete(&name).await?;
            Ok::<_, crate::error::CacheError>(name)
        });
    let deleted = try_join_all(deletions).await?;

    Ok(ActivateReport {
        current: config.version_tag.clone(),
        deleted,
    })
}
