//! Install handler: populate the current cache with the manifest

use futures::future::try_join_all;
use serde::Serialize;

use crate::cache::{CacheStorage, CacheStore};
use crate::config::Config;
use crate::error::{ControllerError, Error, Result};
use crate::models::{Request, Response};
use crate::network::Network;

/// Outcome of a successful install
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub cache_name: String,
    pub entries: usize,
    pub size_bytes: usize,
}

/// Open the cache named by the version tag and store every manifest URL.
///
/// All manifest URLs are fetched concurrently. A transport failure or a
/// non-2xx status on any of them fails the whole population and nothing is
/// written.
pub async fn populate<S, N>(config: &Config, storage: &S, network: &N) -> Result<InstallReport>
where
    S: CacheStorage,
    N: Network,
{
    let requests = config.manifest_requests()?;
    let store = storage.open(&config.version_tag).await?;
    log::info!(
        "Cache {} opened, adding {} essential URLs",
        store.name(),
        requests.len()
    );

    let entries = try_join_all(requests.into_iter().map(|request| fetch_entry(network, request)))
        .await?;

    store.put_all(&entries).await?;

    let size_bytes = entries.iter().map(|(_, resp)| resp.body.len()).sum();
    Ok(InstallReport {
        cache_name: store.name().to_string(),
        entries: entries.len(),
        size_bytes,
    })
}

async fn fetch_entry<N: Network>(network: &N, request: Request) -> Result<(Request, Response)> {
    let response = network.fetch(&request).await.map_err(|e| {
        Error::from(ControllerError::PopulationFailed {
            url: request.url.to_string(),
            reason: e.to_string(),
        })
    })?;

    if !response.ok() {
        return Err(ControllerError::PopulationFailed {
            url: request.url.to_string(),
            reason: format!("HTTP {}", response.status),
        }
        .into());
    }

    log::debug!("Fetched {} ({} bytes)", request.url, response.body.len());
    Ok((request, response))
}
