//! Fetch handler: Network-First for navigations, Cache-First for everything else

use serde::Serialize;

use crate::cache::CacheStorage;
use crate::config::Config;
use crate::error::{ControllerError, Result};
use crate::models::{Request, Response};
use crate::network::Network;

/// Strategy chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
}

/// Where the returned response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The offline page, standing in for a failed navigation
    Fallback,
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseSource::Network => write!(f, "network"),
            ResponseSource::Cache => write!(f, "cache"),
            ResponseSource::Fallback => write!(f, "offline fallback"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub strategy: Strategy,
    pub source: ResponseSource,
    pub response: Response,
}

pub fn classify(request: &Request) -> Strategy {
    if request.mode.is_navigation() {
        Strategy::NetworkFirst
    } else {
        Strategy::CacheFirst
    }
}

/// Answer one intercepted request. The cache is only read here.
pub async fn respond<S, N>(
    config: &Config,
    storage: &S,
    network: &N,
    request: &Request,
) -> Result<FetchOutcome>
where
    S: CacheStorage,
    N: Network,
{
    let strategy = classify(request);
    log::debug!("{:?} {} {}", strategy, request.method, request.url);

    let (source, response) = match strategy {
        Strategy::NetworkFirst => network_first(config, storage, network, request).await?,
        Strategy::CacheFirst => cache_first(config, storage, network, request).await?,
    };

    Ok(FetchOutcome {
        strategy,
        source,
        response,
    })
}

async fn network_first<S, N>(
    config: &Config,
    storage: &S,
    network: &N,
    request: &Request,
) -> Result<(ResponseSource, Response)>
where
    S: CacheStorage,
    N: Network,
{
    let err = match network.fetch(request).await {
        Ok(response) => return Ok((ResponseSource::Network, response)),
        Err(err) => err,
    };

    log::debug!("Network failed for {} ({}), serving offline page", request.url, err);
    let fallback = config.fallback_request()?;
    match storage
        .match_request(&fallback, Some(&config.version_tag))
        .await?
    {
        Some(response) => Ok((ResponseSource::Fallback, response)),
        None => Err(ControllerError::NoFallback {
            path: config.fallback_path.clone(),
            cause: err.to_string(),
        }
        .into()),
    }
}

async fn cache_first<S, N>(
    config: &Config,
    storage: &S,
    network: &N,
    request: &Request,
) -> Result<(ResponseSource, Response)>
where
    S: CacheStorage,
    N: Network,
{
    if let Some(cached) = storage
        .match_request(request, Some(&config.version_tag))
        .await?
    {
        log::debug!("Cache hit: {}", request.url);
        return Ok((ResponseSource::Cache, cached));
    }

    log::debug!("Cache miss: {}", request.url);
    let response = network.fetch(request).await?;
    Ok((ResponseSource::Network, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStorage;
    use crate::controller::tests::{installed_storage, offline_page, test_config};
    use crate::error::{Error, NetworkError};
    use crate::models::RequestMode;
    use crate::network::MockNetwork;
    use reqwest::{Method, Url};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classify() {
        let nav = Request::navigate(url("https://app.test/clientes"));
        assert_eq!(classify(&nav), Strategy::NetworkFirst);

        for mode in [RequestMode::SameOrigin, RequestMode::NoCors, RequestMode::Cors] {
            let sub = Request::get(url("https://app.test/static/style.css")).with_mode(mode);
            assert_eq!(classify(&sub), Strategy::CacheFirst);
        }
    }

    #[tokio::test]
    async fn test_navigation_prefers_network_even_when_cached() {
        let config = test_config();
        let storage = installed_storage(&config).await;
        let network = MockNetwork::new()
            .with_response("https://app.test/", 200, "<h1>fresh home</h1>")
            .await;

        let outcome = respond(&config, &storage, &network, &Request::navigate(url("https://app.test/")))
            .await
            .unwrap();

        assert_eq!(outcome.strategy, Strategy::NetworkFirst);
        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.body, b"<h1>fresh home</h1>");
        assert_eq!(network.calls().await, 1);
    }

    #[tokio::test]
    async fn test_navigation_error_status_is_still_network_response() {
        let config = test_config();
        let storage = installed_storage(&config).await;
        let network = MockNetwork::new();

        let outcome = respond(
            &config,
            &storage,
            &network,
            &Request::navigate(url("https://app.test/missing")),
        )
        .await
        .unwrap();

        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.status, 404);
    }

    #[tokio::test]
    async fn test_navigation_offline_serves_fallback() {
        let config = test_config();
        let storage = installed_storage(&config).await;
        let network = MockNetwork::new().offline().await;

        let outcome = respond(
            &config,
            &storage,
            &network,
            &Request::navigate(url("https://app.test/fornecedores")),
        )
        .await
        .unwrap();

        let expected = storage
            .match_request(&config.fallback_request().unwrap(), Some(&config.version_tag))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.source, ResponseSource::Fallback);
        assert_eq!(outcome.response, expected);
    }

    #[tokio::test]
    async fn test_navigation_offline_without_fallback_fails() {
        let config = test_config();
        let storage = MemoryCacheStorage::new().with_cache(&config.version_tag).await;
        let network = MockNetwork::new().offline().await;

        let err = respond(&config, &storage, &network, &Request::navigate(url("https://app.test/")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Controller(ControllerError::NoFallback { .. })
        ));
    }

    #[tokio::test]
    async fn test_navigation_ignores_fallback_in_other_caches() {
        let config = test_config();
        let storage = MemoryCacheStorage::new()
            .with_entries(
                "softdigootech-cache-v0",
                vec![(config.fallback_request().unwrap(), offline_page("old offline"))],
            )
            .await;
        let network = MockNetwork::new().offline().await;

        let result =
            respond(&config, &storage, &network, &Request::navigate(url("https://app.test/"))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_static_asset_cache_hit_skips_network() {
        let config = test_config();
        let storage = installed_storage(&config).await;
        let network = MockNetwork::new()
            .with_response("https://app.test/static/style.css", 200, "from network")
            .await;

        let outcome = respond(
            &config,
            &storage,
            &network,
            &Request::get(url("https://app.test/static/style.css")),
        )
        .await
        .unwrap();

        assert_eq!(outcome.strategy, Strategy::CacheFirst);
        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response.body, b"body of /static/style.css");
        assert_eq!(network.calls().await, 0);
    }

    #[tokio::test]
    async fn test_static_asset_miss_fetches_without_write_back() {
        let config = test_config();
        let storage = installed_storage(&config).await;
        let network = MockNetwork::new()
            .with_response("https://app.test/static/img/logo.png", 200, "png")
            .await;
        let request = Request::get(url("https://app.test/static/img/logo.png"));
        let puts_before = storage.call_counts().await.put;

        let outcome = respond(&config, &storage, &network, &request).await.unwrap();

        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.body, b"png");
        assert_eq!(network.calls().await, 1);
        assert_eq!(storage.call_counts().await.put, puts_before);
        assert_eq!(storage.entry_count(&config.version_tag).await, Some(5));
        assert!(storage
            .match_request(&request, Some(&config.version_tag))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_static_asset_miss_offline_propagates_network_error() {
        let config = test_config();
        let storage = installed_storage(&config).await;
        let network = MockNetwork::new().offline().await;

        let err = respond(
            &config,
            &storage,
            &network,
            &Request::get(url("https://app.test/static/img/logo.png")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Network(NetworkError::Connect(_))));
    }

    #[tokio::test]
    async fn test_non_get_subresource_goes_to_network() {
        let config = test_config();
        let storage = installed_storage(&config).await;
        let network = MockNetwork::new()
            .with_response("https://app.test/", 200, "posted")
            .await;
        let request = Request::get(url("https://app.test/")).with_method(Method::POST);

        let outcome = respond(&config, &storage, &network, &request).await.unwrap();

        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.body, b"posted");
    }
}
