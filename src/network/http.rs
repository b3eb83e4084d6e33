//! reqwest-backed network

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::Network;
use crate::error::NetworkError;
use crate::models::{Request, Response};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP network backend
pub struct HttpNetwork {
    http: HttpClient,
}

impl HttpNetwork {
    pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("offcache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::Other(e.to_string()))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        log::debug!("{} {}", request.method, request.url);
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            url,
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    #[test]
    fn test_network_creation() {
        assert!(HttpNetwork::new(DEFAULT_TIMEOUT).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_resolves_error_statuses() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/missing.css")
            .with_status(404)
            .with_header("content-type", "text/plain")
            .with_body("not here")
            .create_async()
            .await;

        let network = HttpNetwork::new(DEFAULT_TIMEOUT).unwrap();
        let url = Url::parse(&format!("{}/missing.css", server.url())).unwrap();
        let response = network.fetch(&Request::get(url)).await.unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.ok());
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.body, b"not here");
    }

    #[tokio::test]
    async fn test_fetch_sends_request_headers() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/")
            .match_header("accept", "text/html")
            .with_status(200)
            .with_body("<h1>home</h1>")
            .create_async()
            .await;

        let network = HttpNetwork::new(DEFAULT_TIMEOUT).unwrap();
        let url = Url::parse(&format!("{}/", server.url())).unwrap();
        let response = network.fetch(&Request::navigate(url)).await.unwrap();

        assert!(response.ok());
        page.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_error() {
        let network = HttpNetwork::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse("http://127.0.0.1:1/").unwrap();

        let err = network.fetch(&Request::get(url)).await.unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Connect(_) | NetworkError::Other(_)
        ));
    }
}
