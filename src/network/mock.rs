//! Mock network for testing
//!
//! Serves configured responses by URL, answers 404 for anything else, and
//! can simulate an unreachable network or per-URL transport failures.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::Network;
use crate::error::NetworkError;
use crate::models::{Request, Response};

/// Mock network for testing.
///
/// ```ignore
/// let network = MockNetwork::new()
///     .with_response("https://app.test/", 200, "<h1>home</h1>")
///     .await;
/// ```
#[derive(Clone, Default)]
pub struct MockNetwork {
    /// URL -> response
    routes: Arc<Mutex<HashMap<String, Response>>>,
    /// URLs whose fetch fails at the transport level
    failing: Arc<Mutex<Vec<String>>>,
    /// Every fetch fails when set
    offline: Arc<Mutex<bool>>,
    /// URLs of every fetch attempt, in order
    captured: Arc<Mutex<Vec<String>>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `status` at `url`.
    pub async fn with_response(self, url: &str, status: u16, body: &str) -> Self {
        self.routes
            .lock()
            .await
            .insert(url.to_string(), Response::new(url, status, body));
        self
    }

    /// Fail fetches of `url` as if the connection were refused.
    pub async fn with_failure(self, url: &str) -> Self {
        self.failing.lock().await.push(url.to_string());
        self
    }

    /// Fail every fetch.
    pub async fn offline(self) -> Self {
        self.set_offline(true).await;
        self
    }

    pub async fn set_offline(&self, offline: bool) {
        *self.offline.lock().await = offline;
    }

    /// Number of fetch attempts made.
    pub async fn calls(&self) -> usize {
        self.captured.lock().await.len()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let url = request.url.to_string();
        self.captured.lock().await.push(url.clone());

        if *self.offline.lock().await {
            return Err(NetworkError::Connect("network unreachable".to_string()));
        }
        if self.failing.lock().await.contains(&url) {
            return Err(NetworkError::Connect(format!("connection refused: {}", url)));
        }

        let routes = self.routes.lock().await;
        Ok(routes
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Response::new(url.as_str(), 404, "Not Found")))
    }
}
