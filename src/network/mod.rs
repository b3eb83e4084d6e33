//! Network access for the controller
//!
//! The controller only ever needs `fetch`; the HTTP backend is reqwest and
//! tests substitute `MockNetwork`.

use async_trait::async_trait;

use crate::error::NetworkError;
use crate::models::{Request, Response};

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpNetwork;
#[cfg(test)]
pub use mock::MockNetwork;

/// Network fetch capability.
///
/// Resolves with any HTTP status; only transport failures are errors.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}
