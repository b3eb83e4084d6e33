//! Request and response types exchanged between the host, the cache and the network

use reqwest::{Method, Url};
use serde::Serialize;

/// How the request was initiated, as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load
    Navigate,
    /// Same-origin sub-resource
    SameOrigin,
    /// Opaque cross-origin sub-resource
    #[default]
    NoCors,
    /// CORS sub-resource
    Cors,
}

impl RequestMode {
    pub fn is_navigation(self) -> bool {
        matches!(self, RequestMode::Navigate)
    }
}

/// An intercepted outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A plain GET sub-resource request
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            mode: RequestMode::default(),
            headers: Vec::new(),
        }
    }

    /// A top-level document load
    pub fn navigate(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            mode: RequestMode::Navigate,
            headers: vec![("accept".to_string(), "text/html".to_string())],
        }
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    #[cfg(test)]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }
}

/// A response body with its status line and headers, fully buffered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL the response was served from
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// True for 2xx statuses
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_request_mode() {
        let url = Url::parse("https://app.test/").unwrap();
        let req = Request::navigate(url.clone());
        assert!(req.mode.is_navigation());
        assert_eq!(req.method, Method::GET);

        let sub = Request::get(url);
        assert!(!sub.mode.is_navigation());
    }

    #[test]
    fn test_response_ok_range() {
        assert!(Response::new("u", 200, "").ok());
        assert!(Response::new("u", 204, "").ok());
        assert!(!Response::new("u", 304, "").ok());
        assert!(!Response::new("u", 404, "").ok());
        assert!(!Response::new("u", 500, "").ok());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = Response::new("u", 200, "body").with_header("Content-Type", "text/css");
        assert_eq!(resp.content_type(), Some("text/css"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("text/css"));
        assert_eq!(resp.header("etag"), None);
    }
}
