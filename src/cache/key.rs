//! Cache key generation using SHA-256 hashes

use reqwest::{Method, Url};
use sha2::{Digest, Sha256};

/// URL form used for matching: fragments never take part in a lookup.
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Generate a deterministic entry key for a request inside a named cache.
///
/// The key is a SHA-256 hash of the cache name, the method and the
/// fragment-less URL, so the same request stored in two caches never
/// collides (blob files are named after it).
pub fn cache_key(cache_name: &str, method: &Method, url: &Url) -> String {
    let mut hasher = Sha256::new();

    hasher.update(cache_name.as_bytes());
    hasher.update(b"|");
    hasher.update(method.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_url(url).as_bytes());

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_cache_key_deterministic() {
        let key1 = cache_key("v1", &Method::GET, &url("https://app.test/static/style.css"));
        let key2 = cache_key("v1", &Method::GET, &url("https://app.test/static/style.css"));
        assert_eq!(key1, key2);
        assert_eq!(key1.len(), 64);
    }

    #[test]
    fn test_cache_key_ignores_fragment() {
        let key1 = cache_key("v1", &Method::GET, &url("https://app.test/offline.html"));
        let key2 = cache_key("v1", &Method::GET, &url("https://app.test/offline.html#top"));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_cache_key_keeps_query() {
        let key1 = cache_key("v1", &Method::GET, &url("https://app.test/?page=1"));
        let key2 = cache_key("v1", &Method::GET, &url("https://app.test/?page=2"));
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_different_caches() {
        let key1 = cache_key("v1", &Method::GET, &url("https://app.test/"));
        let key2 = cache_key("v2", &Method::GET, &url("https://app.test/"));
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_different_methods() {
        let key1 = cache_key("v1", &Method::GET, &url("https://app.test/"));
        let key2 = cache_key("v1", &Method::HEAD, &url("https://app.test/"));
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_normalize_url_strips_fragment_only() {
        assert_eq!(
            normalize_url(&url("https://app.test/a?b=1#c")),
            "https://app.test/a?b=1"
        );
    }
}
