//! Configuration management for offcache
//!
//! The configuration is the controller's whole world: which cache generation
//! is current, which assets must work offline, and which page stands in for
//! a navigation when the network is gone.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::models::Request;
use crate::network::http::DEFAULT_TIMEOUT;

/// Cache generation shipped with the default configuration
pub const DEFAULT_VERSION_TAG: &str = "softdigootech-cache-v1";

/// Page served when a navigation cannot reach the network
pub const DEFAULT_FALLBACK_PATH: &str = "/offline.html";

/// Development server the default manifest is fetched from
pub const DEFAULT_ORIGIN: &str = "http://localhost:5000";

/// Assets that must be available offline
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/static/css/bootstrap.min.css",
    "/static/style.css",
    "/static/js/chart.min.js",
    "/offline.html",
];

/// Offline cache controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the current cache; bumping it invalidates every other cache
    /// on the next activation
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    /// Root-relative paths populated on install, in order
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Offline fallback for navigations; should appear in the manifest
    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,

    /// Origin the root-relative paths resolve against
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Cache directory override (defaults to the XDG cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Network timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_version_tag() -> String {
    DEFAULT_VERSION_TAG.to_string()
}

fn default_manifest() -> Vec<String> {
    DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect()
}

fn default_fallback_path() -> String {
    DEFAULT_FALLBACK_PATH.to_string()
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version_tag: default_version_tag(),
            manifest: default_manifest(),
            fallback_path: default_fallback_path(),
            origin: default_origin(),
            cache_dir: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".offcache").join("config.yaml"))
    }

    /// Resolve the config path from an optional override
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an explicit path, or from the default path.
    ///
    /// A missing default file yields the built-in defaults; a missing
    /// explicit file is an error.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(Path::new(p)),
            None => {
                let default_path = Self::default_path()?;
                if default_path.exists() {
                    Self::load_from(&default_path)
                } else {
                    log::debug!("No config at {}, using defaults", default_path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Check the configuration is usable.
    ///
    /// A fallback that is not part of the manifest is allowed but will never
    /// be cached, so it only produces a warning.
    pub fn validate(&self) -> Result<()> {
        if self.version_tag.trim().is_empty() {
            return Err(ConfigError::Invalid("version_tag must not be empty".to_string()).into());
        }
        if self.manifest.is_empty() {
            return Err(ConfigError::Invalid("manifest must list at least one path".to_string()).into());
        }
        if let Some(bad) = self.manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid(format!(
                "manifest path '{}' must be root-relative",
                bad
            ))
            .into());
        }
        if !self.fallback_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "fallback_path '{}' must be root-relative",
                self.fallback_path
            ))
            .into());
        }
        self.origin_url()?;

        if !self.manifest.contains(&self.fallback_path) {
            log::warn!(
                "Fallback {} is not in the manifest; offline navigations will fail",
                self.fallback_path
            );
        }
        Ok(())
    }

    /// Parsed origin
    pub fn origin_url(&self) -> Result<Url> {
        let url = Url::parse(&self.origin).map_err(|e| {
            ConfigError::Invalid(format!("origin '{}' is not a URL: {}", self.origin, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "origin '{}' must be http or https",
                self.origin
            ))
            .into());
        }
        Ok(url)
    }

    /// Resolve a root-relative path (or absolute URL) against the origin
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let url = self
            .origin_url()?
            .join(path)
            .map_err(|e| ConfigError::Invalid(format!("cannot resolve '{}': {}", path, e)))?;
        Ok(url)
    }

    /// GET requests for every manifest entry, in manifest order
    pub fn manifest_requests(&self) -> Result<Vec<Request>> {
        self.manifest
            .iter()
            .map(|path| self.resolve(path).map(Request::get))
            .collect()
    }

    pub fn fallback_request(&self) -> Result<Request> {
        self.resolve(&self.fallback_path).map(Request::get)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
