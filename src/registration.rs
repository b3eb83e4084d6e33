//! Host-side record of which cache generation controls fetches
//!
//! A successful install leaves its version *waiting*; activation promotes it
//! to *active*. A failed install clears the waiting slot and never touches
//! the active one, so the previous generation keeps serving.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::controller::LifecycleState;
use crate::error::Result;

const REGISTRATION_FILE: &str = "registration.json";

/// A cache generation known to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredVersion {
    pub version_tag: String,
    /// Fallback page of that generation, needed to keep serving it after
    /// the configuration moved on
    pub fallback_path: String,
    pub since: DateTime<Utc>,
}

impl RegisteredVersion {
    fn new(version_tag: &str, fallback_path: &str) -> Self {
        Self {
            version_tag: version_tag.to_string(),
            fallback_path: fallback_path.to_string(),
            since: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<RegisteredVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting: Option<RegisteredVersion>,
}

impl Registration {
    pub fn path(cache_dir: &Path) -> PathBuf {
        cache_dir.join(REGISTRATION_FILE)
    }

    /// Load the registration, or an empty one if none was saved yet
    pub fn load(cache_dir: &Path) -> Result<Self> {
        let path = Self::path(cache_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, cache_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(cache_dir)?;
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(cache_dir), contents)?;
        Ok(())
    }

    /// Lifecycle state a controller for `version_tag` resumes in
    pub fn state_of(&self, version_tag: &str) -> LifecycleState {
        let is = |slot: &Option<RegisteredVersion>| {
            slot.as_ref().is_some_and(|v| v.version_tag == version_tag)
        };
        if is(&self.waiting) {
            LifecycleState::Installed
        } else if is(&self.active) {
            LifecycleState::Activated
        } else {
            LifecycleState::Parsed
        }
    }

    pub fn record_installed(&mut self, version_tag: &str, fallback_path: &str) {
        self.waiting = Some(RegisteredVersion::new(version_tag, fallback_path));
    }

    pub fn record_install_failed(&mut self) {
        self.waiting = None;
    }

    /// Record a successful activation of `version_tag`.
    ///
    /// Activation deletes every other cache, so a different waiting version
    /// has lost its cache and is forgotten. Returns false if `version_tag`
    /// was neither waiting nor already active; nothing changes then.
    pub fn promote(&mut self, version_tag: &str) -> bool {
        let is_active = self
            .active
            .as_ref()
            .is_some_and(|a| a.version_tag == version_tag);

        match self.waiting.take() {
            Some(waiting) if waiting.version_tag == version_tag => {
                self.active = Some(RegisteredVersion {
                    since: Utc::now(),
                    ..waiting
                });
                true
            }
            Some(stale) if is_active => {
                log::info!(
                    "Dropping waiting version {}: its cache was purged",
                    stale.version_tag
                );
                true
            }
            other => {
                self.waiting = other;
                is_active
            }
        }
    }
}
