//! The offline cache controller
//!
//! Three handlers driven by lifecycle events from the host:
//! - `install` populates the cache named by the version tag with the manifest
//! - `activate` deletes every cache that is not the current one
//! - `fetch` answers intercepted requests, Network-First for navigations and
//!   Cache-First for everything else
//!
//! Each handler is a plain async function of (configuration, storage,
//! network). `Controller` sequences them: install before activate, activate
//! before fetch.

use std::sync::{Arc, Mutex};

pub mod activate;
pub mod fetch;
pub mod install;

pub use activate::ActivateReport;
pub use fetch::{FetchOutcome, ResponseSource, Strategy};
pub use install::InstallReport;

use crate::cache::CacheStorage;
use crate::config::Config;
use crate::error::{ControllerError, Result};
use crate::models::Request;
use crate::network::Network;

/// Where a controller instance is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this instance will never control anything
    Redundant,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
            LifecycleState::Redundant => "redundant",
        };
        write!(f, "{}", s)
    }
}

/// One controller instance bound to a configuration and its capabilities.
pub struct Controller<S: CacheStorage, N: Network> {
    config: Arc<Config>,
    storage: Arc<S>,
    network: Arc<N>,
    state: Mutex<LifecycleState>,
}

impl<S: CacheStorage, N: Network> Controller<S, N> {
    pub fn new(config: Arc<Config>, storage: Arc<S>, network: Arc<N>) -> Self {
        Self {
            config,
            storage,
            network,
            state: Mutex::new(LifecycleState::Parsed),
        }
    }

    /// Resume an instance the host already took through earlier phases
    pub fn with_state(self, state: LifecycleState) -> Self {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
        self
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Move to `to` if the current state is one of `from`.
    fn transition(
        &self,
        operation: &'static str,
        from: &[LifecycleState],
        to: LifecycleState,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !from.contains(&state) {
            return Err(ControllerError::InvalidState {
                operation,
                state: state.to_string(),
            }
            .into());
        }
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: LifecycleState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }

    /// Handle the install event. On failure the instance becomes redundant.
    pub async fn install(&self) -> Result<InstallReport> {
        self.transition("install", &[LifecycleState::Parsed], LifecycleState::Installing)?;

        match install::populate(&self.config, self.storage.as_ref(), self.network.as_ref()).await {
            Ok(report) => {
                self.set_state(LifecycleState::Installed);
                log::info!(
                    "Installed {} ({} entries)",
                    report.cache_name,
                    report.entries
                );
                Ok(report)
            }
            Err(err) => {
                self.set_state(LifecycleState::Redundant);
                log::warn!("Install of {} failed: {}", self.config.version_tag, err);
                Err(err)
            }
        }
    }

    /// Handle the activate event.
    ///
    /// Re-activating an active instance is allowed and purges whatever stale
    /// caches appeared since. A failed activation leaves the instance
    /// installed so it can be retried.
    pub async fn activate(&self) -> Result<ActivateReport> {
        let previous = self.state();
        self.transition(
            "activate",
            &[LifecycleState::Installed, LifecycleState::Activated],
            LifecycleState::Activating,
        )?;

        match activate::purge_stale(&self.config, self.storage.as_ref()).await {
            Ok(report) => {
                self.set_state(LifecycleState::Activated);
                log::info!("Activated {}", self.config.version_tag);
                Ok(report)
            }
            Err(err) => {
                self.set_state(previous);
                Err(err)
            }
        }
    }

    /// Handle one fetch event. Only an activated instance answers requests.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome> {
        let state = self.state();
        if state != LifecycleState::Activated {
            return Err(ControllerError::InvalidState {
                operation: "handle fetch",
                state: state.to_string(),
            }
            .into());
        }

        fetch::respond(
            &self.config,
            self.storage.as_ref(),
            self.network.as_ref(),
            request,
        )
        .await
    }
}
