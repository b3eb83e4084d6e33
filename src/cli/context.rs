//! Host execution context
//!
//! Loads configuration, applies CLI overrides, and opens the persistent
//! cache storage, the network and the registration record every lifecycle
//! command needs.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::SqliteCacheStorage;
use crate::cli::args::{GlobalOptions, OutputFormat};
use crate::config::Config;
use crate::controller::{Controller, LifecycleState};
use crate::error::Result;
use crate::network::HttpNetwork;
use crate::registration::Registration;

pub type HostController = Controller<SqliteCacheStorage, HttpNetwork>;

/// Everything a host command needs to drive the controller.
pub struct HostContext {
    /// Configuration with CLI overrides applied and validated
    pub config: Config,
    pub storage: Arc<SqliteCacheStorage>,
    pub network: Arc<HttpNetwork>,
    pub registration: Registration,
    pub cache_dir: PathBuf,
    pub format: OutputFormat,
}

impl HostContext {
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = load_config(opts)?;
        let cache_dir = resolve_cache_dir(&config)?;
        log::debug!("Using cache directory {}", cache_dir.display());

        let storage = SqliteCacheStorage::open_at(&cache_dir)?;
        let network = HttpNetwork::new(config.timeout())?;
        let registration = Registration::load(&cache_dir)?;

        Ok(Self {
            config,
            storage: Arc::new(storage),
            network: Arc::new(network),
            registration,
            cache_dir,
            format: opts.format,
        })
    }

    /// Controller for the configured version, resumed in the state the
    /// registration says it reached.
    pub fn controller(&self) -> HostController {
        let state = self.registration.state_of(&self.config.version_tag);
        log::debug!("{} resumes as {}", self.config.version_tag, state);
        Controller::new(
            Arc::new(self.config.clone()),
            Arc::clone(&self.storage),
            Arc::clone(&self.network),
        )
        .with_state(state)
    }

    /// Controller for the active generation, which may be older than the
    /// configured version if a newer one is waiting or failed to install.
    pub fn active_controller(&self) -> Option<HostController> {
        let active = self.registration.active.as_ref()?;
        let config = Config {
            version_tag: active.version_tag.clone(),
            fallback_path: active.fallback_path.clone(),
            ..self.config.clone()
        };
        Some(
            Controller::new(
                Arc::new(config),
                Arc::clone(&self.storage),
                Arc::clone(&self.network),
            )
            .with_state(LifecycleState::Activated),
        )
    }

    pub fn save_registration(&self) -> Result<()> {
        self.registration.save(&self.cache_dir)
    }
}

/// Load the config file and layer the CLI/env overrides on top
pub fn load_config(opts: &GlobalOptions) -> Result<Config> {
    let mut config = Config::load_at(opts.config_ref())?;

    if let Some(origin) = &opts.origin {
        config.origin = origin.clone();
    }
    if let Some(dir) = &opts.cache_dir {
        config.cache_dir = Some(PathBuf::from(dir));
    }

    config.validate()?;
    Ok(config)
}

/// Cache directory from the config, or the platform default
pub fn resolve_cache_dir(config: &Config) -> Result<PathBuf> {
    match &config.cache_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(SqliteCacheStorage::default_dir()?),
    }
}
