use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::config::FilterConfig;
use crate::error::ConfigError;
use crate::settings::FilterSettings;

/// Provider of the configuration snapshot used for each decision
pub trait ConfigSource {
    /// Current snapshot; callers hold it for the length of one decision
    fn current_config(&self) -> Arc<FilterConfig>;
}

/// A fixed snapshot
impl ConfigSource for Arc<FilterConfig> {
    fn current_config(&self) -> Arc<FilterConfig> {
        Arc::clone(self)
    }
}

/// Thread-safe, swappable configuration store
///
/// Readers clone the current `Arc` under a short read lock and then work on
/// an immutable snapshot. Saves compile the new snapshot before taking the
/// write lock, so a reader sees either the old or the new config, never a
/// mix.
#[derive(Clone)]
pub struct SharedConfig {
    current: Arc<RwLock<Arc<FilterConfig>>>,

    /// Bumped on every successful save
    version: Arc<AtomicU64>,
}

impl SharedConfig {
    /// Create a store holding `config`
    pub fn new(config: FilterConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a store from settings, rejecting invalid patterns
    pub fn from_settings(settings: &FilterSettings) -> Result<Self, ConfigError> {
        Ok(Self::new(FilterConfig::from_settings(settings)?))
    }

    /// Validate and publish new settings
    ///
    /// On error the previous snapshot stays in place. Returns the new
    /// version number.
    pub fn save(&self, settings: &FilterSettings) -> Result<u64, ConfigError> {
        let config = FilterConfig::from_settings(settings)?;
        Ok(self.replace(config))
    }

    /// Load, validate and publish settings from a file
    pub fn load_file(&self, path: &Path) -> Result<u64, ConfigError> {
        let settings = FilterSettings::load(path)?;
        self.save(&settings)
    }

    /// Publish an already built snapshot
    pub fn replace(&self, config: FilterConfig) -> u64 {
        let config = Arc::new(config);
        *self.current.write() = config;
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(version, "Log filter configuration updated");
        version
    }

    /// Number of successful saves so far
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

impl ConfigSource for SharedConfig {
    fn current_config(&self) -> Arc<FilterConfig> {
        Arc::clone(&*self.current.read())
    }
}

impl std::fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedConfig")
            .field("version", &self.version())
            .field("config", &*self.current.read())
            .finish()
    }
}
