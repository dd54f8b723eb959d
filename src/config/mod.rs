//! Configuration loaded from `~/.config/panplay/`.
//!
//! - `config.toml`: [`Settings`] (catalog location, concurrency, timeouts)
//! - `<drive>.json`: drive credentials, see [`FileConfigStore`]
//!
//! ```toml
//! config_url = "https://example.com/sites.json"
//! concurrency_limit = 3
//! traversal_concurrency = 8
//! request_timeout_secs = 20
//! ```

pub mod catalog;
pub mod store;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::search::DEFAULT_CONCURRENCY_LIMIT;

pub use catalog::SiteCatalog;
pub use store::{ConfigStore, DriveCredential, FileConfigStore, MemoryConfigStore};

/// Default cap on concurrent folder-listing requests of one drive client.
pub const DEFAULT_TRAVERSAL_CONCURRENCY: usize = 8;

/// User settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// URL of the site catalog JSON.
    pub config_url: Option<String>,
    /// Local site catalog, used instead of `config_url` when set.
    pub sites_file: Option<PathBuf>,
    /// Providers searched at once.
    pub concurrency_limit: usize,
    /// Folder listings requested at once per drive client.
    pub traversal_concurrency: usize,
    pub request_timeout_secs: u64,
    /// Last selected site key.
    pub current_site: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_url: None,
            sites_file: None,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            traversal_concurrency: DEFAULT_TRAVERSAL_CONCURRENCY,
            request_timeout_secs: 20,
            current_site: None,
        }
    }
}

impl Settings {
    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings.normalized())
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self> {
        Self::load(&settings_path())
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Set the search concurrency ceiling, clamped to at least 1.
    pub fn set_concurrency_limit(&mut self, limit: usize) {
        self.concurrency_limit = limit.max(1);
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn normalized(mut self) -> Self {
        self.concurrency_limit = self.concurrency_limit.max(1);
        self.traversal_concurrency = self.traversal_concurrency.max(1);
        self
    }
}

/// Directory holding every configuration file.
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("panplay")
}

/// Path of `config.toml`.
#[must_use]
pub fn settings_path() -> PathBuf {
    config_dir().join("config.toml")
}
