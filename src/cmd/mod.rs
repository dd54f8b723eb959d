mod config;
mod detail;
mod play;
mod search;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use panplay::config::{config_dir, FileConfigStore, Settings};
use panplay::Aggregator;

pub use config::cmd_config;
pub use detail::cmd_detail;
pub use play::cmd_play;
pub use search::cmd_search;

/// Settings and credential store resolved from the command line.
pub struct Context {
    pub settings_path: PathBuf,
    /// Settings as saved on disk.
    pub settings: Settings,
    /// `--sites` override; never written back to `config.toml`.
    pub sites: Option<PathBuf>,
    pub store: Arc<FileConfigStore>,
}

impl Context {
    pub fn load(config_dir_override: Option<PathBuf>, sites: Option<PathBuf>) -> Result<Self> {
        let dir = config_dir_override.unwrap_or_else(config_dir);
        let settings_path = dir.join("config.toml");
        let settings = Settings::load(&settings_path)
            .with_context(|| format!("failed to load {}", settings_path.display()))?;
        Ok(Self {
            settings_path,
            settings,
            sites,
            store: Arc::new(FileConfigStore::new(dir)),
        })
    }

    pub async fn aggregator(&self) -> Result<Aggregator> {
        let mut settings = self.settings.clone();
        if let Some(path) = &self.sites {
            settings.sites_file = Some(path.clone());
        }
        Aggregator::from_settings(&settings, self.store.clone())
            .await
            .context("failed to load the site catalog")
    }
}
