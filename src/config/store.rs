//! Drive credential storage.
//!
//! Drive clients only ever need the session cookie, but the stored object is
//! kept opaque so fields written by other tools survive a round trip.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Stored credential of one drive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveCredential {
    /// Session cookie string sent with every drive request.
    #[serde(default)]
    pub cookie: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DriveCredential {
    #[must_use]
    pub fn from_cookie(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
            extra: Map::new(),
        }
    }
}

/// Key-value access to drive credentials, keyed by drive id (`"quark"`, ...).
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Stored credential of `drive`, if any.
    async fn get_config(&self, drive: &str) -> Result<Option<DriveCredential>>;

    /// Replace the stored credential of `drive`.
    async fn save_config(&self, drive: &str, credential: &DriveCredential) -> Result<()>;
}

/// In-memory store, for tests and embedding.
#[derive(Default)]
pub struct MemoryConfigStore {
    configs: RwLock<HashMap<String, DriveCredential>>,
}

impl MemoryConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one credential.
    #[must_use]
    pub fn with_config(drive: &str, credential: DriveCredential) -> Self {
        let mut configs = HashMap::new();
        configs.insert(drive.to_string(), credential);
        Self {
            configs: RwLock::new(configs),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get_config(&self, drive: &str) -> Result<Option<DriveCredential>> {
        Ok(self.configs.read().await.get(drive).cloned())
    }

    async fn save_config(&self, drive: &str, credential: &DriveCredential) -> Result<()> {
        self.configs
            .write()
            .await
            .insert(drive.to_string(), credential.clone());
        Ok(())
    }
}

/// One JSON file per drive (`quark.json`, ...) with an in-memory cache in front.
pub struct FileConfigStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, DriveCredential>>,
}

impl FileConfigStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Store in the default configuration directory.
    #[must_use]
    pub fn open_default() -> Self {
        Self::new(super::config_dir())
    }

    fn path_for(&self, drive: &str) -> Result<PathBuf> {
        let valid = !drive.is_empty()
            && drive
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::InvalidInput(format!("invalid drive id: {drive:?}")));
        }
        Ok(self.dir.join(format!("{drive}.json")))
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get_config(&self, drive: &str) -> Result<Option<DriveCredential>> {
        if let Some(cached) = self.cache.read().await.get(drive) {
            return Ok(Some(cached.clone()));
        }

        let path = self.path_for(drive)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(drive, path = %path.display(), "No stored credential");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let credential: DriveCredential = serde_json::from_str(&content)?;
        self.cache
            .write()
            .await
            .insert(drive.to_string(), credential.clone());
        Ok(Some(credential))
    }

    async fn save_config(&self, drive: &str, credential: &DriveCredential) -> Result<()> {
        let path = self.path_for(drive)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, serde_json::to_string_pretty(credential)?).await?;
        self.cache
            .write()
            .await
            .insert(drive.to_string(), credential.clone());
        info!(drive, path = %path.display(), "Saved drive credential");
        Ok(())
    }
}
