//! Lazily created drive clients.
//!
//! One client per drive for the life of the process. The first caller loads
//! the credential and builds the client; concurrent first callers wait on the
//! same initialization instead of racing.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use super::quark::{QuarkDrive, QuarkOptions, QUARK_ENDPOINT};
use super::transport::HttpTransport;
use super::DriveKind;
use crate::config::ConfigStore;
use crate::error::{Error, Result};
use crate::http_client::HttpClient;

/// Builds a Quark client from a session cookie.
pub type QuarkFactory = Box<dyn Fn(&str) -> Result<QuarkDrive> + Send + Sync>;

pub struct DriveRegistry {
    store: Arc<dyn ConfigStore>,
    quark_factory: QuarkFactory,
    quark: OnceCell<Arc<QuarkDrive>>,
}

impl DriveRegistry {
    /// Registry whose clients talk to the real drive APIs.
    #[must_use]
    pub fn new(client: HttpClient, store: Arc<dyn ConfigStore>, options: QuarkOptions) -> Self {
        Self::with_factory(
            store,
            Box::new(move |cookie| {
                let transport = HttpTransport::new(client.clone(), QUARK_ENDPOINT)?;
                QuarkDrive::new(Arc::new(transport), cookie, options.clone())
            }),
        )
    }

    #[must_use]
    pub fn with_factory(store: Arc<dyn ConfigStore>, quark_factory: QuarkFactory) -> Self {
        Self {
            store,
            quark_factory,
            quark: OnceCell::new(),
        }
    }

    /// Credential store the clients were loaded from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// The Quark client, created on first use.
    pub async fn quark(&self) -> Result<Arc<QuarkDrive>> {
        self.quark
            .get_or_try_init(move || async move {
                let drive = DriveKind::Quark.id();
                let credential = self
                    .store
                    .get_config(drive)
                    .await?
                    .filter(|c| !c.cookie.trim().is_empty())
                    .ok_or_else(|| Error::NotConfigured {
                        drive: drive.to_string(),
                    })?;
                info!(drive, "Creating drive client");
                (self.quark_factory)(&credential.cookie).map(Arc::new)
            })
            .await
            .cloned()
    }

    /// The Quark client if it was already created.
    #[must_use]
    pub fn loaded_quark(&self) -> Option<Arc<QuarkDrive>> {
        self.quark.get().cloned()
    }
}
