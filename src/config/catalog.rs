//! Site catalog: the list of providers, fetched from a URL or read from a file.
//!
//! ```json
//! {"sites": [{"key": "cms", "name": "CMS", "api": "https://cms.example/api.php/provide/vod", "type": 1, "searchable": 1}]}
//! ```
//!
//! Every site's protocol variant is checked against the handler registry at
//! load time. A site with an unsupported `type` is reported then and stays in
//! the catalog, where each of its searches fails on its own.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::handler::HandlerRegistry;
use crate::http_client::HttpClient;
use crate::provider::Provider;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    sites: Vec<Provider>,
}

/// Validated, read-only provider list.
#[derive(Debug, Clone, Default)]
pub struct SiteCatalog {
    sites: Vec<Provider>,
}

impl SiteCatalog {
    /// Parse catalog JSON and validate it against `handlers`.
    pub fn from_json(json: &[u8], handlers: &HandlerRegistry) -> Result<Self> {
        let file: CatalogFile = serde_json::from_slice(json)?;
        let unsupported = handlers.validate(&file.sites).len();
        if unsupported > 0 {
            warn!(unsupported, sites = file.sites.len(), "Catalog has sites of unsupported type");
        }
        Ok(Self { sites: file.sites })
    }

    /// Read a catalog file.
    pub fn load_file(path: &Path, handlers: &HandlerRegistry) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let catalog = Self::from_json(&bytes, handlers)?;
        info!(path = %path.display(), sites = catalog.sites.len(), "Loaded site catalog");
        Ok(catalog)
    }

    /// Download a catalog.
    pub async fn fetch(client: &HttpClient, url: &str, handlers: &HandlerRegistry) -> Result<Self> {
        let response = client.fetch(url, client.timeout()).await?;
        let bytes = response.bytes().await?;
        let catalog = Self::from_json(&bytes, handlers)?;
        info!(url, sites = catalog.sites.len(), "Fetched site catalog");
        Ok(catalog)
    }

    #[must_use]
    pub fn sites(&self) -> &[Provider] {
        &self.sites
    }

    /// Provider with catalog key `key`.
    pub fn get(&self, key: &str) -> Result<&Provider> {
        self.sites
            .iter()
            .find(|site| site.key == key)
            .ok_or_else(|| Error::InvalidInput(format!("no site with key \"{key}\"")))
    }

    /// Number of providers that take part in searches.
    #[must_use]
    pub fn searchable_count(&self) -> usize {
        self.sites.iter().filter(|s| s.searchable).count()
    }
}
