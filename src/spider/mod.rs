//! Scrapers reached through secondary dispatch.
//!
//! A provider with [`ProtocolVariant::SecondaryDispatch`](crate::provider::ProtocolVariant)
//! stores a symbolic scraper name in its `api` field. The [`SpiderRegistry`]
//! maps that name to a [`Spider`] implementation; unknown names fail with
//! [`Error::UnsupportedSpider`].

pub mod wogg;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::provider::{VodDetail, VodItem};

pub use wogg::WoggSpider;

/// A site-specific scraper with search and detail entry points.
#[async_trait]
pub trait Spider: Send + Sync {
    /// Symbolic name used in the catalog (e.g., `"csp_WoGGGuard"`).
    fn name(&self) -> &'static str;

    /// Search the site, returning one page of normalized items.
    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<VodItem>>;

    /// Fetch the full record of one item.
    async fn detail(&self, id: &str) -> Result<VodDetail>;
}

/// Name-keyed set of scrapers.
pub struct SpiderRegistry {
    spiders: Vec<Arc<dyn Spider>>,
}

impl SpiderRegistry {
    /// Registry with every built-in scraper.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self::with_spiders(vec![Arc::new(WoggSpider::new(client))])
    }

    #[must_use]
    pub fn with_spiders(spiders: Vec<Arc<dyn Spider>>) -> Self {
        Self { spiders }
    }

    /// Look up a scraper by its symbolic name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Spider>> {
        self.spiders
            .iter()
            .find(|s| s.name() == name)
            .cloned()
            .ok_or_else(|| Error::UnsupportedSpider(name.to_string()))
    }

    /// Names of all registered scrapers.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.spiders.iter().map(|s| s.name())
    }
}
