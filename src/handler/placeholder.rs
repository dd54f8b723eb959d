//! Placeholder variant: reserved for an HTML scraping strategy.

use async_trait::async_trait;
use tracing::debug;

use super::ProviderHandler;
use crate::error::Result;
use crate::provider::{Provider, ProtocolVariant, VodItem};

/// Deliberate no-op: searches succeed with no items, details are unsupported.
pub struct PlaceholderHandler;

#[async_trait]
impl ProviderHandler for PlaceholderHandler {
    fn variant(&self) -> ProtocolVariant {
        ProtocolVariant::Placeholder
    }

    async fn search(&self, provider: &Provider, keyword: &str) -> Result<Vec<VodItem>> {
        debug!(provider = %provider.name, keyword, "Placeholder handler returns no items");
        Ok(Vec::new())
    }
}
