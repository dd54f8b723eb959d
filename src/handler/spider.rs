//! Secondary-dispatch variant: forwards to the scraper named by `api`.

use std::sync::Arc;

use async_trait::async_trait;

use super::ProviderHandler;
use crate::error::Result;
use crate::provider::{Provider, ProtocolVariant, VodDetail, VodItem};
use crate::spider::SpiderRegistry;

pub struct SpiderHandler {
    spiders: Arc<SpiderRegistry>,
}

impl SpiderHandler {
    #[must_use]
    pub fn new(spiders: Arc<SpiderRegistry>) -> Self {
        Self { spiders }
    }
}

#[async_trait]
impl ProviderHandler for SpiderHandler {
    fn variant(&self) -> ProtocolVariant {
        ProtocolVariant::SecondaryDispatch
    }

    async fn search(&self, provider: &Provider, keyword: &str) -> Result<Vec<VodItem>> {
        self.spiders.get(&provider.api)?.search(keyword, 1).await
    }

    async fn detail(&self, provider: &Provider, id: &str) -> Result<VodDetail> {
        self.spiders.get(&provider.api)?.detail(id).await
    }
}
