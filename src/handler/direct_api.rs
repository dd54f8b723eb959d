//! Direct API variant: JSON CMS endpoints queried with `ac=detail`.
//!
//! Search: `GET {api}?ac=detail&wd=<keyword>`
//! Detail: `GET {api}?ac=detail&ids=<id>`
//!
//! Both expect a JSON object with a `list` array.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::ProviderHandler;
use crate::error::{Error, Result};
use crate::http_client::{ensure_success, HttpClient, SEARCH_TIMEOUT};
use crate::provider::{DetailListing, Listing, Provider, ProtocolVariant, VodDetail, VodItem};

pub struct DirectApiHandler {
    client: HttpClient,
}

impl DirectApiHandler {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    async fn get(
        &self,
        provider: &Provider,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        if provider.api.is_empty() {
            return Err(Error::InvalidInput(format!(
                "provider \"{}\" has no api address",
                provider.name
            )));
        }
        let response = self
            .client
            .inner()
            .get(&provider.api)
            .query(query)
            .timeout(timeout)
            .send()
            .await?;
        let response = ensure_success(&provider.api, response)?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn parse_listing(body: &[u8]) -> Result<Vec<VodItem>> {
    let listing: Listing = serde_json::from_slice(body)?;
    Ok(listing.list)
}

fn parse_detail(body: &[u8]) -> Result<VodDetail> {
    let listing: DetailListing = serde_json::from_slice(body)?;
    listing.into_first()
}

#[async_trait]
impl ProviderHandler for DirectApiHandler {
    fn variant(&self) -> ProtocolVariant {
        ProtocolVariant::DirectApi
    }

    #[instrument(skip(self, provider), fields(provider = %provider.name))]
    async fn search(&self, provider: &Provider, keyword: &str) -> Result<Vec<VodItem>> {
        let body = self
            .get(provider, &[("ac", "detail"), ("wd", keyword)], SEARCH_TIMEOUT)
            .await?;
        let items = parse_listing(&body)?;
        debug!(count = items.len(), "Direct API search done");
        Ok(items)
    }

    async fn detail(&self, provider: &Provider, id: &str) -> Result<VodDetail> {
        let body = self
            .get(provider, &[("ac", "detail"), ("ids", id)], self.client.timeout())
            .await?;
        parse_detail(&body)
    }
}
