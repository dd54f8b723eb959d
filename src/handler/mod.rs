//! Provider Handler Registry.
//!
//! Maps a provider's [`ProtocolVariant`] to the [`ProviderHandler`] that knows
//! how to search it and fetch details from it:
//!
//! | Variant | Handler | Detail |
//! |---------|---------|--------|
//! | 1 direct API | [`DirectApiHandler`] | yes |
//! | 2 placeholder | [`PlaceholderHandler`] | no |
//! | 3 secondary dispatch | [`SpiderHandler`] | yes |
//!
//! Variants without a registered handler fail with [`Error::UnsupportedType`].
//! Handlers that cannot fetch details fail with [`Error::UnsupportedDetail`].

pub mod direct_api;
pub mod placeholder;
pub mod spider;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::provider::{Provider, ProtocolVariant, VodDetail, VodItem};
use crate::spider::SpiderRegistry;

pub use direct_api::DirectApiHandler;
pub use placeholder::PlaceholderHandler;
pub use spider::SpiderHandler;

/// Query protocol of one provider variant.
#[async_trait]
pub trait ProviderHandler: Send + Sync {
    /// Variant this handler serves.
    fn variant(&self) -> ProtocolVariant;

    /// Search `provider` for `keyword`.
    async fn search(&self, provider: &Provider, keyword: &str) -> Result<Vec<VodItem>>;

    /// Fetch the full record `id` from `provider`. Unsupported by default.
    async fn detail(&self, provider: &Provider, id: &str) -> Result<VodDetail> {
        let _ = id;
        Err(Error::UnsupportedDetail(provider.variant.tag()))
    }
}

/// Variant-keyed set of handlers.
pub struct HandlerRegistry {
    handlers: HashMap<ProtocolVariant, Arc<dyn ProviderHandler>>,
}

impl HandlerRegistry {
    /// Registry with the three built-in variants.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        let spiders = Arc::new(SpiderRegistry::new(client.clone()));
        Self::empty()
            .with_handler(Arc::new(DirectApiHandler::new(client)))
            .with_handler(Arc::new(PlaceholderHandler))
            .with_handler(Arc::new(SpiderHandler::new(spiders)))
    }

    /// Registry without any handler.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler`, replacing any handler for the same variant.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn ProviderHandler>) -> Self {
        self.handlers.insert(handler.variant(), handler);
        self
    }

    /// Whether `variant` has a handler.
    #[must_use]
    pub fn supports(&self, variant: ProtocolVariant) -> bool {
        self.handlers.contains_key(&variant)
    }

    /// Check every provider's variant up front.
    ///
    /// Returns the providers without a handler, each logged at `warn`. They
    /// still fail individually with [`Error::UnsupportedType`] when dispatched.
    pub fn validate<'a>(&self, providers: &'a [Provider]) -> Vec<&'a Provider> {
        let unsupported: Vec<_> = providers
            .iter()
            .filter(|p| !self.supports(p.variant))
            .collect();
        for provider in &unsupported {
            warn!(
                site = %provider.key,
                variant = %provider.variant,
                "Site has an unsupported type and will fail every request"
            );
        }
        unsupported
    }

    fn handler(&self, provider: &Provider) -> Result<&Arc<dyn ProviderHandler>> {
        self.handlers
            .get(&provider.variant)
            .ok_or(Error::UnsupportedType(provider.variant.tag()))
    }

    /// Search `provider` through its variant's handler.
    pub async fn dispatch(&self, provider: &Provider, keyword: &str) -> Result<Vec<VodItem>> {
        let handler = self.handler(provider)?;
        debug!(provider = %provider.name, variant = %provider.variant, "Dispatching search");
        handler.search(provider, keyword).await
    }

    /// Fetch detail `id` from `provider` through its variant's handler.
    pub async fn detail(&self, provider: &Provider, id: &str) -> Result<VodDetail> {
        let handler = self.handler(provider)?;
        debug!(provider = %provider.name, variant = %provider.variant, id, "Dispatching detail");
        handler.detail(provider, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(variant: ProtocolVariant) -> Provider {
        Provider {
            key: "k".into(),
            name: "Site".into(),
            api: "csp_Unknown".into(),
            variant,
            searchable: true,
        }
    }

    #[tokio::test]
    async fn unregistered_variant_is_unsupported_type() {
        let registry = HandlerRegistry::new(HttpClient::new().unwrap());
        let err = registry
            .dispatch(&provider(ProtocolVariant::Other(42)), "kw")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(42)));
        assert!(err.to_string().contains("unsupported type"));
    }

    #[tokio::test]
    async fn placeholder_searches_empty_but_has_no_detail() {
        let registry = HandlerRegistry::new(HttpClient::new().unwrap());
        let p = provider(ProtocolVariant::Placeholder);
        assert!(registry.dispatch(&p, "kw").await.unwrap().is_empty());
        let err = registry.detail(&p, "1").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedDetail(2)));
    }

    #[tokio::test]
    async fn secondary_dispatch_rejects_unknown_scraper() {
        let registry = HandlerRegistry::new(HttpClient::new().unwrap());
        let p = provider(ProtocolVariant::SecondaryDispatch);
        let err = registry.dispatch(&p, "kw").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedSpider(ref name) if name == "csp_Unknown"));
        let err = registry.detail(&p, "1").await.unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn validate_reports_each_unknown_variant() {
        let registry = HandlerRegistry::new(HttpClient::new().unwrap());
        let providers = vec![
            provider(ProtocolVariant::DirectApi),
            provider(ProtocolVariant::Other(5)),
            provider(ProtocolVariant::Other(0)),
        ];
        let unsupported: Vec<_> = registry
            .validate(&providers)
            .into_iter()
            .map(|p| p.variant.tag())
            .collect();
        assert_eq!(unsupported, vec![5, 0]);
        assert!(registry.validate(&providers[..1]).is_empty());
    }
}
