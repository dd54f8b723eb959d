//! Aggregator: the catalog, search dispatcher and share-link resolver behind
//! one handle.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{ConfigStore, Settings, SiteCatalog};
use crate::drive::{DriveRegistry, QuarkOptions, ShareLinkResolver};
use crate::error::{Error, Result};
use crate::handler::HandlerRegistry;
use crate::http_client::HttpClient;
use crate::provider::{PlayUrl, Provider, SearchResult, VodDetail};
use crate::search::{SearchDispatcher, SearchSummary};

pub struct Aggregator {
    catalog: SiteCatalog,
    handlers: Arc<HandlerRegistry>,
    dispatcher: SearchDispatcher,
    resolver: ShareLinkResolver,
}

impl Aggregator {
    #[must_use]
    pub fn new(
        catalog: SiteCatalog,
        handlers: Arc<HandlerRegistry>,
        concurrency_limit: usize,
        resolver: ShareLinkResolver,
    ) -> Self {
        let dispatcher = SearchDispatcher::new(handlers.clone(), concurrency_limit);
        Self {
            catalog,
            handlers,
            dispatcher,
            resolver,
        }
    }

    /// Build everything from user settings, loading the site catalog from
    /// `sites_file` or, failing that, `config_url`.
    pub async fn from_settings(settings: &Settings, store: Arc<dyn ConfigStore>) -> Result<Self> {
        let client = HttpClient::with_timeout(settings.request_timeout())?;
        let handlers = Arc::new(HandlerRegistry::new(client.clone()));

        let catalog = match (&settings.sites_file, &settings.config_url) {
            (Some(path), _) => SiteCatalog::load_file(path, &handlers)?,
            (None, Some(url)) => SiteCatalog::fetch(&client, url, &handlers).await?,
            (None, None) => {
                return Err(Error::InvalidInput(
                    "no site catalog configured: set config_url or sites_file".into(),
                ))
            }
        };

        Ok(Self::new(
            catalog,
            handlers,
            settings.concurrency_limit,
            build_resolver(client, settings, store),
        ))
    }

    #[must_use]
    pub fn catalog(&self) -> &SiteCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn resolver(&self) -> &ShareLinkResolver {
        &self.resolver
    }

    /// Search every searchable site. See [`SearchDispatcher::search`].
    pub async fn search<R, P>(&self, keyword: &str, on_result: R, on_progress: P) -> Result<SearchSummary>
    where
        R: FnMut(&Provider, Vec<SearchResult>),
        P: FnMut(usize, usize),
    {
        self.dispatcher
            .search(self.catalog.sites(), keyword, on_result, on_progress)
            .await
    }

    /// Detail of `id` on site `site_key`, with share links resolved.
    ///
    /// When the site returns raw share links, `vod_play_url` is replaced by
    /// the resolved play lists and `vod_play_from` by the matching labels.
    pub async fn detail(&self, site_key: &str, id: &str) -> Result<VodDetail> {
        let provider = self.catalog.get(site_key)?;
        let mut detail = self.handlers.detail(provider, id).await?;

        if let PlayUrl::ShareLinks(links) = &detail.vod_play_url {
            info!(site = site_key, id, links = links.len(), "Resolving share links");
            let labels = self.resolver.resolve_play_labels(links);
            let urls = self.resolver.resolve_play_urls(links).await;
            detail.vod_play_from = Some(labels);
            detail.vod_play_url = PlayUrl::Ready(urls);
        } else {
            debug!(site = site_key, id, "Detail play URL is ready");
        }
        Ok(detail)
    }

}

/// Share-link resolver whose drive clients follow `settings` and read their
/// credentials from `store`. Needs no site catalog.
#[must_use]
pub fn build_resolver(client: HttpClient, settings: &Settings, store: Arc<dyn ConfigStore>) -> ShareLinkResolver {
    let options = QuarkOptions {
        traversal_concurrency: settings.traversal_concurrency,
        ..QuarkOptions::default()
    };
    ShareLinkResolver::new(Arc::new(DriveRegistry::new(client, store, options)))
}
