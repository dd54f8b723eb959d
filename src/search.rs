//! Search Dispatcher
//!
//! Fans one keyword out to every searchable provider with a bounded number of
//! requests in flight. A provider that fails or hangs only costs its own slot:
//! its error is logged and counted, never returned to the caller.
//!
//! Results are delivered in arrival order, not catalog order.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::handler::HandlerRegistry;
use crate::provider::{Provider, SearchResult, VodItem};

/// Default number of providers queried at once.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 3;

/// A pending (provider, keyword) pair, consumed by exactly one worker.
#[derive(Debug, Clone, Copy)]
pub struct SearchTask<'a> {
    pub provider: &'a Provider,
    pub keyword: &'a str,
}

/// Counters of a finished search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Searchable providers queried.
    pub total: usize,
    /// Providers whose search returned without error.
    pub succeeded: usize,
    /// Providers whose search failed.
    pub failed: usize,
    /// Items delivered to the result callback.
    pub items: usize,
}

pub struct SearchDispatcher {
    handlers: Arc<HandlerRegistry>,
    concurrency_limit: usize,
}

impl SearchDispatcher {
    /// Create a dispatcher; `concurrency_limit` is clamped to at least 1.
    #[must_use]
    pub fn new(handlers: Arc<HandlerRegistry>, concurrency_limit: usize) -> Self {
        Self {
            handlers,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    #[must_use]
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Change the ceiling for subsequent searches (minimum 1).
    pub fn set_concurrency_limit(&mut self, limit: usize) {
        self.concurrency_limit = limit.max(1);
    }

    async fn run(&self, task: SearchTask<'_>) -> Result<Vec<VodItem>> {
        self.handlers.dispatch(task.provider, task.keyword).await
    }

    /// Search every searchable provider for `keyword`.
    ///
    /// `on_result` fires once per provider that returned at least one item.
    /// `on_progress` fires after every task, success or failure, with
    /// `(completed, total)`; with no searchable provider it fires once with
    /// `(0, 0)`.
    ///
    /// Only an empty keyword is an error; provider failures are absorbed.
    pub async fn search<R, P>(
        &self,
        providers: &[Provider],
        keyword: &str,
        mut on_result: R,
        mut on_progress: P,
    ) -> Result<SearchSummary>
    where
        R: FnMut(&Provider, Vec<SearchResult>),
        P: FnMut(usize, usize),
    {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::InvalidInput("search keyword is empty".into()));
        }

        let mut pending: VecDeque<SearchTask<'_>> = providers
            .iter()
            .filter(|p| p.searchable)
            .map(|provider| SearchTask { provider, keyword })
            .collect();
        let total = pending.len();
        let mut summary = SearchSummary {
            total,
            ..SearchSummary::default()
        };

        if total == 0 {
            on_progress(0, 0);
            return Ok(summary);
        }

        info!(keyword, total, limit = self.concurrency_limit, "Starting search");

        let mut in_flight = FuturesUnordered::new();
        let mut completed = 0;
        loop {
            while in_flight.len() < self.concurrency_limit {
                let Some(task) = pending.pop_front() else { break };
                debug!(provider = %task.provider.name, "Search task started");
                in_flight.push(async move { (task.provider, self.run(task).await) });
            }

            let Some((provider, outcome)) = in_flight.next().await else {
                break;
            };
            completed += 1;

            match outcome {
                Ok(items) => {
                    summary.succeeded += 1;
                    if !items.is_empty() {
                        summary.items += items.len();
                        let results = items
                            .into_iter()
                            .map(|item| SearchResult::new(item, provider))
                            .collect();
                        on_result(provider, results);
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(provider = %provider.name, error = %e, "Search failed");
                }
            }

            on_progress(completed, total);
            debug!("Search progress: {completed}/{total}");
        }

        info!(
            keyword,
            succeeded = summary.succeeded,
            failed = summary.failed,
            items = summary.items,
            "Search finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ProviderHandler;
    use crate::provider::ProtocolVariant;
    use async_trait::async_trait;
    use serde_json::Map;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Handler whose behaviour is encoded in the provider's `api` field:
    /// `"<delay_ms>:<items>"` or `"<delay_ms>:fail"`.
    #[derive(Default)]
    struct ScriptedHandler {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ProviderHandler for ScriptedHandler {
        fn variant(&self) -> ProtocolVariant {
            ProtocolVariant::DirectApi
        }

        async fn search(&self, provider: &Provider, _keyword: &str) -> Result<Vec<VodItem>> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let (delay, outcome) = provider.api.split_once(':').unwrap();
            tokio::time::sleep(Duration::from_millis(delay.parse().unwrap())).await;
            self.current.fetch_sub(1, Ordering::SeqCst);

            if outcome == "fail" {
                return Err(Error::protocol("scripted failure"));
            }
            let count: usize = outcome.parse().unwrap();
            Ok((0..count)
                .map(|i| VodItem {
                    vod_id: format!("{}-{i}", provider.key),
                    vod_name: format!("item {i}"),
                    vod_pic: String::new(),
                    vod_remarks: String::new(),
                    extra: Map::new(),
                })
                .collect())
        }
    }

    fn provider(key: &str, script: &str) -> Provider {
        Provider {
            key: key.into(),
            name: format!("Site {key}"),
            api: script.into(),
            variant: ProtocolVariant::DirectApi,
            searchable: true,
        }
    }

    fn dispatcher(limit: usize) -> (SearchDispatcher, Arc<ScriptedHandler>) {
        let handler = Arc::new(ScriptedHandler::default());
        let registry = HandlerRegistry::empty().with_handler(handler.clone());
        (SearchDispatcher::new(Arc::new(registry), limit), handler)
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_limit() {
        for limit in 1..=4 {
            for count in 0..=6 {
                let (dispatcher, handler) = dispatcher(limit);
                let providers: Vec<_> = (0..count)
                    .map(|i| provider(&i.to_string(), &format!("{}:1", 5 + (i * 7) % 11)))
                    .collect();
                let mut progress = Vec::new();
                dispatcher
                    .search(&providers, "kw", |_, _| {}, |done, total| progress.push((done, total)))
                    .await
                    .unwrap();

                assert!(handler.peak.load(Ordering::SeqCst) <= limit);
                assert_eq!(
                    handler.peak.load(Ordering::SeqCst),
                    limit.min(count),
                    "limit {limit}, count {count}"
                );
                if count == 0 {
                    assert_eq!(progress, vec![(0, 0)]);
                } else {
                    let expected: Vec<_> = (1..=count).map(|d| (d, count)).collect();
                    assert_eq!(progress, expected);
                }
            }
        }
    }

    #[tokio::test]
    async fn result_callback_fires_once_per_non_empty_provider() {
        let (dispatcher, _) = dispatcher(2);
        let providers = vec![
            provider("a", "5:2"),
            provider("b", "5:0"),
            provider("c", "5:fail"),
            provider("d", "5:1"),
        ];
        let mut seen = Vec::new();
        let summary = dispatcher
            .search(
                &providers,
                "kw",
                |p, results| {
                    assert!(results.iter().all(|r| r.source_key == p.key));
                    assert!(results.iter().all(|r| r.source_name == p.name));
                    seen.push((p.key.clone(), results.len()));
                },
                |_, _| {},
            )
            .await
            .unwrap();

        seen.sort();
        assert_eq!(seen, vec![("a".to_string(), 2), ("d".to_string(), 1)]);
        assert_eq!(
            summary,
            SearchSummary {
                total: 4,
                succeeded: 3,
                failed: 1,
                items: 3
            }
        );
    }

    #[tokio::test]
    async fn results_arrive_in_completion_order() {
        let (dispatcher, _) = dispatcher(3);
        let providers = vec![
            provider("slow", "60:1"),
            provider("fast", "5:1"),
            provider("mid", "30:1"),
        ];
        let mut order = Vec::new();
        dispatcher
            .search(&providers, "kw", |p, _| order.push(p.key.clone()), |_, _| {})
            .await
            .unwrap();
        assert_eq!(order, vec!["fast", "mid", "slow"]);
    }

    #[tokio::test]
    async fn skips_unsearchable_and_rejects_empty_keyword() {
        let (dispatcher, handler) = dispatcher(3);
        let mut hidden = provider("x", "5:1");
        hidden.searchable = false;
        let mut progress = Vec::new();
        let summary = dispatcher
            .search(&[hidden.clone()], "kw", |_, _| {}, |d, t| progress.push((d, t)))
            .await
            .unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(progress, vec![(0, 0)]);
        assert_eq!(handler.peak.load(Ordering::SeqCst), 0);

        let err = dispatcher
            .search(&[hidden], "  ", |_, _| {}, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unsupported_variant_counts_as_failure() {
        let (dispatcher, _) = dispatcher(1);
        let mut odd = provider("odd", "5:1");
        odd.variant = ProtocolVariant::Other(8);
        let mut progress = Vec::new();
        let summary = dispatcher
            .search(&[odd, provider("ok", "5:1")], "kw", |_, _| {}, |d, t| progress.push((d, t)))
            .await
            .unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(progress, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn limit_is_clamped_to_one() {
        let (mut dispatcher, _) = dispatcher(0);
        assert_eq!(dispatcher.concurrency_limit(), 1);
        dispatcher.set_concurrency_limit(0);
        assert_eq!(dispatcher.concurrency_limit(), 1);
        dispatcher.set_concurrency_limit(5);
        assert_eq!(dispatcher.concurrency_limit(), 5);
    }
}
