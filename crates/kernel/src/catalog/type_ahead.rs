//! Debounced type-ahead search.
//!
//! Every input change cancels the request started for the previous input,
//! waits out the debounce interval and then asks the [`SuggestionSource`].
//! Results are published on a `watch` channel only while they still belong
//! to the latest input, so a slow response for an old query can never
//! replace the suggestions of a newer one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::filter::{FilterParams, normalize_search_text};
use super::service::{CatalogError, CatalogService, SearchShape};
use super::view::ProductSummary;
use crate::locale::Locale;

/// Default debounce interval between the last keystroke and the request.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Something that answers type-ahead queries.
#[async_trait]
pub trait SuggestionSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Error: std::fmt::Display + Send + 'static;

    async fn suggest(&self, query: &str) -> Result<Vec<Self::Item>, Self::Error>;
}

/// Suggestions for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestions<T> {
    /// Normalized query the items answer (empty when cleared).
    pub query: String,
    pub items: Vec<T>,
}

impl<T> Default for Suggestions<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            items: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Latest {
    generation: u64,
    cancel: Option<CancellationToken>,
}

/// Debounced, cancel-previous type-ahead driver.
pub struct TypeAhead<S: SuggestionSource> {
    source: Arc<S>,
    debounce: Duration,
    latest: Arc<Mutex<Latest>>,
    tx: Arc<watch::Sender<Suggestions<S::Item>>>,
}

impl<S: SuggestionSource> TypeAhead<S> {
    pub fn new(source: Arc<S>, debounce: Duration) -> Self {
        let (tx, _rx) = watch::channel(Suggestions::default());
        Self {
            source,
            debounce,
            latest: Arc::new(Mutex::new(Latest::default())),
            tx: Arc::new(tx),
        }
    }

    /// Receiver that observes every published set of suggestions.
    pub fn subscribe(&self) -> watch::Receiver<Suggestions<S::Item>> {
        self.tx.subscribe()
    }

    /// The suggestions currently shown.
    pub fn current(&self) -> Suggestions<S::Item> {
        self.tx.borrow().clone()
    }

    /// Handle a change of the input text.
    ///
    /// Input too short to search clears the suggestions immediately and
    /// returns `None`; otherwise the spawned request task is returned.
    pub fn input(&self, text: &str) -> Option<JoinHandle<()>> {
        let query = normalize_search_text(text);

        let mut latest = self.latest.lock();
        latest.generation += 1;
        if let Some(previous) = latest.cancel.take() {
            previous.cancel();
        }

        let Some(query) = query else {
            self.tx.send_replace(Suggestions::default());
            return None;
        };

        let token = CancellationToken::new();
        latest.cancel = Some(token.clone());
        let generation = latest.generation;
        drop(latest);

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.latest);
        let tx = Arc::clone(&self.tx);
        let debounce = self.debounce;

        Some(tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    debug!(query = %query, "type-ahead request cancelled");
                    return;
                }
                outcome = async {
                    tokio::time::sleep(debounce).await;
                    source.suggest(&query).await
                } => outcome,
            };

            match outcome {
                Ok(items) => {
                    let latest = shared.lock();
                    if latest.generation != generation {
                        debug!(query = %query, "discarding stale suggestions");
                        return;
                    }
                    tx.send_replace(Suggestions { query, items });
                }
                Err(e) => warn!(query = %query, error = %e, "type-ahead request failed"),
            }
        }))
    }

    /// Cancel any outstanding request.
    pub fn cancel(&self) {
        let mut latest = self.latest.lock();
        latest.generation += 1;
        if let Some(token) = latest.cancel.take() {
            token.cancel();
        }
    }
}

impl<S: SuggestionSource> Drop for TypeAhead<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Quick-search suggestions from the catalog in a fixed locale.
pub struct CatalogSuggestions {
    service: CatalogService,
    locale: Locale,
}

impl CatalogSuggestions {
    pub fn new(service: CatalogService, locale: Locale) -> Self {
        Self { service, locale }
    }
}

#[async_trait]
impl SuggestionSource for CatalogSuggestions {
    type Item = ProductSummary;
    type Error = CatalogError;

    async fn suggest(&self, query: &str) -> Result<Vec<ProductSummary>, CatalogError> {
        let params = FilterParams {
            q: Some(query.to_string()),
            locale: Some(self.locale.code().to_string()),
            ..Default::default()
        };
        let request = SearchShape::Quick.request(&params, self.service.locales());
        Ok(self.service.search(&request).await?.results)
    }
}
