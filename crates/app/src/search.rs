//! Debounced search suggestions.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use investomart::{catalog::CatalogItem, search::SearchTerm};
use tracing::debug;

use crate::catalog::CatalogService;

/// Quiet period after the last keystroke before suggestions are fetched.
pub const SUGGESTION_DELAY: Duration = Duration::from_millis(300);

/// Fetches suggestions for the latest term typed into a search box.
///
/// Every call to [`SuggestionDebouncer::suggest`] supersedes the calls before
/// it. A superseded call returns `None`, whether it was still waiting out the
/// delay or its request was already in flight.
pub struct SuggestionDebouncer {
    catalog: Arc<dyn CatalogService>,
    delay: Duration,
    generation: AtomicU64,
}

impl fmt::Debug for SuggestionDebouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggestionDebouncer")
            .field("delay", &self.delay)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl SuggestionDebouncer {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self::with_delay(catalog, SUGGESTION_DELAY)
    }

    #[must_use]
    pub fn with_delay(catalog: Arc<dyn CatalogService>, delay: Duration) -> Self {
        Self {
            catalog,
            delay,
            generation: AtomicU64::new(0),
        }
    }

    /// Suggestions for `query`, or `None` if a newer query arrived meanwhile.
    ///
    /// Terms too short to search clear the suggestions at once.
    pub async fn suggest(&self, query: &str) -> Option<Vec<CatalogItem>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if SearchTerm::parse(query).is_err() {
            return Some(Vec::new());
        }

        tokio::time::sleep(self.delay).await;

        if !self.is_current(generation) {
            debug!(query, "suggestion superseded before fetch");

            return None;
        }

        let results = self.catalog.search(query).await;

        if !self.is_current(generation) {
            debug!(query, "discarding stale suggestions");

            return None;
        }

        Some(results)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}
