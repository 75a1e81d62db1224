//! Query dispatch for an interactive catalog view.
//!
//! Queries run on the runtime's worker pool. Every query takes a ticket from a
//! monotonically increasing sequence; a result whose ticket has been
//! superseded by a newer query is discarded so it cannot overwrite fresher
//! results. Filter input is debounced with restart-on-keystroke semantics.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::{
    error::AppResult,
    models::{Page, PageRequest},
    services::catalog::CatalogService,
};

/// Position of a query in issue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryTicket(u64);

#[derive(Debug, Default)]
pub struct QuerySequencer {
    latest: AtomicU64,
}

impl QuerySequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> QueryTicket {
        QueryTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// True while no newer ticket has been issued
    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Releases an input only after a quiet period with no newer input.
#[derive(Debug)]
pub struct FilterDebouncer {
    quiet: Duration,
    generation: AtomicU64,
}

impl FilterDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: AtomicU64::new(0),
        }
    }

    /// Wait out the quiet period. Returns the input if it is still the last
    /// one submitted, `None` if a newer input restarted the timer.
    pub async fn settle<T>(&self, input: T) -> Option<T> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.quiet).await;
        (self.generation.load(Ordering::SeqCst) == generation).then_some(input)
    }
}

/// One open catalog view: sequenced queries plus a debounced search box.
#[derive(Clone)]
pub struct CatalogView {
    catalog: CatalogService,
    sequencer: Arc<QuerySequencer>,
    debouncer: Arc<FilterDebouncer>,
}

impl CatalogView {
    pub fn new(catalog: CatalogService, debounce: Duration) -> Self {
        Self {
            catalog,
            sequencer: Arc::new(QuerySequencer::new()),
            debouncer: Arc::new(FilterDebouncer::new(debounce)),
        }
    }

    /// Run a page query. `Ok(None)` means a newer query was issued meanwhile
    /// and this result is stale. Stale failures are dropped as well.
    pub async fn query(&self, request: PageRequest) -> AppResult<Option<Page>> {
        let ticket = self.sequencer.issue();
        let result = self.catalog.query_page(&request).await;

        if !self.sequencer.is_current(ticket) {
            tracing::debug!(?ticket, ok = result.is_ok(), "Discarding stale catalog query");
            return Ok(None);
        }
        result.map(Some)
    }

    /// Dispatch a page query to the worker pool
    pub fn spawn_query(&self, request: PageRequest) -> JoinHandle<AppResult<Option<Page>>> {
        let view = self.clone();
        tokio::spawn(async move { view.query(request).await })
    }

    /// Debounced search: after the quiet period, query the first page for
    /// `filter` unless a newer search arrived in the meantime.
    pub async fn search(&self, request: PageRequest, filter: String) -> AppResult<Option<Page>> {
        let Some(filter) = self.debouncer.settle(filter).await else {
            return Ok(None);
        };
        self.query(request.with_filter(filter).at_page(0)).await
    }
}
