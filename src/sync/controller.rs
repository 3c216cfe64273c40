//! Filtered list controller.
//!
//! Holds `{data, total_count, loading, error, filters}` for one paginated collection and
//! republishes it on every change through a `watch` channel. A response only lands if the
//! controller is still alive and no newer fetch has been issued since it was sent.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use super::filters::{FilterPatch, FilterState};
use super::lifecycle::{RequestLifecycle, RequestTicket};
use super::reconciler::ReadModelRefresh;
use crate::store::Collection;

/// Snapshot of a list view.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub filters: Arc<FilterState>,
}

impl<T> ListState<T> {
    fn initial(filters: FilterState) -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
            loading: false,
            error: None,
            filters: Arc::new(filters),
        }
    }
}

/// Outcome of one fetch: rows or an error, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub error: Option<String>,
}

impl<T: Clone> From<&ListState<T>> for ListResult<T> {
    fn from(state: &ListState<T>) -> Self {
        Self {
            items: state.data.clone(),
            total_count: state.total_count,
            error: state.error.clone(),
        }
    }
}

/// Controller for one paginated remote collection.
pub struct ListController<C: Collection> {
    collection: Arc<C>,
    defaults: FilterState,
    state: watch::Sender<ListState<C::Row>>,
    lifecycle: RequestLifecycle,
}

impl<C: Collection> ListController<C> {
    /// New controller on page 1 with the default page size. Nothing is fetched until
    /// [`load`](Self::load) or a mutator runs.
    pub fn new(collection: Arc<C>) -> Self {
        Self::with_defaults(collection, FilterState::default())
    }

    /// New controller whose initial (and reset) filters are `defaults`.
    pub fn with_defaults(collection: Arc<C>, defaults: FilterState) -> Self {
        let (state, _) = watch::channel(ListState::initial(defaults.clone()));
        Self {
            collection,
            defaults,
            state,
            lifecycle: RequestLifecycle::new(),
        }
    }

    pub fn collection(&self) -> &Arc<C> {
        &self.collection
    }

    /// Current state.
    pub fn state(&self) -> ListState<C::Row> {
        self.state.borrow().clone()
    }

    pub fn filters(&self) -> Arc<FilterState> {
        Arc::clone(&self.state.borrow().filters)
    }

    pub fn result(&self) -> ListResult<C::Row> {
        ListResult::from(&*self.state.borrow())
    }

    /// Listen for state changes. Every mutation marks the receiver as changed.
    pub fn subscribe(&self) -> watch::Receiver<ListState<C::Row>> {
        self.state.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        !self.lifecycle.is_alive()
    }

    /// Initial fetch with the current filters.
    pub async fn load(&self) {
        self.refetch().await;
    }

    /// Merge `patch` into the filters and fetch.
    ///
    /// Returns `false` without fetching when the merge changes nothing; the filters keep
    /// their identity in that case.
    pub async fn update_filters(&self, patch: FilterPatch) -> bool {
        if self.is_disposed() {
            return false;
        }

        let mut next = None;
        self.state.send_if_modified(|state| match state.filters.merge(&patch) {
            Some(filters) => {
                let filters = Arc::new(filters);
                state.filters = Arc::clone(&filters);
                next = Some(filters);
                true
            }
            None => false,
        });

        match next {
            Some(filters) => {
                self.fetch(filters).await;
                true
            }
            None => false,
        }
    }

    /// Replace the filters with the defaults and fetch.
    pub async fn reset_filters(&self) {
        if self.is_disposed() {
            return;
        }
        let filters = Arc::new(self.defaults.clone());
        self.state.send_modify(|state| state.filters = Arc::clone(&filters));
        self.fetch(filters).await;
    }

    /// Fetch again with the current filters, e.g. after a mutation.
    pub async fn refetch(&self) {
        if self.is_disposed() {
            return;
        }
        let filters = self.filters();
        self.fetch(filters).await;
    }

    /// Stop applying results. In-flight requests still complete but change nothing.
    pub fn dispose(&self) {
        if self.lifecycle.dispose() {
            tracing::debug!(resource = self.collection.resource(), "List controller disposed");
        }
    }

    async fn fetch(&self, filters: Arc<FilterState>) {
        let ticket = self.lifecycle.begin();
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        // Clears `loading` even if this future is dropped before the query resolves.
        let mut guard = LoadingGuard {
            controller: self,
            ticket,
            armed: true,
        };

        let outcome = self.collection.query(&filters).await;
        guard.armed = false;

        if !self.lifecycle.is_current(ticket) {
            tracing::debug!(
                resource = self.collection.resource(),
                "Discarding stale list response"
            );
            return;
        }

        self.state.send_modify(|state| {
            match outcome {
                Ok(page) => {
                    state.data = page.rows;
                    state.total_count = page.total_count;
                    state.error = None;
                }
                Err(e) => {
                    tracing::warn!(
                        resource = self.collection.resource(),
                        "List fetch failed: {}",
                        e
                    );
                    state.data = Vec::new();
                    state.total_count = 0;
                    state.error = Some(e.message());
                }
            }
            state.loading = false;
        });
    }
}

struct LoadingGuard<'a, C: Collection> {
    controller: &'a ListController<C>,
    ticket: RequestTicket,
    armed: bool,
}

impl<C: Collection> Drop for LoadingGuard<'_, C> {
    fn drop(&mut self) {
        if self.armed && self.controller.lifecycle.is_current(self.ticket) {
            self.controller
                .state
                .send_modify(|state| state.loading = false);
        }
    }
}

#[async_trait]
impl<C: Collection> ReadModelRefresh for ListController<C> {
    async fn refresh(&self) {
        self.refetch().await;
    }
}
