//! Client-side synchronization core.
//!
//! Everything here is written against the [`Collection`](crate::store::Collection) and
//! [`AssignmentStore`](crate::store::AssignmentStore) ports and never returns errors from
//! its public operations: failures end up as messages in list state or reconcile reports.

mod controller;
mod debounce;
mod filters;
mod grouping;
mod lifecycle;
mod reconciler;

pub use controller::{ListController, ListResult, ListState};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use filters::{FilterPatch, FilterState, DEFAULT_LIMIT, MAX_LIMIT, SEARCH_KEY};
pub use grouping::{flatten_grouped, group_users};
pub use lifecycle::{InFlightGuard, InFlightSet, RequestLifecycle, RequestTicket};
pub use reconciler::{AssignmentReconciler, ReadModelRefresh, ReconcileReport};
