//! Assignment reconciler.
//!
//! The store only offers single-record create and a per-user bulk delete, so replacing a
//! user's (office, role) set is done as delete-all-then-recreate:
//!
//! 1. validate the desired set (no remote calls on failure);
//! 2. snapshot the current assignments, for logging only;
//! 3. delete them all, aborting on error before anything is created;
//! 4. create every desired pair concurrently and collect every outcome;
//! 5. refresh the read model and report which pairs failed.
//!
//! Between 3 and 4 the user briefly holds nothing, and a partial failure in 4 is left in
//! place rather than rolled back. Both are reported, never hidden.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use super::lifecycle::InFlightSet;
use crate::errors::AppError;
use crate::models::{Assignment, AssignmentPair, CreateAssignmentRequest};
use crate::store::AssignmentStore;

/// Something that can re-pull its view after a mutation.
#[async_trait]
pub trait ReadModelRefresh: Send + Sync {
    async fn refresh(&self);
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// True only when the stored set now equals the desired set.
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Assignments created by this run.
    #[serde(default)]
    pub created: Vec<Assignment>,
    /// Desired pairs that could not be created.
    #[serde(default)]
    pub failed: Vec<AssignmentPair>,
}

impl ReconcileReport {
    fn rejected(message: String) -> Self {
        Self {
            applied: false,
            message: Some(message),
            created: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Replaces a user's assignment set with a desired one.
pub struct AssignmentReconciler<S: ?Sized> {
    store: Arc<S>,
    refresh: Option<Arc<dyn ReadModelRefresh>>,
    in_flight: InFlightSet,
}

impl<S: AssignmentStore + ?Sized> AssignmentReconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            refresh: None,
            in_flight: InFlightSet::new(),
        }
    }

    /// Refresh `read_model` after every create phase.
    pub fn with_refresh(mut self, read_model: Arc<dyn ReadModelRefresh>) -> Self {
        self.refresh = Some(read_model);
        self
    }

    /// Reconcile and return only whether the desired set was fully applied.
    pub async fn reconcile_ok(&self, user_id: &str, desired: &[AssignmentPair]) -> bool {
        self.reconcile(user_id, desired).await.applied
    }

    /// Make `user_id`'s stored assignments exactly `desired`.
    ///
    /// Never fails: validation errors, a failed delete, and partially failed creates all
    /// come back as a report with `applied == false` and a message.
    pub async fn reconcile(&self, user_id: &str, desired: &[AssignmentPair]) -> ReconcileReport {
        if let Err(e) = validate(user_id, desired) {
            tracing::warn!(user_id, "Rejected assignment update: {}", e.message());
            return ReconcileReport::rejected(e.message());
        }

        let Some(_claim) = self.in_flight.try_acquire(user_id) else {
            tracing::warn!(user_id, "Assignment update already in progress");
            return ReconcileReport::rejected(format!(
                "Assignments for user {} are already being updated",
                user_id
            ));
        };

        // Unknown when the snapshot fails; delete anyway.
        let has_existing = match self.store.list_assignments_for_user(user_id).await {
            Ok(existing) => {
                tracing::debug!(
                    user_id,
                    existing = existing.len(),
                    "Replacing assignments: {:?}",
                    existing.iter().map(Assignment::pair).collect::<Vec<_>>()
                );
                !existing.is_empty()
            }
            Err(e) => {
                tracing::warn!(user_id, "Could not load current assignments: {}", e);
                true
            }
        };

        if has_existing {
            match self.store.delete_all_assignments_for_user(user_id).await {
                Ok(deleted) => {
                    tracing::info!(user_id, deleted = deleted.len(), "Removed existing assignments");
                }
                Err(e) => {
                    tracing::error!(user_id, "Failed to remove existing assignments: {}", e);
                    return ReconcileReport::rejected(format!(
                        "Failed to remove existing assignments: {}",
                        e.message()
                    ));
                }
            }
        }

        let outcomes = join_all(desired.iter().map(|pair| async move {
            let request = CreateAssignmentRequest {
                user_id: user_id.to_string(),
                office_id: pair.office_id.clone(),
                role_id: pair.role_id.clone(),
            };
            (pair, self.store.create_assignment(&request).await)
        }))
        .await;

        let mut created = Vec::new();
        let mut failed = Vec::new();
        let mut reasons = Vec::new();
        for (pair, outcome) in outcomes {
            match outcome {
                Ok(assignment) => created.push(assignment),
                Err(e) => {
                    tracing::warn!(
                        user_id,
                        office_id = %pair.office_id,
                        role_id = %pair.role_id,
                        "Failed to create assignment: {}",
                        e
                    );
                    reasons.push(format!("{}: {}", pair.office_id, e.message()));
                    failed.push(pair.clone());
                }
            }
        }

        if let Some(read_model) = &self.refresh {
            read_model.refresh().await;
        }

        if failed.is_empty() {
            tracing::info!(user_id, assigned = created.len(), "Assignments updated");
            ReconcileReport {
                applied: true,
                message: None,
                created,
                failed,
            }
        } else {
            ReconcileReport {
                applied: false,
                message: Some(format!(
                    "{} of {} assignments failed ({})",
                    failed.len(),
                    desired.len(),
                    reasons.join("; ")
                )),
                created,
                failed,
            }
        }
    }
}

/// Reject empty sets, blank ids, and two entries for the same office.
fn validate(user_id: &str, desired: &[AssignmentPair]) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::Validation("User is required".to_string()));
    }
    if desired.is_empty() {
        return Err(AppError::Validation(
            "At least one office assignment is required".to_string(),
        ));
    }

    let mut offices = HashSet::new();
    for (i, pair) in desired.iter().enumerate() {
        if pair.office_id.trim().is_empty() || pair.role_id.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Assignment {} needs both an office and a role",
                i + 1
            )));
        }
        if !offices.insert(pair.office_id.as_str()) {
            return Err(AppError::Validation(format!(
                "Office {} is listed more than once",
                pair.office_id
            )));
        }
    }
    Ok(())
}
