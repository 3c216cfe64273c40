//! User-specific endpoints: the grouped view and assignment management.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{current_revision, error, mutation, success, ApiResult};
use crate::store::Users;
use crate::models::{
    Assignment, CreateAssignmentRequest, GroupedUser, Page, ReplaceAssignmentsRequest,
};
use crate::sync::{group_users, FilterState, ReconcileReport};
use crate::AppState;

/// GET /api/users/grouped - One page of user rows, folded into one entry per user.
///
/// `totalCount` still counts flat rows, so page arithmetic matches `/api/users`.
pub async fn list_grouped_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Page<GroupedUser>> {
    let revision_id = current_revision(&state).await;

    let filters = match FilterState::from_query(&params, state.config.page_limit) {
        Ok(filters) => filters,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.query_page::<Users>(&filters).await {
        Ok(page) => success(
            Page::new(group_users(&page.rows), page.total_count),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/users/{id}/assignments - A user's current assignments.
pub async fn list_user_assignments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Assignment>> {
    let revision_id = current_revision(&state).await;

    match state.repo.list_assignments_for_user(&user_id).await {
        Ok(assignments) => success(assignments, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/users/{id}/assignments - Remove every assignment of a user.
pub async fn delete_user_assignments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Assignment>> {
    let revision_id = current_revision(&state).await;
    let outcome = state.repo.delete_all_assignments_for_user(&user_id).await;
    mutation(&state, revision_id, outcome).await
}

/// POST /api/assignments - Assign a user to an office with a role.
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(request): Json<CreateAssignmentRequest>,
) -> ApiResult<Assignment> {
    let revision_id = current_revision(&state).await;
    let outcome = state.repo.create_assignment(&request).await;
    mutation(&state, revision_id, outcome).await
}

/// PUT /api/users/{id}/assignments - Replace a user's assignments with the given set.
///
/// Always answers with a report; `applied: false` carries the reason.
pub async fn replace_user_assignments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ReplaceAssignmentsRequest>,
) -> ApiResult<ReconcileReport> {
    let report = state
        .reconciler
        .reconcile(&user_id, &request.assignments)
        .await;
    success(report, current_revision(&state).await)
}
