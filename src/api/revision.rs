//! Revision endpoint.

use axum::extract::State;
use serde::Serialize;

use super::{error, success, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
}

/// GET /api/revision - The current revision, bumped by every mutation.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.repo.get_revision_id().await {
        Ok(revision_id) => success(RevisionInfo { revision_id }, revision_id),
        Err(e) => error(e, 0),
    }
}
