//! REST API module.
//!
//! Every resource shares the same handlers, instantiated per
//! [`TableResource`](crate::db::TableResource). Responses
//! use the `{success, data, revisionId}` envelope.

mod resources;
mod revision;
mod users;

pub use resources::*;
pub use revision::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: crate::errors::AppError, revision_id: i64) -> ApiResult<T> {
    Err(crate::errors::AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Revision to report alongside a response; 0 if it cannot be read.
pub(crate) async fn current_revision(state: &crate::AppState) -> i64 {
    state.repo.get_revision_id().await.unwrap_or(0)
}

/// Envelope for the outcome of a mutation, reporting the revision it produced.
pub(crate) async fn mutation<T: Serialize>(
    state: &crate::AppState,
    before: i64,
    outcome: Result<T, crate::errors::AppError>,
) -> ApiResult<T> {
    match outcome {
        Ok(data) => {
            let after = state.repo.get_revision_id().await.unwrap_or(before);
            success(data, after)
        }
        Err(e) => error(e, before),
    }
}
