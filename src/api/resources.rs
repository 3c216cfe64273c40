//! Generic collection endpoints, mounted once per resource.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use super::{current_revision, error, mutation, success, ApiResult};
use crate::db::TableResource;
use crate::errors::AppError;
use crate::models::{ExistsQuery, Page};
use crate::store::{Collection, RepositoryCollection};
use crate::sync::FilterState;
use crate::AppState;

/// Routes for `R` under `/{R::PATH}`.
pub fn resource_routes<R: TableResource>() -> Router<AppState> {
    let base = format!("/{}", R::PATH);
    Router::new()
        .route(&base, get(list::<R>).post(create::<R>))
        .route(&format!("{}/exists", base), get(exists::<R>))
        .route(
            &format!("{}/{{id}}", base),
            get(get_one::<R>).put(update::<R>).delete(remove::<R>),
        )
}

fn collection<R: TableResource>(state: &AppState) -> RepositoryCollection<R> {
    RepositoryCollection::new(Arc::clone(&state.repo))
}

/// GET /api/{resource} - One filtered page.
pub async fn list<R: TableResource>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Page<R::Row>> {
    let revision_id = current_revision(&state).await;

    let filters = match FilterState::from_query(&params, state.config.page_limit) {
        Ok(filters) => filters,
        Err(e) => return error(e, revision_id),
    };

    match collection::<R>(&state).query(&filters).await {
        Ok(page) => success(page, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/{resource}/{id} - A single record.
pub async fn get_one<R: TableResource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<R::Record> {
    let revision_id = current_revision(&state).await;

    match collection::<R>(&state).get(&id).await {
        Ok(Some(record)) => success(record, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("{} {} not found", R::PATH, id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/{resource} - Create a record.
pub async fn create<R: TableResource>(
    State(state): State<AppState>,
    Json(request): Json<R::Create>,
) -> ApiResult<R::Record> {
    let revision_id = current_revision(&state).await;
    let outcome = collection::<R>(&state).create(&request).await;
    mutation(&state, revision_id, outcome).await
}

/// PUT /api/{resource}/{id} - Partially update a record.
pub async fn update<R: TableResource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<R::Update>,
) -> ApiResult<R::Record> {
    let revision_id = current_revision(&state).await;
    let outcome = collection::<R>(&state).update(&id, &request).await;
    mutation(&state, revision_id, outcome).await
}

/// DELETE /api/{resource}/{id} - Delete a record.
pub async fn remove<R: TableResource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = current_revision(&state).await;
    let outcome = collection::<R>(&state).delete(&id).await;
    mutation(&state, revision_id, outcome).await
}

/// GET /api/{resource}/exists?value=..&excludeId=.. - Whether the unique field is taken.
pub async fn exists<R: TableResource>(
    State(state): State<AppState>,
    Query(query): Query<ExistsQuery>,
) -> ApiResult<bool> {
    let revision_id = current_revision(&state).await;

    match collection::<R>(&state)
        .exists_by_unique_field(&query.value, query.exclude_id.as_deref())
        .await
    {
        Ok(found) => success(found, revision_id),
        Err(e) => error(e, revision_id),
    }
}
