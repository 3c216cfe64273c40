//! In-process adapters over the SQLite [`Repository`].

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use super::{AssignmentStore, Collection};
use crate::db::{Repository, TableResource};
use crate::errors::AppError;
use crate::models::{Assignment, CreateAssignmentRequest, Page};
use crate::sync::FilterState;

/// [`Collection`] for resource `R`, served straight from the repository.
pub struct RepositoryCollection<R> {
    repo: Arc<Repository>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> RepositoryCollection<R> {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            repo,
            _resource: PhantomData,
        }
    }
}

impl<R> Clone for RepositoryCollection<R> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.repo))
    }
}

#[async_trait]
impl<R: TableResource> Collection for RepositoryCollection<R> {
    type Row = R::Row;
    type Record = R::Record;
    type Create = R::Create;
    type Update = R::Update;

    fn resource(&self) -> &'static str {
        R::PATH
    }

    async fn query(&self, filters: &FilterState) -> Result<Page<R::Row>, AppError> {
        self.repo.query_page::<R>(filters).await
    }

    async fn get(&self, id: &str) -> Result<Option<R::Record>, AppError> {
        self.repo.get_record::<R>(id).await
    }

    async fn create(&self, payload: &R::Create) -> Result<R::Record, AppError> {
        R::validate_create(payload)?;
        R::insert(&self.repo, payload).await
    }

    async fn update(&self, id: &str, partial: &R::Update) -> Result<R::Record, AppError> {
        R::validate_update(partial)?;
        R::patch(&self.repo, id, partial).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete_record::<R>(id).await
    }

    async fn exists_by_unique_field(
        &self,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, AppError> {
        self.repo.exists_by_unique_field::<R>(value, exclude_id).await
    }
}

#[async_trait]
impl AssignmentStore for Repository {
    async fn list_assignments_for_user(&self, user_id: &str) -> Result<Vec<Assignment>, AppError> {
        Repository::list_assignments_for_user(self, user_id).await
    }

    async fn delete_all_assignments_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Assignment>, AppError> {
        Repository::delete_all_assignments_for_user(self, user_id).await
    }

    async fn create_assignment(
        &self,
        request: &CreateAssignmentRequest,
    ) -> Result<Assignment, AppError> {
        Repository::create_assignment(self, request).await
    }
}
