//! Remote data store contract.
//!
//! The sync core only ever talks to these traits. Two adapters implement them: the HTTP
//! client in [`remote`] and the in-process [`RepositoryCollection`] over SQLite.

mod local;
mod remote;
mod resource;

pub use local::*;
pub use remote::*;
pub use resource::*;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Assignment, CreateAssignmentRequest, Page};
use crate::sync::FilterState;

/// A paginated, filterable remote collection with single-record CRUD.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Shape of one listed row.
    type Row: Clone + Send + Sync + 'static;
    /// Shape returned by single-record reads and writes.
    type Record: Send + Sync + 'static;
    type Create: Send + Sync + 'static;
    type Update: Send + Sync + 'static;

    /// Collection name used in logs.
    fn resource(&self) -> &'static str;

    /// One page of rows matching `filters`, plus the total match count.
    async fn query(&self, filters: &FilterState) -> Result<Page<Self::Row>, AppError>;

    async fn get(&self, id: &str) -> Result<Option<Self::Record>, AppError>;

    async fn create(&self, payload: &Self::Create) -> Result<Self::Record, AppError>;

    async fn update(&self, id: &str, partial: &Self::Update) -> Result<Self::Record, AppError>;

    async fn delete(&self, id: &str) -> Result<(), AppError>;

    /// Advisory uniqueness check on the collection's unique field (name, code, email).
    ///
    /// `exclude_id` skips the record being edited.
    async fn exists_by_unique_field(
        &self,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, AppError>;
}

/// Single-record operations on the user/office/role join table.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn list_assignments_for_user(&self, user_id: &str) -> Result<Vec<Assignment>, AppError>;

    /// Remove every assignment of `user_id`, returning the removed rows.
    async fn delete_all_assignments_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Assignment>, AppError>;

    /// Fails with [`AppError::Conflict`] if the user already holds the office.
    async fn create_assignment(
        &self,
        request: &CreateAssignmentRequest,
    ) -> Result<Assignment, AppError>;
}
