//! Table descriptors binding each [`Resource`] to its SQL.

use futures_util::future::BoxFuture;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Repository;
use crate::errors::AppError;
use crate::models::{
    CreateItemCategoryRequest, CreateItemRequest, CreateOfficeRequest, CreateRoleRequest,
    CreateUserRequest, Item, ItemCategory, ItemStatus, Office, Role, UpdateItemCategoryRequest,
    UpdateItemRequest, UpdateOfficeRequest, UpdateRoleRequest, UpdateUserRequest, User,
    UserAssignmentRow,
};
use crate::store::{ItemCategories, Items, Offices, Resource, Roles, Users};

/// Static SQL fragments for one collection. Every identifier here is trusted text.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Table holding the records targeted by get/update/delete/exists.
    pub table: &'static str,
    pub record_columns: &'static str,
    /// Table or view scanned by paginated queries.
    pub list_from: &'static str,
    pub list_columns: &'static str,
    /// Columns matched by the free-text `search` filter.
    pub search_columns: &'static [&'static str],
    /// Filter key to column for exact-match filters.
    pub filter_columns: &'static [(&'static str, &'static str)],
    pub order_by: &'static str,
    pub unique_column: &'static str,
}

impl TableSpec {
    pub fn filter_column(&self, key: &str) -> Option<&'static str> {
        self.filter_columns
            .iter()
            .find(|(filter, _)| *filter == key)
            .map(|(_, column)| *column)
    }
}

/// A resource stored in SQLite.
pub trait TableResource: Resource {
    const TABLE: TableSpec;

    fn row_from(row: &SqliteRow) -> Self::Row;

    fn record_from(row: &SqliteRow) -> Self::Record;

    fn insert<'a>(
        repo: &'a Repository,
        payload: &'a Self::Create,
    ) -> BoxFuture<'a, Result<Self::Record, AppError>>;

    fn patch<'a>(
        repo: &'a Repository,
        id: &'a str,
        partial: &'a Self::Update,
    ) -> BoxFuture<'a, Result<Self::Record, AppError>>;
}

const OFFICE_COLUMNS: &str = "id, name, location, created_at";
const ROLE_COLUMNS: &str = "id, name, description";
const CATEGORY_COLUMNS: &str = "id, name, description, created_at";
const ITEM_COLUMNS: &str =
    "id, code, name, description, category_id, status, quantity, created_at, updated_at";
const USER_COLUMNS: &str = "id, full_name, email, created_at";

impl TableResource for Offices {
    const TABLE: TableSpec = TableSpec {
        table: "offices",
        record_columns: OFFICE_COLUMNS,
        list_from: "offices",
        list_columns: OFFICE_COLUMNS,
        search_columns: &["name", "location"],
        filter_columns: &[],
        order_by: "name",
        unique_column: "name",
    };

    fn row_from(row: &SqliteRow) -> Office {
        office_from_row(row)
    }

    fn record_from(row: &SqliteRow) -> Office {
        office_from_row(row)
    }

    fn insert<'a>(
        repo: &'a Repository,
        payload: &'a CreateOfficeRequest,
    ) -> BoxFuture<'a, Result<Office, AppError>> {
        Box::pin(repo.create_office(payload))
    }

    fn patch<'a>(
        repo: &'a Repository,
        id: &'a str,
        partial: &'a UpdateOfficeRequest,
    ) -> BoxFuture<'a, Result<Office, AppError>> {
        Box::pin(repo.update_office(id, partial))
    }
}

impl TableResource for Roles {
    const TABLE: TableSpec = TableSpec {
        table: "roles",
        record_columns: ROLE_COLUMNS,
        list_from: "roles",
        list_columns: ROLE_COLUMNS,
        search_columns: &["name"],
        filter_columns: &[],
        order_by: "name",
        unique_column: "name",
    };

    fn row_from(row: &SqliteRow) -> Role {
        role_from_row(row)
    }

    fn record_from(row: &SqliteRow) -> Role {
        role_from_row(row)
    }

    fn insert<'a>(
        repo: &'a Repository,
        payload: &'a CreateRoleRequest,
    ) -> BoxFuture<'a, Result<Role, AppError>> {
        Box::pin(repo.create_role(payload))
    }

    fn patch<'a>(
        repo: &'a Repository,
        id: &'a str,
        partial: &'a UpdateRoleRequest,
    ) -> BoxFuture<'a, Result<Role, AppError>> {
        Box::pin(repo.update_role(id, partial))
    }
}

impl TableResource for ItemCategories {
    const TABLE: TableSpec = TableSpec {
        table: "item_categories",
        record_columns: CATEGORY_COLUMNS,
        list_from: "item_categories",
        list_columns: CATEGORY_COLUMNS,
        search_columns: &["name", "description"],
        filter_columns: &[],
        order_by: "name",
        unique_column: "name",
    };

    fn row_from(row: &SqliteRow) -> ItemCategory {
        category_from_row(row)
    }

    fn record_from(row: &SqliteRow) -> ItemCategory {
        category_from_row(row)
    }

    fn insert<'a>(
        repo: &'a Repository,
        payload: &'a CreateItemCategoryRequest,
    ) -> BoxFuture<'a, Result<ItemCategory, AppError>> {
        Box::pin(repo.create_item_category(payload))
    }

    fn patch<'a>(
        repo: &'a Repository,
        id: &'a str,
        partial: &'a UpdateItemCategoryRequest,
    ) -> BoxFuture<'a, Result<ItemCategory, AppError>> {
        Box::pin(repo.update_item_category(id, partial))
    }
}

impl TableResource for Items {
    const TABLE: TableSpec = TableSpec {
        table: "items",
        record_columns: ITEM_COLUMNS,
        list_from: "items",
        list_columns: ITEM_COLUMNS,
        search_columns: &["name", "code", "description"],
        filter_columns: &[("categoryId", "category_id"), ("status", "status")],
        order_by: "name, code",
        unique_column: "code",
    };

    fn row_from(row: &SqliteRow) -> Item {
        item_from_row(row)
    }

    fn record_from(row: &SqliteRow) -> Item {
        item_from_row(row)
    }

    fn insert<'a>(
        repo: &'a Repository,
        payload: &'a CreateItemRequest,
    ) -> BoxFuture<'a, Result<Item, AppError>> {
        Box::pin(repo.create_item(payload))
    }

    fn patch<'a>(
        repo: &'a Repository,
        id: &'a str,
        partial: &'a UpdateItemRequest,
    ) -> BoxFuture<'a, Result<Item, AppError>> {
        Box::pin(repo.update_item(id, partial))
    }
}

impl TableResource for Users {
    const TABLE: TableSpec = TableSpec {
        table: "users",
        record_columns: USER_COLUMNS,
        list_from: "user_assignment_rows",
        list_columns: "user_id, full_name, email, assignment_id, office_id, office_name, role_id, role_name, assigned_at",
        search_columns: &["full_name", "email"],
        filter_columns: &[("officeId", "office_id"), ("roleId", "role_id")],
        order_by: "full_name, email, assigned_at",
        unique_column: "email",
    };

    fn row_from(row: &SqliteRow) -> UserAssignmentRow {
        UserAssignmentRow {
            user_id: row.get("user_id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            assignment_id: row.get("assignment_id"),
            office_id: row.get("office_id"),
            office_name: row.get("office_name"),
            role_id: row.get("role_id"),
            role_name: row.get("role_name"),
            assigned_at: row.get("assigned_at"),
        }
    }

    fn record_from(row: &SqliteRow) -> User {
        User {
            id: row.get("id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        }
    }

    fn insert<'a>(
        repo: &'a Repository,
        payload: &'a CreateUserRequest,
    ) -> BoxFuture<'a, Result<User, AppError>> {
        Box::pin(repo.create_user(payload))
    }

    fn patch<'a>(
        repo: &'a Repository,
        id: &'a str,
        partial: &'a UpdateUserRequest,
    ) -> BoxFuture<'a, Result<User, AppError>> {
        Box::pin(repo.update_user(id, partial))
    }
}

fn office_from_row(row: &SqliteRow) -> Office {
    Office {
        id: row.get("id"),
        name: row.get("name"),
        location: row.get("location"),
        created_at: row.get("created_at"),
    }
}

fn role_from_row(row: &SqliteRow) -> Role {
    Role {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
    }
}

fn category_from_row(row: &SqliteRow) -> ItemCategory {
    ItemCategory {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

fn item_from_row(row: &SqliteRow) -> Item {
    let status: String = row.get("status");
    Item {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        description: row.get("description"),
        category_id: row.get("category_id"),
        status: ItemStatus::parse(&status).unwrap_or_default(),
        quantity: row.get("quantity"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
