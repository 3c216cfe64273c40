//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::{TableResource, TableSpec};
use crate::errors::AppError;
use crate::models::{
    Assignment, CreateAssignmentRequest, CreateItemCategoryRequest, CreateItemRequest,
    CreateOfficeRequest, CreateRoleRequest, CreateUserRequest, Item, ItemCategory, Office, Page,
    Role, UpdateItemCategoryRequest, UpdateItemRequest, UpdateOfficeRequest, UpdateRoleRequest,
    UpdateUserRequest, User,
};
use crate::sync::FilterState;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    // ==================== GENERIC COLLECTION OPERATIONS ====================

    /// One page of `R` matching `filters`, with the total count across all pages.
    pub async fn query_page<R: TableResource>(
        &self,
        filters: &FilterState,
    ) -> Result<Page<R::Row>, AppError> {
        let spec = R::TABLE;

        let mut count_query =
            QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) AS total FROM {}", spec.list_from));
        push_filters(&mut count_query, &spec, filters)?;
        let total: i64 = count_query
            .build()
            .fetch_one(&self.pool)
            .await?
            .get("total");

        let mut page_query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM {}",
            spec.list_columns, spec.list_from
        ));
        push_filters(&mut page_query, &spec, filters)?;
        page_query.push(format!(" ORDER BY {} LIMIT ", spec.order_by));
        page_query.push_bind(i64::from(filters.limit()));
        page_query.push(" OFFSET ");
        page_query.push_bind(i64::try_from(filters.offset()).unwrap_or(i64::MAX));

        let rows = page_query.build().fetch_all(&self.pool).await?;

        Ok(Page::new(
            rows.iter().map(R::row_from).collect(),
            u64::try_from(total).unwrap_or(0),
        ))
    }

    /// Get a record by ID.
    pub async fn get_record<R: TableResource>(&self, id: &str) -> Result<Option<R::Record>, AppError> {
        let spec = R::TABLE;
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            spec.record_columns, spec.table
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(R::record_from))
    }

    /// Delete a record by ID.
    pub async fn delete_record<R: TableResource>(&self, id: &str) -> Result<(), AppError> {
        let spec = R::TABLE;
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", spec.table))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {} not found", R::PATH, id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// Whether another record already uses `value` in the resource's unique column.
    pub async fn exists_by_unique_field<R: TableResource>(
        &self,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let spec = R::TABLE;
        let row = sqlx::query(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ? COLLATE NOCASE AND (? IS NULL OR id <> ?)) AS found",
            spec.table, spec.unique_column
        ))
        .bind(value.trim())
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        let found: i64 = row.get("found");
        Ok(found != 0)
    }

    // ==================== OFFICE OPERATIONS ====================

    /// Create a new office.
    pub async fn create_office(&self, request: &CreateOfficeRequest) -> Result<Office, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let name = request.name.trim().to_string();

        sqlx::query("INSERT INTO offices (id, name, location, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&name)
            .bind(&request.location)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;

        Ok(Office {
            id,
            name,
            location: request.location.clone(),
            created_at: now,
        })
    }

    /// Update an office.
    pub async fn update_office(
        &self,
        id: &str,
        request: &UpdateOfficeRequest,
    ) -> Result<Office, AppError> {
        let existing = self
            .get_record::<crate::store::Offices>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Office {} not found", id)))?;

        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(existing.name.as_str())
            .to_string();
        let location = request.location.clone().or(existing.location);

        let result = sqlx::query("UPDATE offices SET name = ?, location = ? WHERE id = ?")
            .bind(&name)
            .bind(&location)
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_row_updated(result.rows_affected(), "Office", id)?;

        self.increment_revision().await?;

        Ok(Office {
            id: id.to_string(),
            name,
            location,
            created_at: existing.created_at,
        })
    }

    // ==================== ROLE OPERATIONS ====================

    /// Create a new role.
    pub async fn create_role(&self, request: &CreateRoleRequest) -> Result<Role, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let name = request.name.trim().to_string();

        sqlx::query("INSERT INTO roles (id, name, description) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&name)
            .bind(&request.description)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;

        Ok(Role {
            id,
            name,
            description: request.description.clone(),
        })
    }

    /// Update a role.
    pub async fn update_role(&self, id: &str, request: &UpdateRoleRequest) -> Result<Role, AppError> {
        let existing = self
            .get_record::<crate::store::Roles>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;

        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(existing.name.as_str())
            .to_string();
        let description = request.description.clone().or(existing.description);

        let result = sqlx::query("UPDATE roles SET name = ?, description = ? WHERE id = ?")
            .bind(&name)
            .bind(&description)
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_row_updated(result.rows_affected(), "Role", id)?;

        self.increment_revision().await?;

        Ok(Role {
            id: id.to_string(),
            name,
            description,
        })
    }

    // ==================== ITEM CATEGORY OPERATIONS ====================

    /// Create a new item category.
    pub async fn create_item_category(
        &self,
        request: &CreateItemCategoryRequest,
    ) -> Result<ItemCategory, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let name = request.name.trim().to_string();

        sqlx::query(
            "INSERT INTO item_categories (id, name, description, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&name)
        .bind(&request.description)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(ItemCategory {
            id,
            name,
            description: request.description.clone(),
            created_at: now,
        })
    }

    /// Update an item category.
    pub async fn update_item_category(
        &self,
        id: &str,
        request: &UpdateItemCategoryRequest,
    ) -> Result<ItemCategory, AppError> {
        let existing = self
            .get_record::<crate::store::ItemCategories>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item category {} not found", id)))?;

        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(existing.name.as_str())
            .to_string();
        let description = request.description.clone().or(existing.description);

        let result = sqlx::query("UPDATE item_categories SET name = ?, description = ? WHERE id = ?")
            .bind(&name)
            .bind(&description)
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_row_updated(result.rows_affected(), "Item category", id)?;

        self.increment_revision().await?;

        Ok(ItemCategory {
            id: id.to_string(),
            name,
            description,
            created_at: existing.created_at,
        })
    }

    // ==================== ITEM OPERATIONS ====================

    /// Create a new item.
    pub async fn create_item(&self, request: &CreateItemRequest) -> Result<Item, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let code = request.code.trim().to_string();

        sqlx::query(
            "INSERT INTO items (id, code, name, description, category_id, status, quantity, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&code)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.category_id)
        .bind(request.status.as_str())
        .bind(request.quantity)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Item {
            id,
            code,
            name: request.name.clone(),
            description: request.description.clone(),
            category_id: request.category_id.clone(),
            status: request.status,
            quantity: request.quantity,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update an item.
    pub async fn update_item(&self, id: &str, request: &UpdateItemRequest) -> Result<Item, AppError> {
        let existing = self
            .get_record::<crate::store::Items>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))?;

        if request.quantity.is_some_and(|q| q < 0) {
            return Err(AppError::Validation(
                "Quantity cannot be negative".to_string(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let code = request
            .code
            .as_deref()
            .map(str::trim)
            .unwrap_or(existing.code.as_str())
            .to_string();
        let name = request.name.clone().unwrap_or(existing.name);
        let description = request.description.clone().or(existing.description);
        let category_id = request.category_id.clone().or(existing.category_id);
        let status = request.status.unwrap_or(existing.status);
        let quantity = request.quantity.unwrap_or(existing.quantity);

        let result = sqlx::query(
            "UPDATE items SET code = ?, name = ?, description = ?, category_id = ?, status = ?, quantity = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&code)
        .bind(&name)
        .bind(&description)
        .bind(&category_id)
        .bind(status.as_str())
        .bind(quantity)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        ensure_row_updated(result.rows_affected(), "Item", id)?;

        self.increment_revision().await?;

        Ok(Item {
            id: id.to_string(),
            code,
            name,
            description,
            category_id,
            status,
            quantity,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    // ==================== USER OPERATIONS ====================

    /// Create a new user.
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let email = request.email.trim().to_lowercase();

        sqlx::query("INSERT INTO users (id, full_name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&request.full_name)
            .bind(&email)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;

        Ok(User {
            id,
            full_name: request.full_name.clone(),
            email,
            created_at: now,
        })
    }

    /// Update a user.
    pub async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> Result<User, AppError> {
        let existing = self
            .get_record::<crate::store::Users>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let full_name = request.full_name.clone().unwrap_or(existing.full_name);
        let email = request
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .unwrap_or(existing.email);

        let result = sqlx::query("UPDATE users SET full_name = ?, email = ? WHERE id = ?")
            .bind(&full_name)
            .bind(&email)
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_row_updated(result.rows_affected(), "User", id)?;

        self.increment_revision().await?;

        Ok(User {
            id: id.to_string(),
            full_name,
            email,
            created_at: existing.created_at,
        })
    }

    // ==================== ASSIGNMENT OPERATIONS ====================

    /// List a user's assignments, oldest first.
    pub async fn list_assignments_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Assignment>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, office_id, role_id, assigned_at FROM user_office_roles WHERE user_id = ? ORDER BY assigned_at, id"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(assignment_from_row).collect())
    }

    /// Delete every assignment of a user in one transaction and return what was removed.
    pub async fn delete_all_assignments_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Assignment>, AppError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "SELECT id, user_id, office_id, role_id, assigned_at FROM user_office_roles WHERE user_id = ? ORDER BY assigned_at, id"
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM user_office_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deleted: Vec<Assignment> = rows.iter().map(assignment_from_row).collect();
        if !deleted.is_empty() {
            self.increment_revision().await?;
        }
        Ok(deleted)
    }

    /// Assign a user to an office with a role.
    pub async fn create_assignment(
        &self,
        request: &CreateAssignmentRequest,
    ) -> Result<Assignment, AppError> {
        self.ensure_exists("users", "User", &request.user_id).await?;
        self.ensure_exists("offices", "Office", &request.office_id)
            .await?;
        self.ensure_exists("roles", "Role", &request.role_id).await?;

        let duplicate = sqlx::query(
            "SELECT 1 FROM user_office_roles WHERE user_id = ? AND office_id = ?",
        )
        .bind(&request.user_id)
        .bind(&request.office_id)
        .fetch_optional(&self.pool)
        .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict(format!(
                "User {} is already assigned to office {}",
                request.user_id, request.office_id
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        // The UNIQUE (user_id, office_id) constraint still catches a racing insert.
        sqlx::query(
            "INSERT INTO user_office_roles (id, user_id, office_id, role_id, assigned_at) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.user_id)
        .bind(&request.office_id)
        .bind(&request.role_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Assignment {
            id,
            user_id: request.user_id.clone(),
            office_id: request.office_id.clone(),
            role_id: request.role_id.clone(),
            assigned_at: now,
        })
    }

    async fn ensure_exists(&self, table: &str, label: &str, id: &str) -> Result<(), AppError> {
        let row = sqlx::query(&format!("SELECT 1 FROM {} WHERE id = ?", table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("{} {} not found", label, id))),
        }
    }
}

/// Append `WHERE` conditions for the search term and exact filters of `filters`.
fn push_filters(
    query: &mut QueryBuilder<'_, Sqlite>,
    spec: &TableSpec,
    filters: &FilterState,
) -> Result<(), AppError> {
    let mut has_clause = false;

    if let Some(term) = filters.search() {
        if !spec.search_columns.is_empty() {
            push_conjunction(query, &mut has_clause);
            query.push("(");
            let pattern = format!("%{}%", escape_like(term));
            for (i, column) in spec.search_columns.iter().enumerate() {
                if i > 0 {
                    query.push(" OR ");
                }
                query.push(format!("{} LIKE ", column));
                query.push_bind(pattern.clone());
                query.push(" ESCAPE '\\'");
            }
            query.push(")");
        }
    }

    for (key, value) in filters.exact_filters() {
        let column = spec.filter_column(key).ok_or_else(|| {
            AppError::BadRequest(format!("Unknown filter '{}' for {}", key, spec.table))
        })?;
        push_conjunction(query, &mut has_clause);
        query.push(format!("{} = ", column));
        query.push_bind(value.to_string());
    }

    Ok(())
}

fn push_conjunction(query: &mut QueryBuilder<'_, Sqlite>, has_clause: &mut bool) {
    query.push(if *has_clause { " AND " } else { " WHERE " });
    *has_clause = true;
}

/// An UPDATE that matched nothing means the row vanished after it was read.
fn ensure_row_updated(rows_affected: u64, what: &str, id: &str) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::NotFound(format!("{} {} not found", what, id)));
    }
    Ok(())
}

/// Escape LIKE wildcards so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn assignment_from_row(row: &sqlx::sqlite::SqliteRow) -> Assignment {
    Assignment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        office_id: row.get("office_id"),
        role_id: row.get("role_id"),
        assigned_at: row.get("assigned_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::ItemStatus;
    use crate::store::{Items, Users};
    use crate::sync::FilterPatch;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (Repository::new(pool), temp_dir)
    }

    fn item(code: &str, name: &str, status: ItemStatus) -> CreateItemRequest {
        CreateItemRequest {
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            category_id: None,
            status,
            quantity: 1,
        }
    }

    #[test]
    fn test_update_matching_no_row_is_not_found() {
        assert!(matches!(
            ensure_row_updated(0, "Office", "o-1"),
            Err(AppError::NotFound(msg)) if msg == "Office o-1 not found"
        ));
        assert!(ensure_row_updated(1, "Office", "o-1").is_ok());
    }

    #[tokio::test]
    async fn test_update_of_missing_office_is_not_found() {
        let (repo, _dir) = repo().await;
        let request = UpdateOfficeRequest {
            name: Some("HQ".to_string()),
            location: None,
        };
        let result = repo.update_office("missing", &request).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn test_query_page_search_and_count() {
        let (repo, _dir) = repo().await;
        for i in 0..12 {
            repo.create_item(&item(&format!("D-{:02}", i), "Desk", ItemStatus::Available))
                .await
                .unwrap();
        }
        repo.create_item(&item("L-1", "Laptop Pro", ItemStatus::Assigned))
            .await
            .unwrap();

        let filters = FilterState::with_limit(5)
            .merge(&FilterPatch::new().search("desk"))
            .unwrap();
        let page = repo.query_page::<Items>(&filters).await.unwrap();
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.total_count, 12);

        let last = filters.merge(&FilterPatch::new().page(3)).unwrap();
        let page = repo.query_page::<Items>(&last).await.unwrap();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.total_count, 12);

        let by_status = FilterState::default()
            .merge(&FilterPatch::new().set("status", "assigned"))
            .unwrap();
        let page = repo.query_page::<Items>(&by_status).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0].code, "L-1");
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let (repo, _dir) = repo().await;
        repo.create_item(&item("A-1", "50% discount", ItemStatus::Available))
            .await
            .unwrap();
        repo.create_item(&item("A-2", "500 units", ItemStatus::Available))
            .await
            .unwrap();

        let filters = FilterState::default()
            .merge(&FilterPatch::new().search("50%"))
            .unwrap();
        let page = repo.query_page::<Items>(&filters).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0].code, "A-1");
    }

    #[tokio::test]
    async fn test_unknown_filter_is_rejected() {
        let (repo, _dir) = repo().await;
        let filters = FilterState::default()
            .merge(&FilterPatch::new().set("color", "red"))
            .unwrap();
        let err = repo.query_page::<Items>(&filters).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_exists_by_unique_field() {
        let (repo, _dir) = repo().await;
        let created = repo
            .create_item(&item("LP-001", "Laptop", ItemStatus::Available))
            .await
            .unwrap();

        assert!(repo.exists_by_unique_field::<Items>("lp-001", None).await.unwrap());
        assert!(!repo
            .exists_by_unique_field::<Items>("LP-001", Some(&created.id))
            .await
            .unwrap());
        assert!(!repo.exists_by_unique_field::<Items>("LP-002", None).await.unwrap());

        let err = repo
            .create_item(&item("LP-001", "Another", ItemStatus::Available))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_assignment_lifecycle() {
        let (repo, _dir) = repo().await;
        let user = repo
            .create_user(&CreateUserRequest {
                full_name: "Ada Lovelace".to_string(),
                email: "Ada@Example.com".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");

        let office = repo
            .create_office(&CreateOfficeRequest {
                name: "Berlin".to_string(),
                location: None,
            })
            .await
            .unwrap();
        let role = repo
            .create_role(&CreateRoleRequest {
                name: "Manager".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let request = CreateAssignmentRequest {
            user_id: user.id.clone(),
            office_id: office.id.clone(),
            role_id: role.id.clone(),
        };
        repo.create_assignment(&request).await.unwrap();

        let err = repo.create_assignment(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let missing_office = CreateAssignmentRequest {
            office_id: "nope".to_string(),
            ..request.clone()
        };
        let err = repo.create_assignment(&missing_office).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let rows = repo
            .query_page::<Users>(&FilterState::default())
            .await
            .unwrap();
        assert_eq!(rows.total_count, 1);
        assert_eq!(rows.rows[0].office_name.as_deref(), Some("Berlin"));
        assert_eq!(rows.rows[0].role_name.as_deref(), Some("Manager"));

        let deleted = repo.delete_all_assignments_for_user(&user.id).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(repo
            .list_assignments_for_user(&user.id)
            .await
            .unwrap()
            .is_empty());

        // Unassigned users still list as one row with empty assignment columns.
        let rows = repo
            .query_page::<Users>(&FilterState::default())
            .await
            .unwrap();
        assert_eq!(rows.total_count, 1);
        assert!(rows.rows[0].office_id.is_none());
    }

    #[tokio::test]
    async fn test_revision_increments_on_mutation() {
        let (repo, _dir) = repo().await;
        let before = repo.get_revision_id().await.unwrap();
        repo.create_item(&item("X-1", "Chair", ItemStatus::Available))
            .await
            .unwrap();
        assert_eq!(repo.get_revision_id().await.unwrap(), before + 1);
    }
}
