//! Resource descriptors tying each collection to its wire types.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{
    CreateItemCategoryRequest, CreateItemRequest, CreateOfficeRequest, CreateRoleRequest,
    CreateUserRequest, Item, ItemCategory, Office, Role, UpdateItemCategoryRequest,
    UpdateItemRequest, UpdateOfficeRequest, UpdateRoleRequest, UpdateUserRequest, User,
    UserAssignmentRow,
};

/// A collection exposed by the admin API.
pub trait Resource: Send + Sync + 'static {
    type Row: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
    type Record: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Create: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Update: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Path segment under `/api`.
    const PATH: &'static str;

    /// Required-field checks run before a create reaches the store.
    fn validate_create(_payload: &Self::Create) -> Result<(), AppError> {
        Ok(())
    }

    /// The same checks for the fields a partial update carries.
    fn validate_update(_partial: &Self::Update) -> Result<(), AppError> {
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// [`require`] for a field that may be absent from a partial update.
fn require_if_present(field: &str, value: Option<&String>) -> Result<(), AppError> {
    value.map_or(Ok(()), |v| require(field, v))
}

fn non_negative_quantity(quantity: i64) -> Result<(), AppError> {
    if quantity < 0 {
        return Err(AppError::Validation(
            "Quantity cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn valid_email(email: &str) -> Result<(), AppError> {
    require("Email", email)?;
    if !email.contains('@') {
        return Err(AppError::Validation(format!(
            "Invalid email address: {}",
            email
        )));
    }
    Ok(())
}

pub struct Offices;

impl Resource for Offices {
    type Row = Office;
    type Record = Office;
    type Create = CreateOfficeRequest;
    type Update = UpdateOfficeRequest;

    const PATH: &'static str = "offices";

    fn validate_create(payload: &CreateOfficeRequest) -> Result<(), AppError> {
        require("Office name", &payload.name)
    }

    fn validate_update(partial: &UpdateOfficeRequest) -> Result<(), AppError> {
        require_if_present("Office name", partial.name.as_ref())
    }
}

pub struct Roles;

impl Resource for Roles {
    type Row = Role;
    type Record = Role;
    type Create = CreateRoleRequest;
    type Update = UpdateRoleRequest;

    const PATH: &'static str = "roles";

    fn validate_create(payload: &CreateRoleRequest) -> Result<(), AppError> {
        require("Role name", &payload.name)
    }

    fn validate_update(partial: &UpdateRoleRequest) -> Result<(), AppError> {
        require_if_present("Role name", partial.name.as_ref())
    }
}

pub struct ItemCategories;

impl Resource for ItemCategories {
    type Row = ItemCategory;
    type Record = ItemCategory;
    type Create = CreateItemCategoryRequest;
    type Update = UpdateItemCategoryRequest;

    const PATH: &'static str = "item-categories";

    fn validate_create(payload: &CreateItemCategoryRequest) -> Result<(), AppError> {
        require("Category name", &payload.name)
    }

    fn validate_update(partial: &UpdateItemCategoryRequest) -> Result<(), AppError> {
        require_if_present("Category name", partial.name.as_ref())
    }
}

pub struct Items;

impl Resource for Items {
    type Row = Item;
    type Record = Item;
    type Create = CreateItemRequest;
    type Update = UpdateItemRequest;

    const PATH: &'static str = "items";

    fn validate_create(payload: &CreateItemRequest) -> Result<(), AppError> {
        require("Item code", &payload.code)?;
        require("Item name", &payload.name)?;
        non_negative_quantity(payload.quantity)
    }

    fn validate_update(partial: &UpdateItemRequest) -> Result<(), AppError> {
        require_if_present("Item code", partial.code.as_ref())?;
        require_if_present("Item name", partial.name.as_ref())?;
        partial.quantity.map_or(Ok(()), non_negative_quantity)
    }
}

/// Users are listed as flat user/assignment rows but read and written as plain users.
pub struct Users;

impl Resource for Users {
    type Row = UserAssignmentRow;
    type Record = User;
    type Create = CreateUserRequest;
    type Update = UpdateUserRequest;

    const PATH: &'static str = "users";

    fn validate_create(payload: &CreateUserRequest) -> Result<(), AppError> {
        require("Full name", &payload.full_name)?;
        valid_email(&payload.email)
    }

    fn validate_update(partial: &UpdateUserRequest) -> Result<(), AppError> {
        require_if_present("Full name", partial.full_name.as_ref())?;
        partial.email.as_deref().map_or(Ok(()), valid_email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_validation() {
        let mut item = CreateItemRequest {
            code: "LP-001".to_string(),
            name: "Laptop".to_string(),
            description: None,
            category_id: None,
            status: Default::default(),
            quantity: 1,
        };
        assert!(Items::validate_create(&item).is_ok());

        item.quantity = -1;
        assert!(matches!(
            Items::validate_create(&item),
            Err(AppError::Validation(_))
        ));

        item.quantity = 1;
        item.code = "  ".to_string();
        assert_eq!(
            Items::validate_create(&item),
            Err(AppError::Validation("Item code is required".to_string()))
        );
    }

    #[test]
    fn test_user_email_validation() {
        let user = CreateUserRequest {
            full_name: "Ada".to_string(),
            email: "ada.example.com".to_string(),
        };
        assert!(Users::validate_create(&user).is_err());
    }

    #[test]
    fn test_updates_get_the_create_checks() {
        let blank_name = UpdateOfficeRequest {
            name: Some("   ".to_string()),
            location: None,
        };
        assert_eq!(
            Offices::validate_update(&blank_name),
            Err(AppError::Validation("Office name is required".to_string()))
        );
        assert!(Offices::validate_update(&UpdateOfficeRequest::default()).is_ok());

        let bad_user = UpdateUserRequest {
            full_name: None,
            email: Some("not-an-email".to_string()),
        };
        assert!(Users::validate_update(&bad_user).is_err());
        let blank_user = UpdateUserRequest {
            full_name: Some(String::new()),
            email: None,
        };
        assert!(Users::validate_update(&blank_user).is_err());

        let negative = UpdateItemRequest {
            quantity: Some(-3),
            ..UpdateItemRequest::default()
        };
        assert!(Items::validate_update(&negative).is_err());
        let renamed = UpdateItemRequest {
            name: Some("Dock".to_string()),
            ..UpdateItemRequest::default()
        };
        assert!(Items::validate_update(&renamed).is_ok());
    }
}
