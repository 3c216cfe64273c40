//! User/office/role assignment models.

use serde::{Deserialize, Serialize};

/// A stored link between a user and an office, carrying the user's role there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub user_id: String,
    pub office_id: String,
    pub role_id: String,
    pub assigned_at: String,
}

impl Assignment {
    pub fn pair(&self) -> AssignmentPair {
        AssignmentPair::new(self.office_id.clone(), self.role_id.clone())
    }
}

/// Request body for creating a single assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub user_id: String,
    pub office_id: String,
    pub role_id: String,
}

/// One desired (office, role) entry passed to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPair {
    #[serde(default)]
    pub office_id: String,
    #[serde(default)]
    pub role_id: String,
}

impl AssignmentPair {
    pub fn new(office_id: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self {
            office_id: office_id.into(),
            role_id: role_id.into(),
        }
    }
}

/// Request body for replacing a user's assignment set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAssignmentsRequest {
    pub assignments: Vec<AssignmentPair>,
}
