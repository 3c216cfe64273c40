//! Paginated query result shared by every collection.

use serde::{Deserialize, Serialize};

/// One page of a remote collection plus the count of all matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// Matches across all pages, independent of the slice in `rows`.
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>, total_count: u64) -> Self {
        Self { rows, total_count }
    }
}

/// Query string of the `exists` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistsQuery {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_id: Option<String>,
}
