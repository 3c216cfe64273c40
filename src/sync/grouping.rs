//! Deduplicated users view.
//!
//! The users list arrives as one row per (user, assignment), outer-joined so that users
//! without assignments still appear once. [`group_users`] folds that into one entry per
//! user, keyed by email.

use std::collections::HashMap;

use crate::models::{AssignmentSummary, GroupedUser, UserAssignmentRow};

/// Fold flat rows into one entry per distinct email.
///
/// Entries come out in first-seen order and each entry's offices keep the order of the
/// input. Rows without both an office and a role contribute the user but no office.
pub fn group_users(rows: &[UserAssignmentRow]) -> Vec<GroupedUser> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<GroupedUser> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.email.as_str()).or_insert_with(|| {
            grouped.push(GroupedUser {
                user_id: row.user_id.clone(),
                full_name: row.full_name.clone(),
                email: row.email.clone(),
                offices: Vec::new(),
            });
            grouped.len() - 1
        });

        if let Some(summary) = summary_of(row) {
            grouped[slot].offices.push(summary);
        }
    }

    grouped
}

fn summary_of(row: &UserAssignmentRow) -> Option<AssignmentSummary> {
    let (office_id, role_id) = (row.office_id.as_ref()?, row.role_id.as_ref()?);
    Some(AssignmentSummary {
        assignment_id: row.assignment_id.clone(),
        office_id: office_id.clone(),
        office_name: row.office_name.clone(),
        role_id: role_id.clone(),
        role_name: row.role_name.clone(),
        assigned_at: row.assigned_at.clone(),
    })
}

/// Expand grouped users back into flat rows, one per office or one bare row per
/// unassigned user.
pub fn flatten_grouped(users: &[GroupedUser]) -> Vec<UserAssignmentRow> {
    let mut rows = Vec::new();
    for user in users {
        let bare = UserAssignmentRow {
            user_id: user.user_id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            assignment_id: None,
            office_id: None,
            office_name: None,
            role_id: None,
            role_name: None,
            assigned_at: None,
        };
        if user.offices.is_empty() {
            rows.push(bare);
            continue;
        }
        for office in &user.offices {
            rows.push(UserAssignmentRow {
                assignment_id: office.assignment_id.clone(),
                office_id: Some(office.office_id.clone()),
                office_name: office.office_name.clone(),
                role_id: Some(office.role_id.clone()),
                role_name: office.role_name.clone(),
                assigned_at: office.assigned_at.clone(),
                ..bare.clone()
            });
        }
    }
    rows
}
