//! The workspace and membership types.

use serde::Deserialize;

use crate::{Error, auth::Role, database_id::DatabaseId, user::UserId};

/// Where a workspace is in its lifecycle.
///
/// Workspaces move `Active` -> `Archived` -> `Deleted`. Archiving is
/// reversible, deleting is not, and a workspace must be archived before it
/// can be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceStatus {
    /// The workspace is in use.
    Active,
    /// The workspace is read-only and hidden from the active context.
    Archived,
    /// The workspace is soft-deleted and hidden everywhere.
    Deleted,
}

impl WorkspaceStatus {
    /// The string stored in the workspace table.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkspaceStatus::Active => "active",
            WorkspaceStatus::Archived => "archived",
            WorkspaceStatus::Deleted => "deleted",
        }
    }

    /// Parse a status from its database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(WorkspaceStatus::Active),
            "archived" => Some(WorkspaceStatus::Archived),
            "deleted" => Some(WorkspaceStatus::Deleted),
            _ => None,
        }
    }
}

/// A tenant boundary: every board, time entry, account, journal entry and
/// payroll belongs to exactly one workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    /// The workspace's ID in the database.
    pub id: DatabaseId,
    /// The workspace's display name.
    pub name: String,
    /// Where the workspace is in its lifecycle.
    pub status: WorkspaceStatus,
}

/// A user's membership in a workspace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Membership {
    /// The membership's ID in the database.
    pub id: DatabaseId,
    /// The workspace the user belongs to.
    pub workspace_id: DatabaseId,
    /// The member.
    pub user_id: UserId,
    /// What the member may do in the workspace.
    pub role: Role,
}

/// A workspace member joined with their user account, for the members page.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// The underlying membership's ID.
    pub membership_id: DatabaseId,
    /// The member's user ID.
    pub user_id: UserId,
    /// The member's email address.
    pub email: String,
    /// The member's role in the workspace.
    pub role: Role,
}

/// The form data for creating or renaming a workspace.
#[derive(Debug, Deserialize)]
pub struct WorkspaceFormData {
    /// The workspace name the user typed.
    pub name: String,
}

/// The form data for adding a member to a workspace.
#[derive(Debug, Deserialize)]
pub struct MemberFormData {
    /// The email address of the user to add.
    pub email: String,
    /// The role to grant, one of "admin", "manager" or "member".
    pub role: String,
}

/// Trim `name` and reject it if nothing is left.
pub(crate) fn validate_workspace_name(name: &str) -> Result<String, Error> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(Error::EmptyName("workspace name"));
    }

    Ok(trimmed.to_owned())
}


#[cfg(test)]
mod workspace_name_tests {
    use crate::Error;

    use super::validate_workspace_name;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            validate_workspace_name("  Acme Corp  "),
            Ok("Acme Corp".to_owned())
        );
    }

    #[test]
    fn rejects_blank_name() {
        assert_eq!(
            validate_workspace_name("   "),
            Err(Error::EmptyName("workspace name"))
        );
    }
}
