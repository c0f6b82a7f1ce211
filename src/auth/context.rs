//! The per-request context that protected route handlers receive.

use crate::{database_id::DatabaseId, user::UserId};

/// A member's role within a workspace.
///
/// Roles are ordered by privilege: an admin can do everything a manager can,
/// and a manager can do everything a member can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Can manage the workspace itself: members, lifecycle, and payroll locks.
    Admin,
    /// Can manage boards, payroll, and the journal.
    Manager,
    /// Can track time and work with tasks.
    Member,
}

impl Role {
    /// The string stored in the membership table.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }

    /// Parse a role from its database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "member" => Some(Role::Member),
            _ => None,
        }
    }

    /// Whether this role may administer the workspace.
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Whether this role may manage boards, payroll and the journal.
    pub fn can_manage(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

/// The identity and workspace scope of the current request.
///
/// The auth middleware resolves this from the auth cookie and the caller's
/// active workspace membership, and inserts it as a request extension.
/// Handlers receive it with `Extension(context): Extension<RequestContext>`
/// instead of reading ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// The authenticated user.
    pub user_id: UserId,
    /// The user's active workspace.
    pub workspace_id: DatabaseId,
    /// The user's role in the active workspace.
    pub role: Role,
}

#[cfg(test)]
mod role_tests {
    use super::Role;

    #[test]
    fn round_trips_through_string() {
        for role in [Role::Admin, Role::Manager, Role::Member] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn parse_rejects_unknown_role() {
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn admin_outranks_manager_outranks_member() {
        assert!(Role::Admin.is_admin());
        assert!(Role::Admin.can_manage());

        assert!(!Role::Manager.is_admin());
        assert!(Role::Manager.can_manage());

        assert!(!Role::Member.is_admin());
        assert!(!Role::Member.can_manage());
    }
}
