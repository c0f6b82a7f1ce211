//! Database operations for workspaces and memberships.

use rusqlite::{Connection, OptionalExtension, Row, Transaction as SqlTransaction};

use crate::{
    Error,
    auth::{RequestContext, Role},
    database_id::DatabaseId,
    user::UserId,
    workspace::{Member, Membership, Workspace, WorkspaceStatus},
};

/// Initialize the workspace table.
pub fn create_workspace_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS workspace (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active'
        );",
        (),
    )?;

    Ok(())
}

/// Initialize the membership table.
pub fn create_membership_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS membership (
            id INTEGER PRIMARY KEY,
            workspace_id INTEGER NOT NULL REFERENCES workspace(id),
            user_id INTEGER NOT NULL REFERENCES user(id),
            role TEXT NOT NULL,
            UNIQUE(workspace_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_membership_user ON membership(user_id);",
    )?;

    Ok(())
}

/// Create a workspace with `user_id` as its admin.
///
/// The workspace and the admin membership are written in one transaction.
/// If the user has no active workspace yet, the new workspace becomes it.
///
/// # Errors
/// Returns [Error::EmptyName] if `name` is blank.
pub fn create_workspace_with_admin(
    name: &str,
    user_id: UserId,
    connection: &Connection,
) -> Result<Workspace, Error> {
    let name = super::domain::validate_workspace_name(name)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Immediate)?;

    transaction.execute(
        "INSERT INTO workspace (name, status) VALUES (?1, 'active');",
        (&name,),
    )?;
    let workspace_id = transaction.last_insert_rowid();

    transaction.execute(
        "INSERT INTO membership (workspace_id, user_id, role) VALUES (?1, ?2, ?3);",
        (workspace_id, user_id.as_i64(), Role::Admin.as_str()),
    )?;

    transaction.execute(
        "UPDATE user SET active_workspace_id = ?1
         WHERE id = ?2 AND active_workspace_id IS NULL;",
        (workspace_id, user_id.as_i64()),
    )?;

    transaction.commit()?;

    Ok(Workspace {
        id: workspace_id,
        name,
        status: WorkspaceStatus::Active,
    })
}

/// Retrieve a workspace by its ID.
pub fn get_workspace(workspace_id: DatabaseId, connection: &Connection) -> Result<Workspace, Error> {
    connection
        .prepare("SELECT id, name, status FROM workspace WHERE id = :id;")?
        .query_row(&[(":id", &workspace_id)], map_workspace_row)
        .map_err(|error| error.into())
}

/// Retrieve the workspaces the user belongs to, with their role in each.
///
/// Deleted workspaces are excluded. Results are ordered by workspace name.
pub fn get_workspaces_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<(Workspace, Role)>, Error> {
    connection
        .prepare(
            "SELECT w.id, w.name, w.status, m.role
             FROM membership m
             INNER JOIN workspace w ON w.id = m.workspace_id
             WHERE m.user_id = :user_id AND w.status != 'deleted'
             ORDER BY w.name ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            let workspace = map_workspace_row(row)?;
            let role = map_role(row, 3)?;

            Ok((workspace, role))
        })?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Resolve the user's request context from their memberships.
///
/// Prefers the workspace the user last selected, falling back to their
/// oldest membership in an active workspace. Archived and deleted
/// workspaces are never chosen.
///
/// # Errors
/// Returns [Error::WorkspaceNotActive] if the user belongs to no active
/// workspace.
pub fn get_active_context(user_id: UserId, connection: &Connection) -> Result<RequestContext, Error> {
    let row = connection
        .prepare(
            "SELECT m.workspace_id, m.role
             FROM membership m
             INNER JOIN workspace w ON w.id = m.workspace_id
             INNER JOIN user u ON u.id = m.user_id
             WHERE m.user_id = :user_id AND w.status = 'active'
             ORDER BY (m.workspace_id = u.active_workspace_id) DESC, m.id ASC
             LIMIT 1;",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], |row| {
            let workspace_id: DatabaseId = row.get(0)?;
            let role = map_role(row, 1)?;

            Ok((workspace_id, role))
        })
        .optional()?;

    let (workspace_id, role) = row.ok_or(Error::WorkspaceNotActive)?;

    Ok(RequestContext {
        user_id,
        workspace_id,
        role,
    })
}

/// Rename a workspace.
///
/// # Errors
/// Returns [Error::UpdateMissingWorkspace] if the workspace does not exist
/// or has been deleted, and [Error::EmptyName] if `name` is blank.
pub fn rename_workspace(
    workspace_id: DatabaseId,
    name: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let name = super::domain::validate_workspace_name(name)?;

    let rows_affected = connection.execute(
        "UPDATE workspace SET name = ?1 WHERE id = ?2 AND status != 'deleted';",
        (&name, workspace_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingWorkspace);
    }

    Ok(())
}

/// Archive an active workspace.
///
/// # Errors
/// Returns [Error::UpdateMissingWorkspace] if the workspace does not exist
/// or is not active.
pub fn archive_workspace(workspace_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    set_workspace_status(
        workspace_id,
        WorkspaceStatus::Active,
        WorkspaceStatus::Archived,
        connection,
    )
}

/// Restore an archived workspace to active.
///
/// # Errors
/// Returns [Error::UpdateMissingWorkspace] if the workspace does not exist
/// or is not archived.
pub fn restore_workspace(workspace_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    set_workspace_status(
        workspace_id,
        WorkspaceStatus::Archived,
        WorkspaceStatus::Active,
        connection,
    )
}

/// Soft-delete an archived workspace.
///
/// The workspace's data is kept but the workspace disappears from every
/// listing. A workspace must be archived before it can be deleted.
///
/// # Errors
/// Returns [Error::UpdateMissingWorkspace] if the workspace does not exist
/// or is not archived.
pub fn delete_workspace(workspace_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    set_workspace_status(
        workspace_id,
        WorkspaceStatus::Archived,
        WorkspaceStatus::Deleted,
        connection,
    )
}

fn set_workspace_status(
    workspace_id: DatabaseId,
    from: WorkspaceStatus,
    to: WorkspaceStatus,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE workspace SET status = ?1 WHERE id = ?2 AND status = ?3;",
        (to.as_str(), workspace_id, from.as_str()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingWorkspace);
    }

    Ok(())
}

/// Add `user_id` to a workspace with the given role.
///
/// # Errors
/// Returns [Error::DuplicateMember] if the user is already a member.
pub fn add_member(
    workspace_id: DatabaseId,
    user_id: UserId,
    role: Role,
    connection: &Connection,
) -> Result<Membership, Error> {
    connection.execute(
        "INSERT INTO membership (workspace_id, user_id, role) VALUES (?1, ?2, ?3);",
        (workspace_id, user_id.as_i64(), role.as_str()),
    )?;

    Ok(Membership {
        id: connection.last_insert_rowid(),
        workspace_id,
        user_id,
        role,
    })
}

/// Retrieve the caller's membership in a workspace.
///
/// # Errors
/// Returns [Error::Forbidden] if the user is not a member.
pub fn get_membership(
    workspace_id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Membership, Error> {
    connection
        .prepare(
            "SELECT id, workspace_id, user_id, role
             FROM membership
             WHERE workspace_id = :workspace_id AND user_id = :user_id;",
        )?
        .query_row(
            &[
                (":workspace_id", &workspace_id),
                (":user_id", &user_id.as_i64()),
            ],
            |row| {
                Ok(Membership {
                    id: row.get(0)?,
                    workspace_id: row.get(1)?,
                    user_id: UserId::new(row.get(2)?),
                    role: map_role(row, 3)?,
                })
            },
        )
        .optional()?
        .ok_or(Error::Forbidden)
}

/// Retrieve a workspace's members with their email addresses, ordered by email.
pub fn get_members(workspace_id: DatabaseId, connection: &Connection) -> Result<Vec<Member>, Error> {
    connection
        .prepare(
            "SELECT m.id, m.user_id, u.email, m.role
             FROM membership m
             INNER JOIN user u ON u.id = m.user_id
             WHERE m.workspace_id = :workspace_id
             ORDER BY u.email ASC;",
        )?
        .query_map(&[(":workspace_id", &workspace_id)], |row| {
            Ok(Member {
                membership_id: row.get(0)?,
                user_id: UserId::new(row.get(1)?),
                email: row.get(2)?,
                role: map_role(row, 3)?,
            })
        })?
        .map(|maybe_member| maybe_member.map_err(|error| error.into()))
        .collect()
}

fn map_workspace_row(row: &Row) -> Result<Workspace, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let raw_status: String = row.get(2)?;

    let status = WorkspaceStatus::parse(&raw_status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown workspace status '{raw_status}'").into(),
        )
    })?;

    Ok(Workspace { id, name, status })
}

fn map_role(row: &Row, index: usize) -> Result<Role, rusqlite::Error> {
    let raw_role: String = row.get(index)?;

    Role::parse(&raw_role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("unknown role '{raw_role}'").into(),
        )
    })
}

#[cfg(test)]
mod workspace_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::Role,
        user::{NewUser, PasswordHash, User, create_user, set_active_workspace},
        workspace::WorkspaceStatus,
    };

    use super::{
        add_member, archive_workspace, create_workspace_with_admin, delete_workspace,
        get_active_context, get_members, get_membership, get_workspace, get_workspaces_for_user,
        rename_workspace, restore_workspace,
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).expect("Could not initialize database");
        connection
    }

    fn create_test_user(email: &str, connection: &Connection) -> User {
        create_user(
            NewUser {
                email: email.to_owned(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
            },
            connection,
        )
        .expect("Could not create test user")
    }

    #[test]
    fn create_workspace_makes_creator_admin() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);

        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");

        assert_eq!(workspace.name, "Acme Corp");
        assert_eq!(workspace.status, WorkspaceStatus::Active);

        let membership = get_membership(workspace.id, user.id, &connection)
            .expect("Creator should be a member");
        assert_eq!(membership.role, Role::Admin);
    }

    #[test]
    fn create_workspace_rejects_blank_name() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);

        let result = create_workspace_with_admin("   ", user.id, &connection);

        assert_eq!(result, Err(Error::EmptyName("workspace name")));
    }

    #[test]
    fn first_workspace_becomes_active_context() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");

        let context = get_active_context(user.id, &connection)
            .expect("Could not resolve active context");

        assert_eq!(context.user_id, user.id);
        assert_eq!(context.workspace_id, workspace.id);
        assert_eq!(context.role, Role::Admin);
    }

    #[test]
    fn active_context_prefers_selected_workspace() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);
        create_workspace_with_admin("First", user.id, &connection)
            .expect("Could not create workspace");
        let second = create_workspace_with_admin("Second", user.id, &connection)
            .expect("Could not create workspace");

        set_active_workspace(user.id, Some(second.id), &connection)
            .expect("Could not set active workspace");

        let context = get_active_context(user.id, &connection)
            .expect("Could not resolve active context");
        assert_eq!(context.workspace_id, second.id);
    }

    #[test]
    fn active_context_falls_back_when_selected_workspace_is_archived() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);
        let first = create_workspace_with_admin("First", user.id, &connection)
            .expect("Could not create workspace");
        let second = create_workspace_with_admin("Second", user.id, &connection)
            .expect("Could not create workspace");
        set_active_workspace(user.id, Some(second.id), &connection)
            .expect("Could not set active workspace");

        archive_workspace(second.id, &connection).expect("Could not archive workspace");

        let context = get_active_context(user.id, &connection)
            .expect("Could not resolve active context");
        assert_eq!(context.workspace_id, first.id);
    }

    #[test]
    fn active_context_fails_with_no_active_workspace() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);

        let result = get_active_context(user.id, &connection);

        assert_eq!(result, Err(Error::WorkspaceNotActive));
    }

    #[test]
    fn lifecycle_requires_archive_before_delete() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");

        // Deleting an active workspace is rejected.
        assert_eq!(
            delete_workspace(workspace.id, &connection),
            Err(Error::UpdateMissingWorkspace)
        );

        archive_workspace(workspace.id, &connection).expect("Could not archive workspace");
        assert_eq!(
            get_workspace(workspace.id, &connection).unwrap().status,
            WorkspaceStatus::Archived
        );

        delete_workspace(workspace.id, &connection).expect("Could not delete workspace");
        assert_eq!(
            get_workspace(workspace.id, &connection).unwrap().status,
            WorkspaceStatus::Deleted
        );
    }

    #[test]
    fn archive_is_not_idempotent() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");

        archive_workspace(workspace.id, &connection).expect("Could not archive workspace");

        assert_eq!(
            archive_workspace(workspace.id, &connection),
            Err(Error::UpdateMissingWorkspace)
        );
    }

    #[test]
    fn restore_returns_workspace_to_active() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");
        archive_workspace(workspace.id, &connection).expect("Could not archive workspace");

        restore_workspace(workspace.id, &connection).expect("Could not restore workspace");

        assert_eq!(
            get_workspace(workspace.id, &connection).unwrap().status,
            WorkspaceStatus::Active
        );
    }

    #[test]
    fn deleted_workspaces_are_hidden_from_listing() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);
        let kept = create_workspace_with_admin("Kept", user.id, &connection)
            .expect("Could not create workspace");
        let dropped = create_workspace_with_admin("Dropped", user.id, &connection)
            .expect("Could not create workspace");
        archive_workspace(dropped.id, &connection).expect("Could not archive workspace");
        delete_workspace(dropped.id, &connection).expect("Could not delete workspace");

        let workspaces = get_workspaces_for_user(user.id, &connection)
            .expect("Could not list workspaces");

        assert_eq!(workspaces.len(), 1);
        assert_eq!(workspaces[0].0.id, kept.id);
    }

    #[test]
    fn rename_workspace_updates_name() {
        let connection = get_test_db_connection();
        let user = create_test_user("foo@bar.baz", &connection);
        let workspace = create_workspace_with_admin("Old Name", user.id, &connection)
            .expect("Could not create workspace");

        rename_workspace(workspace.id, "New Name", &connection)
            .expect("Could not rename workspace");

        assert_eq!(
            get_workspace(workspace.id, &connection).unwrap().name,
            "New Name"
        );
    }

    #[test]
    fn rename_missing_workspace_fails() {
        let connection = get_test_db_connection();

        let result = rename_workspace(999, "New Name", &connection);

        assert_eq!(result, Err(Error::UpdateMissingWorkspace));
    }

    #[test]
    fn add_member_rejects_duplicates() {
        let connection = get_test_db_connection();
        let admin = create_test_user("admin@bar.baz", &connection);
        let member = create_test_user("member@bar.baz", &connection);
        let workspace = create_workspace_with_admin("Acme Corp", admin.id, &connection)
            .expect("Could not create workspace");

        add_member(workspace.id, member.id, Role::Member, &connection)
            .expect("Could not add member");

        let duplicate = add_member(workspace.id, member.id, Role::Manager, &connection);
        assert_eq!(duplicate, Err(Error::DuplicateMember));
    }

    #[test]
    fn get_members_lists_members_with_emails() {
        let connection = get_test_db_connection();
        let admin = create_test_user("admin@bar.baz", &connection);
        let member = create_test_user("member@bar.baz", &connection);
        let workspace = create_workspace_with_admin("Acme Corp", admin.id, &connection)
            .expect("Could not create workspace");
        add_member(workspace.id, member.id, Role::Member, &connection)
            .expect("Could not add member");

        let members = get_members(workspace.id, &connection).expect("Could not list members");

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].email, "admin@bar.baz");
        assert_eq!(members[0].role, Role::Admin);
        assert_eq!(members[1].email, "member@bar.baz");
        assert_eq!(members[1].role, Role::Member);
    }

    #[test]
    fn get_membership_fails_for_non_member() {
        let connection = get_test_db_connection();
        let admin = create_test_user("admin@bar.baz", &connection);
        let outsider = create_test_user("outsider@bar.baz", &connection);
        let workspace = create_workspace_with_admin("Acme Corp", admin.id, &connection)
            .expect("Could not create workspace");

        let result = get_membership(workspace.id, outsider.id, &connection);

        assert_eq!(result, Err(Error::Forbidden));
    }
}
