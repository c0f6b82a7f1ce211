//! Workspace lifecycle and selection endpoints.
//!
//! Workspaces are archived before deletion, and deletion is a soft delete
//! that hides the workspace without dropping its rows. Lifecycle changes
//! require the admin role, re-checked here against the membership table
//! rather than trusting anything the client sent.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::RequestContext,
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
    user::set_active_workspace,
    workspace::{
        WorkspaceStatus, archive_workspace, delete_workspace, get_membership, get_workspace,
        restore_workspace,
    },
};

/// The state needed for workspace lifecycle endpoints.
#[derive(Debug, Clone)]
pub struct WorkspaceLifecycleState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for WorkspaceLifecycleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

fn lock_connection(
    state: &WorkspaceLifecycleState,
) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

/// Check that the caller administers `workspace_id`.
fn require_admin(
    workspace_id: DatabaseId,
    context: &RequestContext,
    connection: &Connection,
) -> Result<(), Error> {
    let membership = get_membership(workspace_id, context.user_id, connection)?;

    if !membership.role.is_admin() {
        return Err(Error::Forbidden);
    }

    Ok(())
}

/// Archive an active workspace.
pub async fn archive_workspace_endpoint(
    Path(workspace_id): Path<DatabaseId>,
    State(state): State<WorkspaceLifecycleState>,
    Extension(context): Extension<RequestContext>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        require_admin(workspace_id, &context, &connection)?;
        archive_workspace(workspace_id, &connection)
    });

    match result {
        Ok(()) => {
            state.events.publish(workspace_id, ChangeTopic::Workspace);
            redirect_to_workspaces()
        }
        Err(error) => {
            tracing::error!("Failed to archive workspace {workspace_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Restore an archived workspace to active.
pub async fn restore_workspace_endpoint(
    Path(workspace_id): Path<DatabaseId>,
    State(state): State<WorkspaceLifecycleState>,
    Extension(context): Extension<RequestContext>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        require_admin(workspace_id, &context, &connection)?;
        restore_workspace(workspace_id, &connection)
    });

    match result {
        Ok(()) => {
            state.events.publish(workspace_id, ChangeTopic::Workspace);
            redirect_to_workspaces()
        }
        Err(error) => {
            tracing::error!("Failed to restore workspace {workspace_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Soft-delete an archived workspace.
pub async fn delete_workspace_endpoint(
    Path(workspace_id): Path<DatabaseId>,
    State(state): State<WorkspaceLifecycleState>,
    Extension(context): Extension<RequestContext>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        require_admin(workspace_id, &context, &connection)?;
        delete_workspace(workspace_id, &connection)
    });

    match result {
        Ok(()) => {
            state.events.publish(workspace_id, ChangeTopic::Workspace);
            redirect_to_workspaces()
        }
        Err(error) => {
            tracing::error!("Failed to delete workspace {workspace_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Switch the caller's active workspace.
///
/// The target workspace must be active and the caller must be a member of
/// it, any role suffices.
pub async fn select_workspace_endpoint(
    Path(workspace_id): Path<DatabaseId>,
    State(state): State<WorkspaceLifecycleState>,
    Extension(context): Extension<RequestContext>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        get_membership(workspace_id, context.user_id, &connection)?;

        let workspace = get_workspace(workspace_id, &connection)?;
        if workspace.status != WorkspaceStatus::Active {
            return Err(Error::WorkspaceNotActive);
        }

        set_active_workspace(context.user_id, Some(workspace_id), &connection)
    });

    match result {
        Ok(()) => (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Failed to select workspace {workspace_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn redirect_to_workspaces() -> Response {
    (
        HxRedirect(endpoints::WORKSPACES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod workspace_lifecycle_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        auth::{RequestContext, Role},
        events::ChangeEvents,
        user::{NewUser, PasswordHash, User, create_user},
        workspace::{
            Workspace, WorkspaceStatus, add_member, archive_workspace,
            create_workspace_with_admin, get_workspace,
        },
    };

    use super::{
        WorkspaceLifecycleState, archive_workspace_endpoint, delete_workspace_endpoint,
        select_workspace_endpoint,
    };

    fn get_test_state() -> (WorkspaceLifecycleState, User, Workspace) {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            NewUser {
                email: "admin@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
            },
            &connection,
        )
        .expect("Could not create test user");
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");

        (
            WorkspaceLifecycleState {
                db_connection: Arc::new(Mutex::new(connection)),
                events: ChangeEvents::new(),
            },
            user,
            workspace,
        )
    }

    fn admin_context(user: &User, workspace: &Workspace) -> RequestContext {
        RequestContext {
            user_id: user.id,
            workspace_id: workspace.id,
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn admin_can_archive_workspace() {
        let (state, user, workspace) = get_test_state();

        let response = archive_workspace_endpoint(
            Path(workspace.id),
            State(state.clone()),
            Extension(admin_context(&user, &workspace)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            get_workspace(workspace.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .status,
            WorkspaceStatus::Archived
        );
    }

    #[tokio::test]
    async fn non_admin_cannot_archive_workspace() {
        let (state, _admin, workspace) = get_test_state();
        let outsider = {
            let connection = state.db_connection.lock().unwrap();
            let user = create_user(
                NewUser {
                    email: "member@bar.baz".to_owned(),
                    password_hash: PasswordHash::new_unchecked("notarealhash"),
                },
                &connection,
            )
            .expect("Could not create test user");
            add_member(workspace.id, user.id, Role::Member, &connection)
                .expect("Could not add member");
            user
        };

        let response = archive_workspace_endpoint(
            Path(workspace.id),
            State(state.clone()),
            Extension(RequestContext {
                user_id: outsider.id,
                workspace_id: workspace.id,
                role: Role::Member,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            get_workspace(workspace.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .status,
            WorkspaceStatus::Active
        );
    }

    #[tokio::test]
    async fn delete_requires_archived_workspace() {
        let (state, user, workspace) = get_test_state();

        let response = delete_workspace_endpoint(
            Path(workspace.id),
            State(state.clone()),
            Extension(admin_context(&user, &workspace)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_workspace(workspace.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .status,
            WorkspaceStatus::Active
        );
    }

    #[tokio::test]
    async fn select_updates_active_workspace() {
        let (state, user, workspace) = get_test_state();
        let second = create_workspace_with_admin(
            "Second",
            user.id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create workspace");

        let response = select_workspace_endpoint(
            Path(second.id),
            State(state.clone()),
            Extension(admin_context(&user, &workspace)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let active_workspace_id = crate::user::get_active_workspace_id(
            user.id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not read active workspace");
        assert_eq!(active_workspace_id, Some(second.id));
    }

    #[tokio::test]
    async fn cannot_select_archived_workspace() {
        let (state, user, workspace) = get_test_state();
        let second = create_workspace_with_admin(
            "Second",
            user.id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create workspace");
        archive_workspace(second.id, &state.db_connection.lock().unwrap())
            .expect("Could not archive workspace");

        let response = select_workspace_endpoint(
            Path(second.id),
            State(state),
            Extension(admin_context(&user, &workspace)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
