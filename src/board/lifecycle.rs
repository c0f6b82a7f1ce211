//! Board lifecycle endpoints.
//!
//! Boards are archived before deletion, mirroring the workspace lifecycle.
//! Lifecycle changes require the manager role, re-checked server-side.

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
    board::{archive_board, delete_board, get_board, restore_board},
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
};

/// The state needed for the board lifecycle endpoints.
#[derive(Debug, Clone)]
pub struct BoardLifecycleState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for BoardLifecycleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

fn lock_connection(state: &BoardLifecycleState) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

fn require_managed_board(
    board_id: DatabaseId,
    context: &RequestContext,
    connection: &Connection,
) -> Result<(), Error> {
    let board = get_board(board_id, connection)?;

    if board.workspace_id != context.workspace_id {
        return Err(Error::NotFound);
    }

    if !context.role.can_manage() {
        return Err(Error::Forbidden);
    }

    Ok(())
}

/// Archive an active board.
pub async fn archive_board_endpoint(
    Path(board_id): Path<DatabaseId>,
    State(state): State<BoardLifecycleState>,
    Extension(context): Extension<RequestContext>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        require_managed_board(board_id, &context, &connection)?;
        archive_board(board_id, &connection)
    });

    respond(result, board_id, &state, &context, "archive")
}

/// Restore an archived board to active.
pub async fn restore_board_endpoint(
    Path(board_id): Path<DatabaseId>,
    State(state): State<BoardLifecycleState>,
    Extension(context): Extension<RequestContext>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        require_managed_board(board_id, &context, &connection)?;
        restore_board(board_id, &connection)
    });

    respond(result, board_id, &state, &context, "restore")
}

/// Soft-delete an archived board.
pub async fn delete_board_endpoint(
    Path(board_id): Path<DatabaseId>,
    State(state): State<BoardLifecycleState>,
    Extension(context): Extension<RequestContext>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        require_managed_board(board_id, &context, &connection)?;
        delete_board(board_id, &connection)
    });

    respond(result, board_id, &state, &context, "delete")
}

fn respond(
    result: Result<(), Error>,
    board_id: DatabaseId,
    state: &BoardLifecycleState,
    context: &RequestContext,
    action: &str,
) -> Response {
    match result {
        Ok(()) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Boards);

            (
                HxRedirect(endpoints::BOARDS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Failed to {action} board {board_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod board_lifecycle_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        auth::{RequestContext, Role},
        board::{Board, BoardStatus, create_board, get_board},
        events::ChangeEvents,
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    use super::{BoardLifecycleState, archive_board_endpoint};

    fn get_test_state() -> (BoardLifecycleState, RequestContext, Board) {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            NewUser {
                email: "foo@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
            },
            &connection,
        )
        .expect("Could not create test user");
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");
        let board = create_board(workspace.id, "Sprint 1", &connection)
            .expect("Could not create board");
        let context = RequestContext {
            user_id: user.id,
            workspace_id: workspace.id,
            role: Role::Manager,
        };

        (
            BoardLifecycleState {
                db_connection: Arc::new(Mutex::new(connection)),
                events: ChangeEvents::new(),
            },
            context,
            board,
        )
    }

    #[tokio::test]
    async fn manager_can_archive_board() {
        let (state, context, board) = get_test_state();

        let response =
            archive_board_endpoint(Path(board.id), State(state.clone()), Extension(context)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            get_board(board.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .status,
            BoardStatus::Archived
        );
    }

    #[tokio::test]
    async fn member_cannot_archive_board() {
        let (state, context, board) = get_test_state();
        let member_context = RequestContext {
            role: Role::Member,
            ..context
        };

        let response = archive_board_endpoint(
            Path(board.id),
            State(state.clone()),
            Extension(member_context),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            get_board(board.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .status,
            BoardStatus::Active
        );
    }
}
