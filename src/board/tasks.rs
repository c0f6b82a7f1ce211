//! Task creation, update and deletion endpoints.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    alert::Alert,
    auth::RequestContext,
    board::{
        NewTask, TaskStatus, TaskUpdate, create_task, delete_task, domain::TaskFormData,
        get_board, get_task, update_task,
    },
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
};

/// The state needed for the task endpoints.
#[derive(Debug, Clone)]
pub struct TaskEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for TaskEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

fn lock_connection(state: &TaskEndpointState) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

/// Check that `board_id` belongs to the caller's workspace.
///
/// Boards from other workspaces are reported as not found so board IDs do
/// not leak across tenants.
fn require_board_in_workspace(
    board_id: DatabaseId,
    context: &RequestContext,
    connection: &Connection,
) -> Result<(), Error> {
    let board = get_board(board_id, connection)?;

    if board.workspace_id != context.workspace_id {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn invalid_status_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Alert::error(
            "Invalid task status",
            "The task status must be one of To Do, In Progress or Done.",
        ),
    )
        .into_response()
}

/// Handle task creation form submission.
pub async fn create_task_endpoint(
    State(state): State<TaskEndpointState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<TaskFormData>,
) -> Response {
    let Some(board_id) = form_data.board_id else {
        return Error::NotFound.into_alert_response();
    };
    let Some(status) = TaskStatus::parse(&form_data.status) else {
        return invalid_status_response();
    };

    let result = lock_connection(&state).and_then(|connection| {
        require_board_in_workspace(board_id, &context, &connection)?;
        let assignee_id = form_data.parse_assignee()?;

        create_task(
            NewTask {
                board_id,
                title: form_data.title.clone(),
                description: form_data.description.clone(),
                status,
                assignee_id,
            },
            &connection,
        )
    });

    match result {
        Ok(_) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Boards);

            redirect_to_board(board_id)
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a task: {error}");
            error.into_alert_response()
        }
    }
}

/// Handle task update form submission.
pub async fn update_task_endpoint(
    Path(task_id): Path<DatabaseId>,
    State(state): State<TaskEndpointState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<TaskFormData>,
) -> Response {
    let Some(status) = TaskStatus::parse(&form_data.status) else {
        return invalid_status_response();
    };

    let result = lock_connection(&state).and_then(|connection| {
        let task = get_task(task_id, &connection)?;
        require_board_in_workspace(task.board_id, &context, &connection)?;
        let assignee_id = form_data.parse_assignee()?;

        update_task(
            task_id,
            TaskUpdate {
                title: form_data.title.clone(),
                description: form_data.description.clone(),
                status,
                assignee_id,
            },
            &connection,
        )?;

        Ok(task.board_id)
    });

    match result {
        Ok(board_id) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Boards);

            redirect_to_board(board_id)
        }
        Err(error) => {
            tracing::error!("Failed to update task {task_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Handle task deletion.
pub async fn delete_task_endpoint(
    Path(task_id): Path<DatabaseId>,
    State(state): State<TaskEndpointState>,
    Extension(context): Extension<RequestContext>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        let task = get_task(task_id, &connection)?;
        require_board_in_workspace(task.board_id, &context, &connection)?;

        delete_task(task_id, &connection)?;

        Ok(task.board_id)
    });

    match result {
        Ok(board_id) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Boards);

            redirect_to_board(board_id)
        }
        Err(error) => {
            tracing::error!("Failed to delete task {task_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn redirect_to_board(board_id: DatabaseId) -> Response {
    (
        HxRedirect(endpoints::format_endpoint(endpoints::BOARD_VIEW, board_id)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
