//! Time entry creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use time::{OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error, endpoints,
    auth::RequestContext,
    board::{Task, get_board, get_task, get_workspace_tasks},
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    timesheet::{
        NewTimeEntry, create_time_entry,
        domain::TimeEntryFormData,
        form::{FormMethod, TimeEntryFormDefaults, time_entry_form_view},
    },
    timezone::get_local_offset,
};

/// The state needed for the time entry creation page and endpoint.
#[derive(Debug, Clone)]
pub struct CreateTimeEntryState {
    pub local_timezone: UtcOffset,
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for CreateTimeEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            // An invalid timezone is caught at log in, fall back to UTC here.
            local_timezone: get_local_offset(&state.local_timezone).unwrap_or(UtcOffset::UTC),
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Render the page for logging a new time entry.
pub async fn get_new_time_entry_page(
    State(state): State<CreateTimeEntryState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let today = OffsetDateTime::now_utc()
        .to_offset(state.local_timezone)
        .date();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let tasks = get_workspace_tasks(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve tasks: {error}"))?;

    let defaults = TimeEntryFormDefaults {
        date: today,
        minutes: None,
        description: "",
        task_id: None,
    };

    Ok(new_time_entry_view(&defaults, &tasks, "").into_response())
}

/// Handle time entry creation form submission.
///
/// The entry is always recorded against the caller's own user and active
/// workspace from the request context, never from form fields.
pub async fn create_time_entry_endpoint(
    State(state): State<CreateTimeEntryState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<TimeEntryFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = form_data.parse_task_id().and_then(|task_id| {
        if let Some(task_id) = task_id {
            require_task_in_workspace(task_id, context.workspace_id, &connection)?;
        }

        create_time_entry(
            NewTimeEntry {
                workspace_id: context.workspace_id,
                user_id: context.user_id,
                task_id,
                date: form_data.date,
                minutes: form_data.minutes,
                description: form_data.description.clone(),
            },
            &connection,
        )
    });

    match result {
        Ok(_) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Timesheet);

            (
                HxRedirect(endpoints::TIMESHEET_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a time entry: {error}");
            error.into_alert_response()
        }
    }
}

/// Check that a task belongs to the caller's workspace before linking a
/// time entry to it.
pub(super) fn require_task_in_workspace(
    task_id: DatabaseId,
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    let task = get_task(task_id, connection)?;
    let board = get_board(task.board_id, connection)?;

    if board.workspace_id != workspace_id {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn new_time_entry_view(
    defaults: &TimeEntryFormDefaults,
    tasks: &[Task],
    error_message: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TIME_ENTRY_VIEW).into_html();
    let form = time_entry_form_view(
        FormMethod::Post,
        endpoints::POST_TIME_ENTRY,
        defaults,
        tasks,
        "Log Time",
        error_message,
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Log Time", &content)
}
