//! Time entry editing page and endpoints.
//!
//! Time entries belong to the user who logged them; only the owner may
//! edit or delete an entry, checked here against the stored row.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::RequestContext,
    board::{Task, get_workspace_tasks},
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    timesheet::{
        TimeEntry, TimeEntryUpdate, create::require_task_in_workspace, delete_time_entry,
        domain::TimeEntryFormData,
        form::{FormMethod, TimeEntryFormDefaults, time_entry_form_view},
        get_time_entry, update_time_entry,
    },
};

/// The state needed for editing and deleting time entries.
#[derive(Debug, Clone)]
pub struct EditTimeEntryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for EditTimeEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

fn lock_connection(state: &EditTimeEntryState) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

/// Fetch an entry and check the caller owns it.
///
/// Entries outside the caller's workspace are reported as not found,
/// another member's entries as forbidden.
fn get_owned_entry(
    entry_id: DatabaseId,
    context: &RequestContext,
    connection: &Connection,
) -> Result<TimeEntry, Error> {
    let entry = get_time_entry(entry_id, connection)?;

    if entry.workspace_id != context.workspace_id {
        return Err(Error::NotFound);
    }

    if entry.user_id != context.user_id {
        return Err(Error::Forbidden);
    }

    Ok(entry)
}

/// Render the time entry editing page.
pub async fn get_edit_time_entry_page(
    Path(entry_id): Path<DatabaseId>,
    State(state): State<EditTimeEntryState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state)?;

    let entry = get_owned_entry(entry_id, &context, &connection)?;
    let tasks = get_workspace_tasks(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve tasks: {error}"))?;

    Ok(edit_time_entry_view(&entry, &tasks).into_response())
}

/// Handle time entry update form submission.
pub async fn update_time_entry_endpoint(
    Path(entry_id): Path<DatabaseId>,
    State(state): State<EditTimeEntryState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<TimeEntryFormData>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        get_owned_entry(entry_id, &context, &connection)?;

        let task_id = form_data.parse_task_id()?;
        if let Some(task_id) = task_id {
            require_task_in_workspace(task_id, context.workspace_id, &connection)?;
        }

        update_time_entry(
            entry_id,
            TimeEntryUpdate {
                task_id,
                date: form_data.date,
                minutes: form_data.minutes,
                description: form_data.description.clone(),
            },
            &connection,
        )
    });

    match result {
        Ok(()) => {
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
            tracing::error!("Failed to update time entry {entry_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Handle time entry deletion.
pub async fn delete_time_entry_endpoint(
    Path(entry_id): Path<DatabaseId>,
    State(state): State<EditTimeEntryState>,
    Extension(context): Extension<RequestContext>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        get_owned_entry(entry_id, &context, &connection)?;

        delete_time_entry(entry_id, &connection)
    });

    match result {
        Ok(()) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Timesheet);

            StatusCode::OK.into_response()
        }
        Err(error) => {
            tracing::error!("Failed to delete time entry {entry_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn edit_time_entry_view(entry: &TimeEntry, tasks: &[Task]) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_TIME_ENTRY_VIEW, entry.id);
    let update_url = endpoints::format_endpoint(endpoints::PUT_TIME_ENTRY, entry.id);
    let nav_bar = NavBar::new(&edit_url).into_html();

    let defaults = TimeEntryFormDefaults {
        date: entry.date,
        minutes: Some(entry.minutes),
        description: &entry.description,
        task_id: entry.task_id,
    };
    let form = time_entry_form_view(
        FormMethod::Put,
        &update_url,
        &defaults,
        tasks,
        "Update Entry",
        "",
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Time Entry", &content)
}
