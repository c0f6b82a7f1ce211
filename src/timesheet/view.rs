//! The weekly timesheet page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error, endpoints,
    auth::RequestContext,
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_minutes,
    },
    navigation::NavBar,
    timesheet::{
        TimeEntry,
        domain::{week_end, week_start},
        get_time_entries_for_week,
    },
    timezone::get_local_offset,
};

/// The state needed for the timesheet page.
#[derive(Debug, Clone)]
pub struct TimesheetPageState {
    pub local_timezone: UtcOffset,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TimesheetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            // An invalid timezone is caught at log in, fall back to UTC here.
            local_timezone: get_local_offset(&state.local_timezone).unwrap_or(UtcOffset::UTC),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for choosing which week to show.
#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    /// Any date inside the week to show. Defaults to the current week.
    pub date: Option<Date>,
}

/// Render the current user's time entries for one week.
pub async fn get_timesheet_page(
    Query(query): Query<WeekQuery>,
    State(state): State<TimesheetPageState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let today = OffsetDateTime::now_utc()
        .to_offset(state.local_timezone)
        .date();
    let date = query.date.unwrap_or(today);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entries =
        get_time_entries_for_week(context.user_id, context.workspace_id, date, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve time entries: {error}"))?;

    Ok(timesheet_view(date, &entries).into_response())
}

fn timesheet_view(date: Date, entries: &[TimeEntry]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TIMESHEET_VIEW).into_html();
    let start = week_start(date);
    let end = week_end(date);
    let total_minutes: i64 = entries.iter().map(|entry| entry.minutes).sum();

    let previous_week_url = format!(
        "{}?date={}",
        endpoints::TIMESHEET_VIEW,
        start - Duration::days(7)
    );
    let next_week_url = format!(
        "{}?date={}",
        endpoints::TIMESHEET_VIEW,
        start + Duration::days(7)
    );

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Timesheet" }

                    a href=(endpoints::NEW_TIME_ENTRY_VIEW) class=(LINK_STYLE)
                    {
                        "Log Time"
                    }
                }

                div class="flex items-center justify-between"
                {
                    a href=(previous_week_url) class=(LINK_STYLE) { "< Previous week" }

                    span class="text-sm text-gray-600 dark:text-gray-300"
                    {
                        (start) " to " (end) " - " (format_minutes(total_minutes))
                    }

                    a href=(next_week_url) class=(LINK_STYLE) { "Next week >" }
                }

                section class="dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Duration" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for entry in entries {
                                (entry_row(entry))
                            }

                            @if entries.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No time logged this week."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Timesheet", &content)
}

fn entry_row(entry: &TimeEntry) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_TIME_ENTRY_VIEW, entry.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_TIME_ENTRY, entry.id);

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (entry.date) }
            td class=(TABLE_CELL_STYLE) { (format_minutes(entry.minutes)) }
            td class=(TABLE_CELL_STYLE) { (entry.description) }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                    button
                        hx-delete=(delete_url)
                        hx-confirm="Are you sure you want to delete this time entry?"
                        hx-target="closest tr"
                        hx-swap="delete"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    )
}
