//! The dashboard: a live overview of the active workspace.
//!
//! The page subscribes to the change event stream and reloads itself whenever
//! data in the workspace changes, so every card stays current without polling.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use time::{OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error, endpoints,
    auth::RequestContext,
    board::count_open_tasks,
    html::{PAGE_CONTAINER_STYLE, base, format_cents, format_minutes},
    journal::{TrialBalance, get_trial_balance},
    navigation::NavBar,
    payroll::count_unlocked_transactions,
    timesheet::total_minutes_for_week,
    timezone::get_local_offset,
};

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub local_timezone: UtcOffset,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            // An invalid timezone is caught at log in, fall back to UTC here.
            local_timezone: get_local_offset(&state.local_timezone).unwrap_or(UtcOffset::UTC),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The numbers shown on the dashboard cards.
#[derive(Debug, PartialEq)]
struct DashboardSummary {
    /// Minutes logged by the whole workspace this week.
    minutes_this_week: i64,
    /// Tasks that are not yet done, across all active boards.
    open_tasks: i64,
    /// Payroll transactions that have not been locked.
    unlocked_transactions: i64,
    /// The journal's debit and credit totals.
    trial_balance: TrialBalance,
}

/// Display a page with an overview of the active workspace's data.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
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

    let summary = DashboardSummary {
        minutes_this_week: total_minutes_for_week(context.workspace_id, today, &connection)?,
        open_tasks: count_open_tasks(context.workspace_id, &connection)?,
        unlocked_transactions: count_unlocked_transactions(context.workspace_id, &connection)?,
        trial_balance: get_trial_balance(context.workspace_id, &connection)?,
    };

    Ok(dashboard_view(&summary).into_response())
}

const CARD_STYLE: &str = "p-6 bg-white border border-gray-200 rounded-lg shadow-sm \
    dark:bg-gray-800 dark:border-gray-700";

const CARD_HEADING_STYLE: &str = "mb-2 text-sm font-medium text-gray-500 dark:text-gray-400";

const CARD_VALUE_STYLE: &str = "text-2xl font-bold text-gray-900 dark:text-white";

fn dashboard_view(summary: &DashboardSummary) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    // Reload the page whenever the event stream reports a change in this
    // workspace.
    let refresh_script = format!(
        "new EventSource('{}').addEventListener('change', () => location.reload());",
        endpoints::EVENTS
    );

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="grid grid-cols-1 gap-4 sm:grid-cols-2 w-full lg:max-w-4xl"
            {
                div class=(CARD_STYLE)
                {
                    h3 class=(CARD_HEADING_STYLE) { "Hours This Week" }
                    p class=(CARD_VALUE_STYLE) { (format_minutes(summary.minutes_this_week)) }
                }

                div class=(CARD_STYLE)
                {
                    h3 class=(CARD_HEADING_STYLE) { "Open Tasks" }
                    p class=(CARD_VALUE_STYLE) { (summary.open_tasks) }
                }

                div class=(CARD_STYLE)
                {
                    h3 class=(CARD_HEADING_STYLE) { "Unlocked Payroll Transactions" }
                    p class=(CARD_VALUE_STYLE) { (summary.unlocked_transactions) }
                }

                div class=(CARD_STYLE)
                {
                    h3 class=(CARD_HEADING_STYLE) { "Trial Balance" }

                    p class=(CARD_VALUE_STYLE)
                    {
                        (format_cents(summary.trial_balance.debits))
                    }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Debits "
                        (format_cents(summary.trial_balance.debits))
                        " / Credits "
                        (format_cents(summary.trial_balance.credits))
                    }
                }
            }
        }

        script { (PreEscaped(refresh_script)) }
    );

    base("Dashboard", &content)
}
