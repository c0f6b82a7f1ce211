//! The payroll runs listing page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::RequestContext,
    html::{
        BADGE_ACTIVE_STYLE, BADGE_LOCKED_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_cents,
    },
    navigation::NavBar,
    payroll::{
        db::{get_payrolls, get_transactions_for_payroll},
        domain::{Payroll, PayrollTransactionSummary},
    },
};

/// The state needed for the payrolls page.
#[derive(Debug, Clone)]
pub struct PayrollsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PayrollsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the workspace's payroll runs with their transactions.
pub async fn get_payrolls_page(
    State(state): State<PayrollsPageState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let payrolls = get_payrolls(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve payroll runs: {error}"))?;

    let runs = payrolls
        .into_iter()
        .map(|payroll| {
            let transactions = get_transactions_for_payroll(payroll.id, &connection)?;

            Ok((payroll, transactions))
        })
        .collect::<Result<Vec<_>, Error>>()
        .inspect_err(|error| tracing::error!("Failed to retrieve payroll transactions: {error}"))?;

    Ok(payrolls_view(&runs, &context).into_response())
}

fn payrolls_view(
    runs: &[(Payroll, Vec<PayrollTransactionSummary>)],
    context: &RequestContext,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::PAYROLLS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Payroll" }

                    @if context.role.is_admin() {
                        a href=(endpoints::NEW_PAYROLL_VIEW) class=(LINK_STYLE)
                        {
                            "New Payroll Run"
                        }
                    }
                }

                @for (payroll, transactions) in runs {
                    (payroll_run_view(payroll, transactions))
                }

                @if runs.is_empty() {
                    p class="text-gray-500 dark:text-gray-400" { "No payroll runs yet." }
                }
            }
        }
    );

    base("Payroll", &content)
}

fn payroll_run_view(payroll: &Payroll, transactions: &[PayrollTransactionSummary]) -> Markup {
    html!(
        section class="space-y-2 dark:bg-gray-800"
        {
            h2 class="text-lg font-semibold"
            {
                (payroll.period_start) " to " (payroll.period_end)
            }

            table class=(TABLE_STYLE)
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Member" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Net Pay" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for summary in transactions {
                        (transaction_row(summary))
                    }
                }
            }
        }
    )
}

fn transaction_row(summary: &PayrollTransactionSummary) -> Markup {
    let view_url = endpoints::format_endpoint(
        endpoints::PAYROLL_TRANSACTION_VIEW,
        summary.transaction.id,
    );

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (summary.email) }
            td class=(TABLE_CELL_STYLE) { (format_cents(summary.total)) }

            td class=(TABLE_CELL_STYLE)
            {
                @if summary.transaction.is_locked {
                    span class=(BADGE_LOCKED_STYLE) { "Locked" }
                } @else {
                    span class=(BADGE_ACTIVE_STYLE) { "Open" }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                a href=(view_url) class=(LINK_STYLE) { "View" }
            }
        }
    )
}
