//! The payroll transaction page: items, computed total and the lock control.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::RequestContext,
    database_id::DatabaseId,
    html::{
        BADGE_LOCKED_STYLE, BUTTON_ACTION_STYLE, BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE,
        FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_cents,
    },
    navigation::NavBar,
    payroll::{
        db::{get_items, get_payroll, get_transaction, get_transaction_total},
        domain::{ItemKind, PayrollTransaction, TransactionItem},
    },
};

/// The state needed for the payroll transaction page.
#[derive(Debug, Clone)]
pub struct PayrollTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PayrollTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Fetch a transaction, hiding transactions from other workspaces.
///
/// Managers and admins may see any transaction in the workspace, members
/// only their own.
pub(super) fn get_visible_transaction(
    transaction_id: DatabaseId,
    context: &RequestContext,
    connection: &Connection,
) -> Result<PayrollTransaction, Error> {
    let transaction = get_transaction(transaction_id, connection)?;
    let payroll = get_payroll(transaction.payroll_id, connection)?;

    if payroll.workspace_id != context.workspace_id {
        return Err(Error::NotFound);
    }

    if !context.role.can_manage() && transaction.user_id != context.user_id {
        return Err(Error::Forbidden);
    }

    Ok(transaction)
}

/// Render one payroll transaction with its items and running total.
pub async fn get_payroll_transaction_page(
    State(state): State<PayrollTransactionPageState>,
    Extension(context): Extension<RequestContext>,
    Path(transaction_id): Path<DatabaseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_visible_transaction(transaction_id, &context, &connection)?;
    let items = get_items(transaction_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve transaction items: {error}"))?;
    let total = get_transaction_total(transaction_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to compute transaction total: {error}"))?;

    Ok(transaction_view(&transaction, &items, total, &context).into_response())
}

fn transaction_view(
    transaction: &PayrollTransaction,
    items: &[TransactionItem],
    total: i64,
    context: &RequestContext,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::PAYROLLS_VIEW).into_html();
    let lock_url = endpoints::format_endpoint(endpoints::LOCK_PAYROLL_TRANSACTION, transaction.id);

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-3xl"
            {
                header class="flex justify-between flex-wrap items-center gap-4"
                {
                    h1 class="text-xl font-bold" { "Payroll Transaction" }

                    div class="flex items-center gap-4"
                    {
                        @if transaction.is_locked {
                            span class=(BADGE_LOCKED_STYLE) { "Locked" }
                        } @else if context.role.is_admin() {
                            button
                                hx-post=(lock_url)
                                hx-confirm="Lock this transaction? Its items can \
                                    no longer be changed afterwards."
                                class=(BUTTON_ACTION_STYLE)
                            {
                                "Lock"
                            }
                        }
                    }
                }

                section class="dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for item in items {
                                (item_row(item, transaction, context))
                            }

                            tr class="font-bold"
                            {
                                td class=(TABLE_CELL_STYLE) {}
                                td class=(TABLE_CELL_STYLE) { "Net Pay" }
                                td class=(TABLE_CELL_STYLE) { (format_cents(total)) }
                                td class=(TABLE_CELL_STYLE) {}
                            }
                        }
                    }
                }

                @if context.role.can_manage() {
                    (add_item_form_view(transaction))
                }
            }
        }
    );

    base("Payroll Transaction", &content)
}

fn item_row(
    item: &TransactionItem,
    transaction: &PayrollTransaction,
    context: &RequestContext,
) -> Markup {
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_PAYROLL_ITEM, item.id);
    let deletable = context.role.can_manage() && item.editable && !transaction.is_locked;

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (item.kind.label()) }
            td class=(TABLE_CELL_STYLE) { (item.description) }
            td class=(TABLE_CELL_STYLE) { (format_cents(item.kind.signed(item.amount))) }

            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(delete_url)
                    hx-confirm="Are you sure you want to delete this item?"
                    hx-target="closest tr"
                    hx-swap="delete"
                    disabled[!deletable]
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    )
}

fn add_item_form_view(transaction: &PayrollTransaction) -> Markup {
    let create_url = endpoints::format_endpoint(endpoints::POST_PAYROLL_ITEM, transaction.id);

    html!(
        form
            hx-post=(create_url)
            hx-target-error="#alert-container"
            class="space-y-4"
        {
            fieldset disabled[transaction.is_locked] class="space-y-4"
            {
                div
                {
                    label for="kind" class=(FORM_LABEL_STYLE) { "Kind" }

                    select id="kind" name="kind" class=(FORM_SELECT_STYLE)
                    {
                        option value=(ItemKind::Wage.as_str()) { (ItemKind::Wage.label()) }
                        option value=(ItemKind::Deduction.as_str())
                        {
                            (ItemKind::Deduction.label())
                        }
                    }
                }

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                    input
                        id="description"
                        type="text"
                        name="description"
                        placeholder="Bonus"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    input
                        id="amount"
                        type="number"
                        name="amount"
                        step="0.01"
                        min="0"
                        required
                        placeholder="0.00"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Item" }
            }
        }
    )
}
