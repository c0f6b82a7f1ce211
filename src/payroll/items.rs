//! Endpoints for transaction items and the transaction lock.
//!
//! Every write re-checks the transaction's lock at the database layer, so a
//! lock applied after a form was rendered still refuses the write.

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
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
    journal::dollars_to_cents,
    payroll::{
        db::{create_item, delete_item, get_item, get_payroll, get_transaction, lock_transaction, update_item},
        domain::{ItemFormData, ItemKind},
        view::get_visible_transaction,
    },
};

/// The state needed for the transaction item and lock endpoints.
#[derive(Debug, Clone)]
pub struct PayrollItemEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for PayrollItemEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

fn lock_connection(
    state: &PayrollItemEndpointState,
) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

/// Resolve an item's transaction, hiding items from other workspaces.
fn get_workspace_item_transaction(
    item_id: DatabaseId,
    context: &RequestContext,
    connection: &Connection,
) -> Result<DatabaseId, Error> {
    let item = get_item(item_id, connection)?;
    let transaction = get_transaction(item.transaction_id, connection)?;
    let payroll = get_payroll(transaction.payroll_id, connection)?;

    if payroll.workspace_id != context.workspace_id {
        return Err(Error::NotFound);
    }

    Ok(transaction.id)
}

/// Handle the add item form submission.
pub async fn create_item_endpoint(
    State(state): State<PayrollItemEndpointState>,
    Extension(context): Extension<RequestContext>,
    Path(transaction_id): Path<DatabaseId>,
    Form(form_data): Form<ItemFormData>,
) -> Response {
    if !context.role.can_manage() {
        return Error::Forbidden.into_alert_response();
    }

    let Some(kind) = ItemKind::parse(&form_data.kind) else {
        return (
            StatusCode::BAD_REQUEST,
            Alert::error(
                "Invalid item kind",
                "The item kind must be a wage or a deduction.",
            ),
        )
            .into_response();
    };

    let result = lock_connection(&state).and_then(|connection| {
        get_visible_transaction(transaction_id, &context, &connection)?;

        create_item(
            transaction_id,
            kind,
            &form_data.description,
            dollars_to_cents(form_data.amount),
            &connection,
        )
    });

    match result {
        Ok(_) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Payroll);

            let view_url =
                endpoints::format_endpoint(endpoints::PAYROLL_TRANSACTION_VIEW, transaction_id);

            (HxRedirect(view_url), StatusCode::SEE_OTHER).into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// Handle an item edit submission.
pub async fn update_item_endpoint(
    State(state): State<PayrollItemEndpointState>,
    Extension(context): Extension<RequestContext>,
    Path(item_id): Path<DatabaseId>,
    Form(form_data): Form<ItemFormData>,
) -> Response {
    if !context.role.can_manage() {
        return Error::Forbidden.into_alert_response();
    }

    let Some(kind) = ItemKind::parse(&form_data.kind) else {
        return (
            StatusCode::BAD_REQUEST,
            Alert::error(
                "Invalid item kind",
                "The item kind must be a wage or a deduction.",
            ),
        )
            .into_response();
    };

    let result = lock_connection(&state).and_then(|connection| {
        let transaction_id = get_workspace_item_transaction(item_id, &context, &connection)?;

        update_item(
            item_id,
            kind,
            &form_data.description,
            dollars_to_cents(form_data.amount),
            &connection,
        )?;

        Ok(transaction_id)
    });

    match result {
        Ok(transaction_id) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Payroll);

            let view_url =
                endpoints::format_endpoint(endpoints::PAYROLL_TRANSACTION_VIEW, transaction_id);

            (HxRedirect(view_url), StatusCode::SEE_OTHER).into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// Handle an item delete request.
pub async fn delete_item_endpoint(
    State(state): State<PayrollItemEndpointState>,
    Extension(context): Extension<RequestContext>,
    Path(item_id): Path<DatabaseId>,
) -> Response {
    if !context.role.can_manage() {
        return Error::Forbidden.into_alert_response();
    }

    let result = lock_connection(&state).and_then(|connection| {
        get_workspace_item_transaction(item_id, &context, &connection)?;

        delete_item(item_id, &connection)
    });

    match result {
        Ok(()) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Payroll);

            StatusCode::OK.into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// Handle a lock request.
///
/// Only admins may lock. Locking an already locked transaction succeeds
/// without changing anything.
pub async fn lock_transaction_endpoint(
    State(state): State<PayrollItemEndpointState>,
    Extension(context): Extension<RequestContext>,
    Path(transaction_id): Path<DatabaseId>,
) -> Response {
    if !context.role.is_admin() {
        return Error::Forbidden.into_alert_response();
    }

    let result = lock_connection(&state).and_then(|connection| {
        get_visible_transaction(transaction_id, &context, &connection)?;

        lock_transaction(transaction_id, &connection)
    });

    match result {
        Ok(()) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Payroll);

            let view_url =
                endpoints::format_endpoint(endpoints::PAYROLL_TRANSACTION_VIEW, transaction_id);

            (HxRedirect(view_url), StatusCode::SEE_OTHER).into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
