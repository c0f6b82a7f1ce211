//! Account deletion endpoint.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{delete_account, get_account},
    auth::RequestContext,
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
};

/// The state needed for deleting an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for DeleteAccountEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Delete an account that has no journal entry lines.
///
/// Only managers and admins may change the chart of accounts. Accounts that
/// have been posted to are refused so the journal keeps its audit trail.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountEndpointState>,
    Extension(context): Extension<RequestContext>,
    Path(account_id): Path<DatabaseId>,
) -> Response {
    if !context.role.can_manage() {
        return Error::Forbidden.into_alert_response();
    }

    let result = lock_connection(&state).and_then(|connection| {
        let account = get_account(account_id, &connection)?;

        if account.workspace_id != context.workspace_id {
            return Err(Error::NotFound);
        }

        delete_account(account_id, &connection)
    });

    match result {
        Ok(()) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Journal);

            StatusCode::OK.into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn lock_connection(
    state: &DeleteAccountEndpointState,
) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}
