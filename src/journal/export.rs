//! CSV export of the workspace's journal.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::RequestContext,
    journal::{db::get_all_journal_entries, domain::JournalEntryDetail},
};

/// The state needed for the journal export.
#[derive(Debug, Clone)]
pub struct ExportJournalState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportJournalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Download the workspace's journal as a CSV file, one row per line.
pub async fn export_journal_endpoint(
    State(state): State<ExportJournalState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = get_all_journal_entries(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve journal for export: {error}"))?;

    let csv = match write_journal_csv(&entries) {
        Ok(csv) => csv,
        Err(error) => {
            tracing::error!("Failed to serialize journal CSV: {error}");
            return Ok(Error::SqlError(rusqlite::Error::InvalidQuery).into_alert_response());
        }
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"journal.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// Serialize entries to CSV. Amounts are in dollars with two decimals.
fn write_journal_csv(entries: &[JournalEntryDetail]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "date",
        "memo",
        "account_code",
        "account_name",
        "side",
        "amount",
    ])?;

    for detail in entries {
        for line in &detail.lines {
            writer.write_record([
                detail.entry.date.to_string(),
                detail.entry.memo.clone(),
                line.account_code.clone(),
                line.account_name.clone(),
                line.kind.as_str().to_owned(),
                format!("{}.{:02}", line.amount / 100, line.amount % 100),
            ])?;
        }
    }

    let bytes = writer.into_inner().expect("flushing a Vec cannot fail");

    Ok(String::from_utf8(bytes).expect("CSV output is valid UTF-8"))
}
