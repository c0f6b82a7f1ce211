//! Database operations for the journal.
//!
//! Entries and their lines are always written inside a transaction so a
//! half-posted entry can never be observed.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    journal::domain::{
        EntryLineDetail, JournalEntry, JournalEntryDetail, LineKind, NewEntryLine, TrialBalance,
        validate_entry_lines,
    },
};

/// Initialize the journal entry table.
pub fn create_journal_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS journal_entry (
            id INTEGER PRIMARY KEY,
            workspace_id INTEGER NOT NULL REFERENCES workspace(id),
            date TEXT NOT NULL,
            memo TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_journal_entry_workspace
            ON journal_entry(workspace_id, date);",
    )?;

    Ok(())
}

/// Initialize the entry line table.
pub fn create_entry_line_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS entry_line (
            id INTEGER PRIMARY KEY,
            entry_id INTEGER NOT NULL REFERENCES journal_entry(id),
            account_id INTEGER NOT NULL REFERENCES account(id),
            kind TEXT NOT NULL,
            amount INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entry_line_entry ON entry_line(entry_id);
        CREATE INDEX IF NOT EXISTS idx_entry_line_account ON entry_line(account_id);",
    )?;

    Ok(())
}

/// Check that every line posts to an account in the workspace's chart.
fn validate_line_accounts(
    lines: &[NewEntryLine],
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    let mut statement =
        connection.prepare("SELECT workspace_id FROM account WHERE id = :account_id;")?;

    for line in lines {
        let owner: Option<DatabaseId> = statement
            .query_row(&[(":account_id", &line.account_id)], |row| row.get(0))
            .map(Some)
            .or_else(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                error => Err(error),
            })?;

        if owner != Some(workspace_id) {
            return Err(Error::InvalidAccount(Some(line.account_id)));
        }
    }

    Ok(())
}

/// Post a journal entry with its lines atomically.
///
/// # Errors
/// Returns [Error::TooFewEntryLines], [Error::NonPositiveAmount] or
/// [Error::UnbalancedEntry] if the lines do not form a valid entry, and
/// [Error::InvalidAccount] if a line posts to an account outside the
/// workspace's chart of accounts.
pub fn create_journal_entry(
    workspace_id: DatabaseId,
    date: Date,
    memo: &str,
    lines: &[NewEntryLine],
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    validate_entry_lines(lines)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    validate_line_accounts(lines, workspace_id, &transaction)?;

    transaction.execute(
        "INSERT INTO journal_entry (workspace_id, date, memo) VALUES (?1, ?2, ?3);",
        (workspace_id, date, memo),
    )?;
    let entry_id = transaction.last_insert_rowid();

    insert_lines(entry_id, lines, &transaction)?;

    transaction.commit()?;

    Ok(JournalEntry {
        id: entry_id,
        workspace_id,
        date,
        memo: memo.to_owned(),
    })
}

/// Replace a journal entry's header and lines atomically.
///
/// # Errors
/// Returns [Error::UpdateMissingEntry] if the entry does not exist, plus the
/// same validation errors as [create_journal_entry].
pub fn update_journal_entry(
    entry_id: DatabaseId,
    date: Date,
    memo: &str,
    lines: &[NewEntryLine],
    connection: &Connection,
) -> Result<(), Error> {
    validate_entry_lines(lines)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let workspace_id: DatabaseId = transaction
        .query_row(
            "SELECT workspace_id FROM journal_entry WHERE id = :entry_id;",
            &[(":entry_id", &entry_id)],
            |row| row.get(0),
        )
        .or_else(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Err(Error::UpdateMissingEntry),
            error => Err(error.into()),
        })?;

    validate_line_accounts(lines, workspace_id, &transaction)?;

    transaction.execute(
        "UPDATE journal_entry SET date = ?1, memo = ?2 WHERE id = ?3;",
        (date, memo, entry_id),
    )?;
    transaction.execute(
        "DELETE FROM entry_line WHERE entry_id = ?1;",
        (entry_id,),
    )?;

    insert_lines(entry_id, lines, &transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Delete a journal entry and its lines atomically.
///
/// # Errors
/// Returns [Error::DeleteMissingEntry] if the entry does not exist.
pub fn delete_journal_entry(entry_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute("DELETE FROM entry_line WHERE entry_id = ?1;", (entry_id,))?;
    let rows_affected =
        transaction.execute("DELETE FROM journal_entry WHERE id = ?1;", (entry_id,))?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingEntry);
    }

    transaction.commit()?;

    Ok(())
}

fn insert_lines(
    entry_id: DatabaseId,
    lines: &[NewEntryLine],
    transaction: &SqlTransaction,
) -> Result<(), Error> {
    let mut statement = transaction.prepare(
        "INSERT INTO entry_line (entry_id, account_id, kind, amount) VALUES (?1, ?2, ?3, ?4);",
    )?;

    for line in lines {
        statement.execute((entry_id, line.account_id, line.kind.as_str(), line.amount))?;
    }

    Ok(())
}

/// Retrieve a journal entry header by its ID.
pub fn get_journal_entry(
    entry_id: DatabaseId,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    connection
        .prepare("SELECT id, workspace_id, date, memo FROM journal_entry WHERE id = :entry_id;")?
        .query_row(&[(":entry_id", &entry_id)], map_entry_row)
        .map_err(|error| error.into())
}

/// Retrieve a journal entry's lines with their account codes and names.
pub fn get_entry_lines(
    entry_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<EntryLineDetail>, Error> {
    connection
        .prepare(
            "SELECT l.id, l.account_id, a.code, a.name, l.kind, l.amount
             FROM entry_line l
             INNER JOIN account a ON a.id = l.account_id
             WHERE l.entry_id = :entry_id
             ORDER BY l.id ASC;",
        )?
        .query_map(&[(":entry_id", &entry_id)], map_line_row)?
        .map(|maybe_line| maybe_line.map_err(|error| error.into()))
        .collect()
}

/// The number of journal entries posted in a workspace.
pub fn count_journal_entries(
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(1) FROM journal_entry WHERE workspace_id = :workspace_id;",
            &[(":workspace_id", &workspace_id)],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Retrieve one page of a workspace's journal, newest first, with lines.
pub fn get_journal_entries(
    workspace_id: DatabaseId,
    page: u64,
    page_size: u64,
    connection: &Connection,
) -> Result<Vec<JournalEntryDetail>, Error> {
    let offset = page.saturating_sub(1) * page_size;

    let entries: Vec<JournalEntry> = connection
        .prepare(
            "SELECT id, workspace_id, date, memo
             FROM journal_entry
             WHERE workspace_id = :workspace_id
             ORDER BY date DESC, id DESC
             LIMIT :limit OFFSET :offset;",
        )?
        .query_map(
            rusqlite::named_params! {
                ":workspace_id": workspace_id,
                // SQLite integers are i64, so the u64 page maths must not
                // cross the FFI boundary unchanged.
                ":limit": page_size as i64,
                ":offset": offset as i64,
            },
            map_entry_row,
        )?
        .collect::<Result<_, _>>()?;

    entries
        .into_iter()
        .map(|entry| {
            let lines = get_entry_lines(entry.id, connection)?;

            Ok(JournalEntryDetail { entry, lines })
        })
        .collect()
}

/// Retrieve a workspace's whole journal, oldest first, for export.
pub fn get_all_journal_entries(
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<JournalEntryDetail>, Error> {
    let entries: Vec<JournalEntry> = connection
        .prepare(
            "SELECT id, workspace_id, date, memo
             FROM journal_entry
             WHERE workspace_id = :workspace_id
             ORDER BY date ASC, id ASC;",
        )?
        .query_map(&[(":workspace_id", &workspace_id)], map_entry_row)?
        .collect::<Result<_, _>>()?;

    entries
        .into_iter()
        .map(|entry| {
            let lines = get_entry_lines(entry.id, connection)?;

            Ok(JournalEntryDetail { entry, lines })
        })
        .collect()
}

/// The workspace's total debits and credits.
///
/// A healthy journal always has equal totals since every entry balances.
pub fn get_trial_balance(
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<TrialBalance, Error> {
    connection
        .query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN l.kind = 'debit' THEN l.amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN l.kind = 'credit' THEN l.amount ELSE 0 END), 0)
             FROM entry_line l
             INNER JOIN journal_entry e ON e.id = l.entry_id
             WHERE e.workspace_id = :workspace_id;",
            &[(":workspace_id", &workspace_id)],
            |row| {
                Ok(TrialBalance {
                    debits: row.get(0)?,
                    credits: row.get(1)?,
                })
            },
        )
        .map_err(|error| error.into())
}

fn map_entry_row(row: &Row) -> Result<JournalEntry, rusqlite::Error> {
    Ok(JournalEntry {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        date: row.get(2)?,
        memo: row.get(3)?,
    })
}

fn map_line_row(row: &Row) -> Result<EntryLineDetail, rusqlite::Error> {
    let raw_kind: String = row.get(4)?;
    let kind = LineKind::parse(&raw_kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown entry line kind '{raw_kind}'").into(),
        )
    })?;

    Ok(EntryLineDetail {
        id: row.get(0)?,
        account_id: row.get(1)?,
        account_code: row.get(2)?,
        account_name: row.get(3)?,
        kind,
        amount: row.get(5)?,
    })
}
