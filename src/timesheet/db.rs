//! Database operations for time entries.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    timesheet::{
        NewTimeEntry, TimeEntry, TimeEntryUpdate,
        domain::{validate_minutes, week_end, week_start},
    },
    user::UserId,
};

/// Initialize the time entry table.
pub fn create_time_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS time_entry (
            id INTEGER PRIMARY KEY,
            workspace_id INTEGER NOT NULL REFERENCES workspace(id),
            user_id INTEGER NOT NULL REFERENCES user(id),
            task_id INTEGER REFERENCES task(id),
            date TEXT NOT NULL,
            minutes INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_time_entry_user_date
            ON time_entry(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_time_entry_workspace
            ON time_entry(workspace_id);",
    )?;

    Ok(())
}

/// Create a time entry and return it with its generated ID.
///
/// # Errors
/// Returns [Error::NonPositiveAmount] if the duration is zero or negative.
pub fn create_time_entry(
    new_entry: NewTimeEntry,
    connection: &Connection,
) -> Result<TimeEntry, Error> {
    let minutes = validate_minutes(new_entry.minutes)?;

    connection.execute(
        "INSERT INTO time_entry (workspace_id, user_id, task_id, date, minutes, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        (
            new_entry.workspace_id,
            new_entry.user_id.as_i64(),
            new_entry.task_id,
            new_entry.date,
            minutes,
            &new_entry.description,
        ),
    )?;

    Ok(TimeEntry {
        id: connection.last_insert_rowid(),
        workspace_id: new_entry.workspace_id,
        user_id: new_entry.user_id,
        task_id: new_entry.task_id,
        date: new_entry.date,
        minutes,
        description: new_entry.description,
    })
}

/// Retrieve a time entry by its ID.
pub fn get_time_entry(
    entry_id: DatabaseId,
    connection: &Connection,
) -> Result<TimeEntry, Error> {
    connection
        .prepare(
            "SELECT id, workspace_id, user_id, task_id, date, minutes, description
             FROM time_entry WHERE id = :id;",
        )?
        .query_row(&[(":id", &entry_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a user's time entries for the week containing `date`.
///
/// Entries are ordered by date, oldest first.
pub fn get_time_entries_for_week(
    user_id: UserId,
    workspace_id: DatabaseId,
    date: Date,
    connection: &Connection,
) -> Result<Vec<TimeEntry>, Error> {
    connection
        .prepare(
            "SELECT id, workspace_id, user_id, task_id, date, minutes, description
             FROM time_entry
             WHERE user_id = :user_id
               AND workspace_id = :workspace_id
               AND date BETWEEN :start AND :end
             ORDER BY date ASC, id ASC;",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":workspace_id": workspace_id,
                ":start": week_start(date),
                ":end": week_end(date),
            },
            map_row,
        )?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Update a time entry's date, duration, description and task.
///
/// # Errors
/// Returns [Error::UpdateMissingTimeEntry] if the entry does not exist, and
/// [Error::NonPositiveAmount] if the duration is zero or negative.
pub fn update_time_entry(
    entry_id: DatabaseId,
    update: TimeEntryUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let minutes = validate_minutes(update.minutes)?;

    let rows_affected = connection.execute(
        "UPDATE time_entry SET task_id = ?1, date = ?2, minutes = ?3, description = ?4
         WHERE id = ?5;",
        (
            update.task_id,
            update.date,
            minutes,
            &update.description,
            entry_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTimeEntry);
    }

    Ok(())
}

/// Delete a time entry.
///
/// # Errors
/// Returns [Error::DeleteMissingTimeEntry] if the entry does not exist.
pub fn delete_time_entry(entry_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM time_entry WHERE id = ?1;", (entry_id,))?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTimeEntry);
    }

    Ok(())
}

/// The total minutes logged by everyone in a workspace during the week
/// containing `date`.
pub fn total_minutes_for_week(
    workspace_id: DatabaseId,
    date: Date,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(minutes), 0)
             FROM time_entry
             WHERE workspace_id = :workspace_id AND date BETWEEN :start AND :end;",
            rusqlite::named_params! {
                ":workspace_id": workspace_id,
                ":start": week_start(date),
                ":end": week_end(date),
            },
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// The total minutes a user logged in a workspace between two dates,
/// inclusive. Payroll uses this to generate wage items for a pay period.
pub fn total_minutes_for_user_in_range(
    workspace_id: DatabaseId,
    user_id: UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(minutes), 0)
             FROM time_entry
             WHERE workspace_id = :workspace_id
               AND user_id = :user_id
               AND date BETWEEN :start AND :end;",
            rusqlite::named_params! {
                ":workspace_id": workspace_id,
                ":user_id": user_id.as_i64(),
                ":start": start,
                ":end": end,
            },
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<TimeEntry, rusqlite::Error> {
    let user_id: i64 = row.get(2)?;

    Ok(TimeEntry {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        user_id: UserId::new(user_id),
        task_id: row.get(3)?,
        date: row.get(4)?,
        minutes: row.get(5)?,
        description: row.get(6)?,
    })
}
