//! Database operations for boards and tasks.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    board::{Board, BoardStatus, NewTask, Task, TaskStatus, TaskUpdate},
    database_id::DatabaseId,
    user::UserId,
};

/// Initialize the board table.
pub fn create_board_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS board (
            id INTEGER PRIMARY KEY,
            workspace_id INTEGER NOT NULL REFERENCES workspace(id),
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active'
        );

        CREATE INDEX IF NOT EXISTS idx_board_workspace ON board(workspace_id);",
    )?;

    Ok(())
}

/// Initialize the task table.
pub fn create_task_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS task (
            id INTEGER PRIMARY KEY,
            board_id INTEGER NOT NULL REFERENCES board(id),
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'todo',
            assignee_id INTEGER REFERENCES user(id)
        );

        CREATE INDEX IF NOT EXISTS idx_task_board ON task(board_id);",
    )?;

    Ok(())
}

/// Create a board in a workspace.
///
/// # Errors
/// Returns [Error::EmptyName] if `name` is blank.
pub fn create_board(
    workspace_id: DatabaseId,
    name: &str,
    connection: &Connection,
) -> Result<Board, Error> {
    let name = super::domain::validate_board_name(name)?;

    connection.execute(
        "INSERT INTO board (workspace_id, name, status) VALUES (?1, ?2, 'active');",
        (workspace_id, &name),
    )?;

    Ok(Board {
        id: connection.last_insert_rowid(),
        workspace_id,
        name,
        status: BoardStatus::Active,
    })
}

/// Retrieve a board by its ID.
pub fn get_board(board_id: DatabaseId, connection: &Connection) -> Result<Board, Error> {
    connection
        .prepare("SELECT id, workspace_id, name, status FROM board WHERE id = :id;")?
        .query_row(&[(":id", &board_id)], map_board_row)
        .map_err(|error| error.into())
}

/// Retrieve a workspace's boards, excluding deleted ones, ordered by name.
pub fn get_boards(
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<Board>, Error> {
    connection
        .prepare(
            "SELECT id, workspace_id, name, status
             FROM board
             WHERE workspace_id = :workspace_id AND status != 'deleted'
             ORDER BY name ASC;",
        )?
        .query_map(&[(":workspace_id", &workspace_id)], map_board_row)?
        .map(|maybe_board| maybe_board.map_err(|error| error.into()))
        .collect()
}

/// Archive an active board.
///
/// # Errors
/// Returns [Error::UpdateMissingBoard] if the board does not exist or is
/// not active.
pub fn archive_board(board_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    set_board_status(board_id, BoardStatus::Active, BoardStatus::Archived, connection)
}

/// Restore an archived board to active.
///
/// # Errors
/// Returns [Error::UpdateMissingBoard] if the board does not exist or is
/// not archived.
pub fn restore_board(board_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    set_board_status(board_id, BoardStatus::Archived, BoardStatus::Active, connection)
}

/// Soft-delete an archived board.
///
/// # Errors
/// Returns [Error::UpdateMissingBoard] if the board does not exist or is
/// not archived.
pub fn delete_board(board_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    set_board_status(board_id, BoardStatus::Archived, BoardStatus::Deleted, connection)
}

fn set_board_status(
    board_id: DatabaseId,
    from: BoardStatus,
    to: BoardStatus,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE board SET status = ?1 WHERE id = ?2 AND status = ?3;",
        (to.as_str(), board_id, from.as_str()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBoard);
    }

    Ok(())
}

/// Create a task and return it with its generated ID.
///
/// # Errors
/// Returns [Error::EmptyName] if the title is blank.
pub fn create_task(new_task: NewTask, connection: &Connection) -> Result<Task, Error> {
    let title = super::domain::validate_task_title(&new_task.title)?;

    connection.execute(
        "INSERT INTO task (board_id, title, description, status, assignee_id)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        (
            new_task.board_id,
            &title,
            &new_task.description,
            new_task.status.as_str(),
            new_task.assignee_id.map(UserId::as_i64),
        ),
    )?;

    Ok(Task {
        id: connection.last_insert_rowid(),
        board_id: new_task.board_id,
        title,
        description: new_task.description,
        status: new_task.status,
        assignee_id: new_task.assignee_id,
    })
}

/// Retrieve a task by its ID.
pub fn get_task(task_id: DatabaseId, connection: &Connection) -> Result<Task, Error> {
    connection
        .prepare(
            "SELECT id, board_id, title, description, status, assignee_id
             FROM task WHERE id = :id;",
        )?
        .query_row(&[(":id", &task_id)], map_task_row)
        .map_err(|error| error.into())
}

/// Retrieve a board's tasks in column order.
pub fn get_tasks_for_board(
    board_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<Task>, Error> {
    connection
        .prepare(
            "SELECT id, board_id, title, description, status, assignee_id
             FROM task
             WHERE board_id = :board_id
             ORDER BY id ASC;",
        )?
        .query_map(&[(":board_id", &board_id)], map_task_row)?
        .map(|maybe_task| maybe_task.map_err(|error| error.into()))
        .collect()
}

/// Update a task's title, description, status and assignee.
///
/// # Errors
/// Returns [Error::UpdateMissingTask] if the task does not exist, and
/// [Error::EmptyName] if the title is blank.
pub fn update_task(
    task_id: DatabaseId,
    update: TaskUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let title = super::domain::validate_task_title(&update.title)?;

    let rows_affected = connection.execute(
        "UPDATE task SET title = ?1, description = ?2, status = ?3, assignee_id = ?4
         WHERE id = ?5;",
        (
            &title,
            &update.description,
            update.status.as_str(),
            update.assignee_id.map(UserId::as_i64),
            task_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTask);
    }

    Ok(())
}

/// Delete a task.
///
/// # Errors
/// Returns [Error::DeleteMissingTask] if the task does not exist.
pub fn delete_task(task_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM task WHERE id = ?1;", (task_id,))?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTask);
    }

    Ok(())
}

/// Retrieve every task on a workspace's non-deleted boards, for linking
/// time entries to tasks.
pub fn get_workspace_tasks(
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<Task>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.board_id, t.title, t.description, t.status, t.assignee_id
             FROM task t
             INNER JOIN board b ON b.id = t.board_id
             WHERE b.workspace_id = :workspace_id AND b.status != 'deleted'
             ORDER BY t.title ASC;",
        )?
        .query_map(&[(":workspace_id", &workspace_id)], map_task_row)?
        .map(|maybe_task| maybe_task.map_err(|error| error.into()))
        .collect()
}

/// The number of unfinished tasks on a workspace's non-deleted boards.
pub fn count_open_tasks(
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(t.id)
             FROM task t
             INNER JOIN board b ON b.id = t.board_id
             WHERE b.workspace_id = :workspace_id
               AND b.status != 'deleted'
               AND t.status != 'done';",
            &[(":workspace_id", &workspace_id)],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_board_row(row: &Row) -> Result<Board, rusqlite::Error> {
    let raw_status: String = row.get(3)?;
    let status = BoardStatus::parse(&raw_status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown board status '{raw_status}'").into(),
        )
    })?;

    Ok(Board {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        name: row.get(2)?,
        status,
    })
}

fn map_task_row(row: &Row) -> Result<Task, rusqlite::Error> {
    let raw_status: String = row.get(4)?;
    let status = TaskStatus::parse(&raw_status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown task status '{raw_status}'").into(),
        )
    })?;
    let assignee_id: Option<i64> = row.get(5)?;

    Ok(Task {
        id: row.get(0)?,
        board_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status,
        assignee_id: assignee_id.map(UserId::new),
    })
}
