//! Database operations for user accounts.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    database_id::DatabaseId,
    user::{NewUser, PasswordHash, User, UserId},
};

/// Initialize the user table.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            active_workspace_id INTEGER REFERENCES workspace(id)
        );

        CREATE INDEX IF NOT EXISTS idx_user_email ON user(email);",
    )?;

    Ok(())
}

/// Create a user and return it with its generated ID.
///
/// # Errors
/// Returns [Error::DuplicateEmail] if a user with the same email already exists.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, password) VALUES (?1, ?2);",
        (&new_user.email, new_user.password_hash.to_string()),
    )?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: new_user.email,
        password_hash: new_user.password_hash,
    })
}

/// Retrieve a user by their email address.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE email = :email;")?
        .query_row(&[(":email", email)], map_row)
        .map_err(|error| error.into())
}

/// Record `workspace_id` as the workspace the user sees after logging in.
///
/// Passing `None` clears the selection, and the auth middleware falls back to
/// the user's first workspace.
pub fn set_active_workspace(
    user_id: UserId,
    workspace_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET active_workspace_id = ?1 WHERE id = ?2",
        (workspace_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// The workspace the user last selected, if any.
pub(crate) fn get_active_workspace_id(
    user_id: UserId,
    connection: &Connection,
) -> Result<Option<DatabaseId>, Error> {
    connection
        .query_row(
            "SELECT active_workspace_id FROM user WHERE id = :id;",
            &[(":id", &user_id.as_i64())],
            |row| row.get(0),
        )
        .optional()
        .map(Option::flatten)
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserId::new(row.get(0)?);
    let email: String = row.get(1)?;
    let raw_hash: String = row.get(2)?;

    Ok(User {
        id,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_hash),
    })
}
