//! Database operations for the chart of accounts.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    account::{Account, AccountKind, domain::validate_account_fields},
    database_id::DatabaseId,
};

/// Initialize the account table.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            workspace_id INTEGER NOT NULL REFERENCES workspace(id),
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            UNIQUE(workspace_id, code)
        );

        CREATE INDEX IF NOT EXISTS idx_account_workspace ON account(workspace_id);",
    )?;

    Ok(())
}

/// Map a unique constraint failure on the account code to a domain error.
fn map_duplicate_code(error: rusqlite::Error, code: &str) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
            if sql_error.extended_code == 2067 && desc.contains("account.code") =>
        {
            Error::DuplicateAccountCode(code.to_owned())
        }
        error => error.into(),
    }
}

/// Create an account in a workspace's chart of accounts.
///
/// # Errors
/// Returns [Error::DuplicateAccountCode] if the code is already used in
/// the workspace, and [Error::EmptyName] if the code or name is blank.
pub fn create_account(
    workspace_id: DatabaseId,
    code: &str,
    name: &str,
    kind: AccountKind,
    connection: &Connection,
) -> Result<Account, Error> {
    let (code, name) = validate_account_fields(code, name)?;

    connection
        .execute(
            "INSERT INTO account (workspace_id, code, name, kind) VALUES (?1, ?2, ?3, ?4);",
            (workspace_id, &code, &name, kind.as_str()),
        )
        .map_err(|error| map_duplicate_code(error, &code))?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        workspace_id,
        code,
        name,
        kind,
    })
}

/// Retrieve an account by its ID.
pub fn get_account(account_id: DatabaseId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, workspace_id, code, name, kind FROM account WHERE id = :id;")?
        .query_row(&[(":id", &account_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a workspace's chart of accounts, ordered by code.
pub fn get_accounts(
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, workspace_id, code, name, kind
             FROM account
             WHERE workspace_id = :workspace_id
             ORDER BY code ASC;",
        )?
        .query_map(&[(":workspace_id", &workspace_id)], map_row)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Update an account's code, name and kind.
///
/// # Errors
/// Returns [Error::UpdateMissingAccount] if the account does not exist,
/// [Error::DuplicateAccountCode] if the new code collides, and
/// [Error::EmptyName] if the code or name is blank.
pub fn update_account(
    account_id: DatabaseId,
    code: &str,
    name: &str,
    kind: AccountKind,
    connection: &Connection,
) -> Result<(), Error> {
    let (code, name) = validate_account_fields(code, name)?;

    let rows_affected = connection
        .execute(
            "UPDATE account SET code = ?1, name = ?2, kind = ?3 WHERE id = ?4;",
            (&code, &name, kind.as_str(), account_id),
        )
        .map_err(|error| map_duplicate_code(error, &code))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}

/// Delete an account that has no journal entry lines.
///
/// Accounts that have been posted to cannot be deleted, the journal would
/// lose its audit trail.
///
/// # Errors
/// Returns [Error::InvalidAccount] if the account has entry lines, and
/// [Error::DeleteMissingAccount] if it does not exist.
pub fn delete_account(account_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    if account_in_use(account_id, connection)? {
        return Err(Error::InvalidAccount(Some(account_id)));
    }

    let rows_affected = connection.execute("DELETE FROM account WHERE id = ?1;", (account_id,))?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAccount);
    }

    Ok(())
}

/// Whether any journal entry line posts to this account.
pub fn account_in_use(account_id: DatabaseId, connection: &Connection) -> Result<bool, Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(1) FROM entry_line WHERE account_id = :account_id;",
        &[(":account_id", &account_id)],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

fn map_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let raw_kind: String = row.get(4)?;
    let kind = AccountKind::parse(&raw_kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown account kind '{raw_kind}'").into(),
        )
    })?;

    Ok(Account {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        code: row.get(2)?,
        name: row.get(3)?,
        kind,
    })
}

#[cfg(test)]
mod account_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::AccountKind,
        database_id::DatabaseId,
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    use super::{create_account, delete_account, get_account, get_accounts, update_account};

    fn get_test_db_connection() -> (Connection, DatabaseId) {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            NewUser {
                email: "foo@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
            },
            &connection,
        )
        .expect("Could not create test user");
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");

        (connection, workspace.id)
    }

    #[test]
    fn create_account_succeeds() {
        let (connection, workspace_id) = get_test_db_connection();

        let account = create_account(workspace_id, "1000", "Cash", AccountKind::Asset, &connection)
            .expect("Could not create account");

        assert_eq!(account.code, "1000");
        assert_eq!(get_account(account.id, &connection), Ok(account));
    }

    #[test]
    fn duplicate_code_in_same_workspace_fails() {
        let (connection, workspace_id) = get_test_db_connection();
        create_account(workspace_id, "1000", "Cash", AccountKind::Asset, &connection)
            .expect("Could not create account");

        let duplicate = create_account(
            workspace_id,
            "1000",
            "Petty Cash",
            AccountKind::Asset,
            &connection,
        );

        assert_eq!(
            duplicate,
            Err(Error::DuplicateAccountCode("1000".to_owned()))
        );
    }

    #[test]
    fn duplicate_code_in_other_workspace_is_allowed() {
        let (connection, workspace_id) = get_test_db_connection();
        let other_user = create_user(
            NewUser {
                email: "other@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
            },
            &connection,
        )
        .expect("Could not create test user");
        let other_workspace = create_workspace_with_admin("Other Corp", other_user.id, &connection)
            .expect("Could not create workspace");
        create_account(workspace_id, "1000", "Cash", AccountKind::Asset, &connection)
            .expect("Could not create account");

        let result = create_account(
            other_workspace.id,
            "1000",
            "Cash",
            AccountKind::Asset,
            &connection,
        );

        assert!(result.is_ok());
    }

    #[test]
    fn accounts_are_listed_in_code_order() {
        let (connection, workspace_id) = get_test_db_connection();
        create_account(workspace_id, "4000", "Sales", AccountKind::Revenue, &connection)
            .expect("Could not create account");
        create_account(workspace_id, "1000", "Cash", AccountKind::Asset, &connection)
            .expect("Could not create account");

        let accounts = get_accounts(workspace_id, &connection).expect("Could not list accounts");

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].code, "1000");
        assert_eq!(accounts[1].code, "4000");
    }

    #[test]
    fn update_account_overwrites_fields() {
        let (connection, workspace_id) = get_test_db_connection();
        let account = create_account(workspace_id, "1000", "Cash", AccountKind::Asset, &connection)
            .expect("Could not create account");

        update_account(
            account.id,
            "1010",
            "Cash at bank",
            AccountKind::Asset,
            &connection,
        )
        .expect("Could not update account");

        let updated = get_account(account.id, &connection).unwrap();
        assert_eq!(updated.code, "1010");
        assert_eq!(updated.name, "Cash at bank");
    }

    #[test]
    fn update_missing_account_fails() {
        let (connection, _workspace_id) = get_test_db_connection();

        let result = update_account(999, "1000", "Cash", AccountKind::Asset, &connection);

        assert_eq!(result, Err(Error::UpdateMissingAccount));
    }

    #[test]
    fn delete_unused_account_succeeds() {
        let (connection, workspace_id) = get_test_db_connection();
        let account = create_account(workspace_id, "1000", "Cash", AccountKind::Asset, &connection)
            .expect("Could not create account");

        delete_account(account.id, &connection).expect("Could not delete account");

        assert_eq!(get_account(account.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn blank_code_is_rejected() {
        let (connection, workspace_id) = get_test_db_connection();

        let result = create_account(workspace_id, " ", "Cash", AccountKind::Asset, &connection);

        assert_eq!(result, Err(Error::EmptyName("account code")));
    }
}
