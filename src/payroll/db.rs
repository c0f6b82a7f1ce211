//! Database operations for payroll.
//!
//! Transaction totals are never stored. They are recomputed from the items on
//! every read so the total can never drift from the lines that make it up.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    html::format_minutes,
    payroll::domain::{
        ItemKind, Payroll, PayrollTransaction, PayrollTransactionSummary, TransactionItem,
        validate_amount,
    },
    timesheet::total_minutes_for_user_in_range,
    user::UserId,
    workspace::get_members,
};

/// The flat hourly rate used for wage items generated from the timesheet,
/// until per-member rates exist.
pub(crate) const GENERATED_WAGE_RATE_CENTS_PER_HOUR: i64 = 2_500;

/// Initialize the payroll table.
pub fn create_payroll_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS payroll (
            id INTEGER PRIMARY KEY,
            workspace_id INTEGER NOT NULL REFERENCES workspace(id),
            period_start TEXT NOT NULL,
            period_end TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_payroll_workspace ON payroll(workspace_id);",
    )?;

    Ok(())
}

/// Initialize the payroll transaction table.
pub fn create_payroll_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS payroll_transaction (
            id INTEGER PRIMARY KEY,
            payroll_id INTEGER NOT NULL REFERENCES payroll(id),
            user_id INTEGER NOT NULL REFERENCES user(id),
            is_locked INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_payroll_transaction_payroll
            ON payroll_transaction(payroll_id);",
    )?;

    Ok(())
}

/// Initialize the transaction item table.
pub fn create_transaction_item_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transaction_item (
            id INTEGER PRIMARY KEY,
            transaction_id INTEGER NOT NULL REFERENCES payroll_transaction(id),
            kind TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            amount INTEGER NOT NULL,
            editable INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_item_transaction
            ON transaction_item(transaction_id);",
    )?;

    Ok(())
}

/// Create a payroll run with one transaction per workspace member.
///
/// Members with time logged in the period get a read-only wage item computed
/// from their timesheet. The run and all of its transactions are written
/// atomically.
///
/// # Errors
/// Returns [Error::InvalidPeriod] if the period end is before its start.
pub fn create_payroll_run(
    workspace_id: DatabaseId,
    period_start: Date,
    period_end: Date,
    connection: &Connection,
) -> Result<Payroll, Error> {
    if period_end < period_start {
        return Err(Error::InvalidPeriod);
    }

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "INSERT INTO payroll (workspace_id, period_start, period_end) VALUES (?1, ?2, ?3);",
        (workspace_id, period_start, period_end),
    )?;
    let payroll_id = transaction.last_insert_rowid();

    for member in get_members(workspace_id, &transaction)? {
        transaction.execute(
            "INSERT INTO payroll_transaction (payroll_id, user_id) VALUES (?1, ?2);",
            (payroll_id, member.user_id.as_i64()),
        )?;
        let transaction_id = transaction.last_insert_rowid();

        let minutes = total_minutes_for_user_in_range(
            workspace_id,
            member.user_id,
            period_start,
            period_end,
            &transaction,
        )?;

        if minutes > 0 {
            let amount = minutes * GENERATED_WAGE_RATE_CENTS_PER_HOUR / 60;

            transaction.execute(
                "INSERT INTO transaction_item (transaction_id, kind, description, amount, editable)
                 VALUES (?1, ?2, ?3, ?4, 0);",
                (
                    transaction_id,
                    ItemKind::Wage.as_str(),
                    format!("Logged time ({})", format_minutes(minutes)),
                    amount,
                ),
            )?;
        }
    }

    transaction.commit()?;

    Ok(Payroll {
        id: payroll_id,
        workspace_id,
        period_start,
        period_end,
    })
}

/// Retrieve a payroll run by its ID.
pub fn get_payroll(payroll_id: DatabaseId, connection: &Connection) -> Result<Payroll, Error> {
    connection
        .prepare(
            "SELECT id, workspace_id, period_start, period_end FROM payroll WHERE id = :id;",
        )?
        .query_row(&[(":id", &payroll_id)], map_payroll_row)
        .map_err(|error| error.into())
}

/// Retrieve a workspace's payroll runs, newest period first.
pub fn get_payrolls(
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<Payroll>, Error> {
    connection
        .prepare(
            "SELECT id, workspace_id, period_start, period_end
             FROM payroll
             WHERE workspace_id = :workspace_id
             ORDER BY period_start DESC, id DESC;",
        )?
        .query_map(&[(":workspace_id", &workspace_id)], map_payroll_row)?
        .map(|maybe_payroll| maybe_payroll.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a payroll transaction by its ID.
pub fn get_transaction(
    transaction_id: DatabaseId,
    connection: &Connection,
) -> Result<PayrollTransaction, Error> {
    connection
        .prepare(
            "SELECT id, payroll_id, user_id, is_locked
             FROM payroll_transaction WHERE id = :id;",
        )?
        .query_row(&[(":id", &transaction_id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve a run's transactions with member emails and computed totals.
pub fn get_transactions_for_payroll(
    payroll_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<PayrollTransactionSummary>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.payroll_id, t.user_id, t.is_locked, u.email,
                COALESCE((
                    SELECT SUM(CASE WHEN i.kind = 'wage' THEN i.amount ELSE -i.amount END)
                    FROM transaction_item i
                    WHERE i.transaction_id = t.id
                ), 0)
             FROM payroll_transaction t
             INNER JOIN user u ON u.id = t.user_id
             WHERE t.payroll_id = :payroll_id
             ORDER BY u.email ASC;",
        )?
        .query_map(&[(":payroll_id", &payroll_id)], |row| {
            Ok(PayrollTransactionSummary {
                transaction: map_transaction_row(row)?,
                email: row.get(4)?,
                total: row.get(5)?,
            })
        })?
        .map(|maybe_summary| maybe_summary.map_err(|error| error.into()))
        .collect()
}

/// A transaction's net pay in cents: wages minus deductions.
pub fn get_transaction_total(
    transaction_id: DatabaseId,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(CASE WHEN kind = 'wage' THEN amount ELSE -amount END), 0)
             FROM transaction_item
             WHERE transaction_id = :transaction_id;",
            &[(":transaction_id", &transaction_id)],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Retrieve a transaction's items in insertion order.
pub fn get_items(
    transaction_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<TransactionItem>, Error> {
    connection
        .prepare(
            "SELECT id, transaction_id, kind, description, amount, editable
             FROM transaction_item
             WHERE transaction_id = :transaction_id
             ORDER BY id ASC;",
        )?
        .query_map(&[(":transaction_id", &transaction_id)], map_item_row)?
        .map(|maybe_item| maybe_item.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a transaction item by its ID.
pub fn get_item(item_id: DatabaseId, connection: &Connection) -> Result<TransactionItem, Error> {
    connection
        .prepare(
            "SELECT id, transaction_id, kind, description, amount, editable
             FROM transaction_item WHERE id = :id;",
        )?
        .query_row(&[(":id", &item_id)], map_item_row)
        .map_err(|error| error.into())
}

/// Add an item to a payroll transaction.
///
/// The lock is re-checked here, at the write boundary, so a transaction that
/// was locked after the form was rendered still refuses the write.
///
/// # Errors
/// Returns [Error::LockedPayrollTransaction] if the transaction is locked,
/// and [Error::NonPositiveAmount] if the amount is zero or negative.
pub fn create_item(
    transaction_id: DatabaseId,
    kind: ItemKind,
    description: &str,
    amount: i64,
    connection: &Connection,
) -> Result<TransactionItem, Error> {
    let amount = validate_amount(amount)?;

    let transaction = get_transaction(transaction_id, connection)?;

    if transaction.is_locked {
        return Err(Error::LockedPayrollTransaction);
    }

    connection.execute(
        "INSERT INTO transaction_item (transaction_id, kind, description, amount, editable)
         VALUES (?1, ?2, ?3, ?4, 1);",
        (transaction_id, kind.as_str(), description, amount),
    )?;

    Ok(TransactionItem {
        id: connection.last_insert_rowid(),
        transaction_id,
        kind,
        description: description.to_owned(),
        amount,
        editable: true,
    })
}

/// The lock and editability state an item write must pass.
fn get_item_write_state(
    item_id: DatabaseId,
    connection: &Connection,
) -> Result<Option<(bool, bool)>, Error> {
    connection
        .query_row(
            "SELECT t.is_locked, i.editable
             FROM transaction_item i
             INNER JOIN payroll_transaction t ON t.id = i.transaction_id
             WHERE i.id = :item_id;",
            &[(":item_id", &item_id)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map(Some)
        .or_else(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            error => Err(error.into()),
        })
}

/// Update an item's kind, description and amount.
///
/// # Errors
/// Returns [Error::UpdateMissingItem] if the item does not exist,
/// [Error::LockedPayrollTransaction] if its transaction is locked,
/// [Error::ItemNotEditable] for generated items, and
/// [Error::NonPositiveAmount] if the amount is zero or negative.
pub fn update_item(
    item_id: DatabaseId,
    kind: ItemKind,
    description: &str,
    amount: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let amount = validate_amount(amount)?;

    let (is_locked, editable) =
        get_item_write_state(item_id, connection)?.ok_or(Error::UpdateMissingItem)?;

    if is_locked {
        return Err(Error::LockedPayrollTransaction);
    }

    if !editable {
        return Err(Error::ItemNotEditable);
    }

    connection.execute(
        "UPDATE transaction_item SET kind = ?1, description = ?2, amount = ?3 WHERE id = ?4;",
        (kind.as_str(), description, amount, item_id),
    )?;

    Ok(())
}

/// Delete an item.
///
/// # Errors
/// Returns [Error::DeleteMissingItem] if the item does not exist,
/// [Error::LockedPayrollTransaction] if its transaction is locked, and
/// [Error::ItemNotEditable] for generated items.
pub fn delete_item(item_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let (is_locked, editable) =
        get_item_write_state(item_id, connection)?.ok_or(Error::DeleteMissingItem)?;

    if is_locked {
        return Err(Error::LockedPayrollTransaction);
    }

    if !editable {
        return Err(Error::ItemNotEditable);
    }

    connection.execute("DELETE FROM transaction_item WHERE id = ?1;", (item_id,))?;

    Ok(())
}

/// Lock a transaction, freezing its items.
///
/// Locking is idempotent: locking an already locked transaction succeeds
/// without changing anything. There is no unlock.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist.
pub fn lock_transaction(
    transaction_id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    // The guarded UPDATE only flips the flag on the first call.
    let rows_affected = connection.execute(
        "UPDATE payroll_transaction SET is_locked = 1 WHERE id = ?1 AND is_locked = 0;",
        (transaction_id,),
    )?;

    if rows_affected == 0 {
        // Already locked, or missing. Only the latter is an error.
        get_transaction(transaction_id, connection)?;
    }

    Ok(())
}

/// How many of a workspace's payroll transactions are still unlocked.
pub fn count_unlocked_transactions(
    workspace_id: DatabaseId,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(1)
             FROM payroll_transaction t
             INNER JOIN payroll p ON p.id = t.payroll_id
             WHERE p.workspace_id = :workspace_id AND t.is_locked = 0;",
            &[(":workspace_id", &workspace_id)],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_payroll_row(row: &Row) -> Result<Payroll, rusqlite::Error> {
    Ok(Payroll {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        period_start: row.get(2)?,
        period_end: row.get(3)?,
    })
}

fn map_transaction_row(row: &Row) -> Result<PayrollTransaction, rusqlite::Error> {
    let user_id: i64 = row.get(2)?;

    Ok(PayrollTransaction {
        id: row.get(0)?,
        payroll_id: row.get(1)?,
        user_id: UserId::new(user_id),
        is_locked: row.get(3)?,
    })
}

fn map_item_row(row: &Row) -> Result<TransactionItem, rusqlite::Error> {
    let raw_kind: String = row.get(2)?;
    let kind = ItemKind::parse(&raw_kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown item kind '{raw_kind}'").into(),
        )
    })?;

    Ok(TransactionItem {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        kind,
        description: row.get(3)?,
        amount: row.get(4)?,
        editable: row.get(5)?,
    })
}

#[cfg(test)]
mod payroll_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::Role,
        database_id::DatabaseId,
        payroll::domain::ItemKind,
        timesheet::{NewTimeEntry, create_time_entry},
        user::{NewUser, PasswordHash, UserId, create_user},
        workspace::{add_member, create_workspace_with_admin},
    };

    use super::{
        GENERATED_WAGE_RATE_CENTS_PER_HOUR, count_unlocked_transactions, create_item,
        create_payroll_run, delete_item, get_item, get_items, get_transaction,
        get_transaction_total, get_transactions_for_payroll, lock_transaction, update_item,
    };

    fn get_test_db_connection() -> (Connection, DatabaseId, UserId) {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            NewUser {
                email: "admin@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
            },
            &connection,
        )
        .expect("Could not create test user");
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");

        (connection, workspace.id, user.id)
    }

    #[test]
    fn run_creates_one_transaction_per_member() {
        let (connection, workspace_id, _admin) = get_test_db_connection();
        let member = create_user(
            NewUser {
                email: "member@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
            },
            &connection,
        )
        .expect("Could not create test user");
        add_member(workspace_id, member.id, Role::Member, &connection)
            .expect("Could not add member");

        let payroll = create_payroll_run(
            workspace_id,
            date!(2026 - 08 - 01),
            date!(2026 - 08 - 15),
            &connection,
        )
        .expect("Could not create payroll run");

        let transactions = get_transactions_for_payroll(payroll.id, &connection).unwrap();
        assert_eq!(transactions.len(), 2);
        assert!(transactions.iter().all(|t| !t.transaction.is_locked));
    }

    #[test]
    fn run_generates_readonly_wage_item_from_timesheet() {
        let (connection, workspace_id, admin) = get_test_db_connection();
        create_time_entry(
            NewTimeEntry {
                workspace_id,
                user_id: admin,
                task_id: None,
                date: date!(2026 - 08 - 03),
                minutes: 120,
                description: "worked".to_owned(),
            },
            &connection,
        )
        .expect("Could not create time entry");

        let payroll = create_payroll_run(
            workspace_id,
            date!(2026 - 08 - 01),
            date!(2026 - 08 - 15),
            &connection,
        )
        .expect("Could not create payroll run");

        let transactions = get_transactions_for_payroll(payroll.id, &connection).unwrap();
        let items = get_items(transactions[0].transaction.id, &connection).unwrap();
        assert_eq!(items.len(), 1);
        assert!(!items[0].editable);
        assert_eq!(items[0].kind, ItemKind::Wage);
        assert_eq!(items[0].amount, 2 * GENERATED_WAGE_RATE_CENTS_PER_HOUR);
    }

    #[test]
    fn backwards_period_is_rejected() {
        let (connection, workspace_id, _admin) = get_test_db_connection();

        let result = create_payroll_run(
            workspace_id,
            date!(2026 - 08 - 15),
            date!(2026 - 08 - 01),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidPeriod));
    }

    #[test]
    fn total_is_wages_minus_deductions() {
        let (connection, workspace_id, _admin) = get_test_db_connection();
        let payroll = create_payroll_run(
            workspace_id,
            date!(2026 - 08 - 01),
            date!(2026 - 08 - 15),
            &connection,
        )
        .unwrap();
        let transaction = get_transactions_for_payroll(payroll.id, &connection).unwrap()[0]
            .transaction;
        create_item(transaction.id, ItemKind::Wage, "Salary", 100_000, &connection).unwrap();
        create_item(transaction.id, ItemKind::Deduction, "Tax", 20_000, &connection).unwrap();

        assert_eq!(get_transaction_total(transaction.id, &connection), Ok(80_000));
    }

    #[test]
    fn locked_transaction_refuses_item_writes() {
        let (connection, workspace_id, _admin) = get_test_db_connection();
        let payroll = create_payroll_run(
            workspace_id,
            date!(2026 - 08 - 01),
            date!(2026 - 08 - 15),
            &connection,
        )
        .unwrap();
        let transaction = get_transactions_for_payroll(payroll.id, &connection).unwrap()[0]
            .transaction;
        let item =
            create_item(transaction.id, ItemKind::Wage, "Salary", 100_000, &connection).unwrap();

        lock_transaction(transaction.id, &connection).expect("Could not lock transaction");

        assert_eq!(
            create_item(transaction.id, ItemKind::Wage, "Bonus", 10_000, &connection),
            Err(Error::LockedPayrollTransaction)
        );
        assert_eq!(
            update_item(item.id, ItemKind::Wage, "Salary", 90_000, &connection),
            Err(Error::LockedPayrollTransaction)
        );
        assert_eq!(
            delete_item(item.id, &connection),
            Err(Error::LockedPayrollTransaction)
        );
        // The items survived untouched.
        assert_eq!(get_item(item.id, &connection).unwrap().amount, 100_000);
    }

    #[test]
    fn locking_twice_succeeds() {
        let (connection, workspace_id, _admin) = get_test_db_connection();
        let payroll = create_payroll_run(
            workspace_id,
            date!(2026 - 08 - 01),
            date!(2026 - 08 - 15),
            &connection,
        )
        .unwrap();
        let transaction = get_transactions_for_payroll(payroll.id, &connection).unwrap()[0]
            .transaction;

        lock_transaction(transaction.id, &connection).expect("Could not lock transaction");
        lock_transaction(transaction.id, &connection).expect("Locking again should succeed");

        assert!(get_transaction(transaction.id, &connection).unwrap().is_locked);
    }

    #[test]
    fn locking_missing_transaction_fails() {
        let (connection, _workspace_id, _admin) = get_test_db_connection();

        assert_eq!(lock_transaction(999, &connection), Err(Error::NotFound));
    }

    #[test]
    fn generated_items_cannot_be_edited_or_deleted() {
        let (connection, workspace_id, admin) = get_test_db_connection();
        create_time_entry(
            NewTimeEntry {
                workspace_id,
                user_id: admin,
                task_id: None,
                date: date!(2026 - 08 - 03),
                minutes: 60,
                description: "worked".to_owned(),
            },
            &connection,
        )
        .unwrap();
        let payroll = create_payroll_run(
            workspace_id,
            date!(2026 - 08 - 01),
            date!(2026 - 08 - 15),
            &connection,
        )
        .unwrap();
        let transaction = get_transactions_for_payroll(payroll.id, &connection).unwrap()[0]
            .transaction;
        let generated = &get_items(transaction.id, &connection).unwrap()[0];

        assert_eq!(
            update_item(generated.id, ItemKind::Wage, "Changed", 1, &connection),
            Err(Error::ItemNotEditable)
        );
        assert_eq!(
            delete_item(generated.id, &connection),
            Err(Error::ItemNotEditable)
        );
    }

    #[test]
    fn zero_amount_item_is_rejected() {
        let (connection, workspace_id, _admin) = get_test_db_connection();
        let payroll = create_payroll_run(
            workspace_id,
            date!(2026 - 08 - 01),
            date!(2026 - 08 - 15),
            &connection,
        )
        .unwrap();
        let transaction = get_transactions_for_payroll(payroll.id, &connection).unwrap()[0]
            .transaction;

        assert_eq!(
            create_item(transaction.id, ItemKind::Wage, "Nothing", 0, &connection),
            Err(Error::NonPositiveAmount)
        );
    }

    #[test]
    fn unlocked_count_tracks_locking() {
        let (connection, workspace_id, _admin) = get_test_db_connection();
        let payroll = create_payroll_run(
            workspace_id,
            date!(2026 - 08 - 01),
            date!(2026 - 08 - 15),
            &connection,
        )
        .unwrap();
        let transaction = get_transactions_for_payroll(payroll.id, &connection).unwrap()[0]
            .transaction;

        assert_eq!(count_unlocked_transactions(workspace_id, &connection), Ok(1));

        lock_transaction(transaction.id, &connection).unwrap();

        assert_eq!(count_unlocked_transactions(workspace_id, &connection), Ok(0));
    }
}
