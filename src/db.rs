//! Database initialization for the application.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    account::create_account_table,
    board::{create_board_table, create_task_table},
    journal::{create_entry_line_table, create_journal_entry_table},
    payroll::{create_payroll_table, create_payroll_transaction_table, create_transaction_item_table},
    timesheet::create_time_entry_table,
    user::create_user_table,
    workspace::{create_membership_table, create_workspace_table},
};

/// Create the application tables if they do not already exist.
///
/// Tables are created inside a single exclusive transaction so a partially
/// initialized database is never left behind.
///
/// # Errors
/// Returns an error if the database cannot be initialized.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_workspace_table(&transaction)?;
    create_membership_table(&transaction)?;
    create_board_table(&transaction)?;
    create_task_table(&transaction)?;
    create_time_entry_table(&transaction)?;
    create_account_table(&transaction)?;
    create_journal_entry_table(&transaction)?;
    create_entry_line_table(&transaction)?;
    create_payroll_table(&transaction)?;
    create_payroll_transaction_table(&transaction)?;
    create_transaction_item_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
