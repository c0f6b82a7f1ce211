//! Payroll runs: per-member transactions built from the timesheet, with wage
//! and deduction items and an admin-only lock.

mod create;
mod db;
pub(crate) mod domain;
mod items;
mod list;
mod view;

pub use create::{create_payroll_endpoint, get_new_payroll_page};
pub use db::{
    count_unlocked_transactions, create_payroll_table, create_payroll_transaction_table,
    create_transaction_item_table,
};
pub use items::{
    create_item_endpoint, delete_item_endpoint, lock_transaction_endpoint, update_item_endpoint,
};
pub use list::get_payrolls_page;
pub use view::get_payroll_transaction_page;

#[cfg(test)]
pub(crate) use db::{
    create_item, create_payroll_run, get_item, get_items, get_payrolls, get_transaction,
    get_transactions_for_payroll, lock_transaction,
};
#[cfg(test)]
pub(crate) use domain::ItemKind;
