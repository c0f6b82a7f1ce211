//! The chart of accounts: the ledger accounts that journal entries post to.

mod accounts_page;
mod create;
mod db;
mod delete;
pub(crate) mod domain;
mod edit;

pub use accounts_page::get_accounts_page;
pub use create::{create_account_endpoint, get_new_account_page};
pub use db::{
    create_account, create_account_table, delete_account, get_account, get_accounts,
    update_account,
};
pub use delete::delete_account_endpoint;
pub use domain::{Account, AccountKind};
pub use edit::{get_edit_account_page, update_account_endpoint};
