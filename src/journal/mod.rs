//! The double-entry journal: balanced entries posted against the chart of
//! accounts.

mod create;
mod db;
pub(crate) mod domain;
mod edit;
mod export;
mod list;

pub use create::{create_entry_endpoint, get_new_entry_page};
pub use db::{create_entry_line_table, create_journal_entry_table, get_trial_balance};
pub use domain::TrialBalance;
pub(crate) use domain::dollars_to_cents;
pub use edit::{delete_entry_endpoint, get_edit_entry_page, update_entry_endpoint};
pub use export::export_journal_endpoint;
pub use list::get_journal_page;

#[cfg(test)]
pub(crate) use db::{count_journal_entries, create_journal_entry, get_entry_lines, get_journal_entry};
#[cfg(test)]
pub(crate) use domain::{LineKind, NewEntryLine};
