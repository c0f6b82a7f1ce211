//! Time tracking: logging time against tasks and reviewing it week by week.

mod create;
mod db;
pub(crate) mod domain;
mod edit;
mod form;
mod view;

pub use create::{create_time_entry_endpoint, get_new_time_entry_page};
pub use db::{
    create_time_entry, create_time_entry_table, delete_time_entry, get_time_entries_for_week,
    get_time_entry, total_minutes_for_user_in_range, total_minutes_for_week, update_time_entry,
};
pub use domain::{NewTimeEntry, TimeEntry, TimeEntryUpdate};
pub use edit::{
    delete_time_entry_endpoint, get_edit_time_entry_page, update_time_entry_endpoint,
};
pub use view::get_timesheet_page;
