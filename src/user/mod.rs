//! User accounts and password handling.

mod db;
mod domain;

pub use db::{create_user, create_user_table, get_user_by_email, set_active_workspace};
pub(crate) use db::get_active_workspace_id;
pub use domain::{NewUser, PasswordHash, User, UserId, ValidatedPassword};
