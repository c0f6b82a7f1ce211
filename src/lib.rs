//! Opsdesk is a multi-tenant web app for running a small business: time
//! tracking, task boards, payroll, and a double-entry journal, organised into
//! workspaces with member roles.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod board;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod events;
mod html;
mod internal_server_error;
mod journal;
mod logging;
mod navigation;
mod not_found;
mod pagination;
mod payroll;
mod register;
mod routing;
mod timesheet;
mod timezone;
mod user;
mod workspace;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{RequestContext, Role};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use user::{NewUser, PasswordHash, User, UserId, ValidatedPassword, create_user, get_user_by_email};

use crate::{
    alert::Alert, internal_server_error::render_internal_server_error,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid email and password combination.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing or formatting a date in the auth token.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format token date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty string was submitted for a required name field.
    #[error("{0} cannot be empty")]
    EmptyName(&'static str),

    /// The email address already belongs to another user.
    #[error("a user with that email already exists")]
    DuplicateEmail,

    /// The account code already exists within the workspace.
    #[error("the account code \"{0}\" already exists in this workspace")]
    DuplicateAccountCode(String),

    /// The user is already a member of the workspace.
    #[error("that user is already a member of this workspace")]
    DuplicateMember,

    /// An entry line referenced an account that does not exist in the
    /// workspace's chart of accounts.
    #[error("the account ID does not refer to a valid account")]
    InvalidAccount(Option<i64>),

    /// A journal entry was submitted with fewer than two lines.
    #[error("A journal entry needs at least two lines")]
    TooFewEntryLines,

    /// The debit and credit lines of a journal entry do not sum to the same
    /// amount.
    #[error("Total credits and debits must balance!")]
    UnbalancedEntry,

    /// A zero or negative amount was submitted where a positive amount is
    /// required.
    #[error("Amounts must be greater than zero")]
    NonPositiveAmount,

    /// The parallel arrays of the journal entry form differ in length.
    #[error("Each entry line needs an account, a side, and an amount")]
    MismatchedEntryLines,

    /// A pay period was submitted whose end date is before its start date.
    #[error("the pay period end must not be before its start")]
    InvalidPeriod,

    /// Tried to mutate an item of a locked payroll transaction.
    #[error("this payroll transaction is locked")]
    LockedPayrollTransaction,

    /// Tried to edit or delete a generated payroll item that is not editable.
    #[error("this payroll item cannot be edited")]
    ItemNotEditable,

    /// Tried to write to a workspace or board that is archived or deleted.
    #[error("this workspace is not active")]
    WorkspaceNotActive,

    /// The current user's role does not allow the operation.
    #[error("you do not have permission to do that")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Tried to update a workspace that does not exist
    #[error("tried to update a workspace that is not in the database")]
    UpdateMissingWorkspace,

    /// Tried to update a board that does not exist
    #[error("tried to update a board that is not in the database")]
    UpdateMissingBoard,

    /// Tried to update a task that does not exist
    #[error("tried to update a task that is not in the database")]
    UpdateMissingTask,

    /// Tried to delete a task that does not exist
    #[error("tried to delete a task that is not in the database")]
    DeleteMissingTask,

    /// Tried to update a time entry that does not exist
    #[error("tried to update a time entry that is not in the database")]
    UpdateMissingTimeEntry,

    /// Tried to delete a time entry that does not exist
    #[error("tried to delete a time entry that is not in the database")]
    DeleteMissingTimeEntry,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update a journal entry that does not exist
    #[error("tried to update a journal entry that is not in the database")]
    UpdateMissingEntry,

    /// Tried to delete a journal entry that does not exist
    #[error("tried to delete a journal entry that is not in the database")]
    DeleteMissingEntry,

    /// Tried to update a payroll item that does not exist
    #[error("tried to update a payroll item that is not in the database")]
    UpdateMissingItem,

    /// Tried to delete a payroll item that does not exist
    #[error("tried to delete a payroll item that is not in the database")]
    DeleteMissingItem,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("membership") =>
            {
                Error::DuplicateMember
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => render_internal_server_error(
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                ),
            ),
            Error::DatabaseLockError => render_internal_server_error(
                "Sorry, something went wrong.",
                "Try again later or check the server logs",
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(
                    "Sorry, something went wrong.",
                    "Try again later or check the server logs",
                )
            }
        }
    }
}

impl Error {
    pub(crate) fn into_alert_response(self) -> Response {
        let (status, alert) = match self {
            Error::UnbalancedEntry => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Entry does not balance",
                    "Total credits and debits must balance!",
                ),
            ),
            Error::TooFewEntryLines => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Not enough entry lines",
                    "A journal entry needs at least two lines.",
                ),
            ),
            Error::NonPositiveAmount => (
                StatusCode::BAD_REQUEST,
                Alert::error("Invalid amount", "Amounts must be greater than zero."),
            ),
            Error::InvalidAccount(account_id) => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid account",
                    &format!("Could not find an account with the ID {account_id:?}"),
                ),
            ),
            Error::InvalidPeriod => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid pay period",
                    "The pay period end must not be before its start.",
                ),
            ),
            Error::LockedPayrollTransaction => (
                StatusCode::CONFLICT,
                Alert::error(
                    "Payroll transaction locked",
                    "This payroll transaction has been locked and its items can \
                    no longer be changed.",
                ),
            ),
            Error::ItemNotEditable => (
                StatusCode::CONFLICT,
                Alert::error(
                    "Item not editable",
                    "This payroll item was generated automatically and cannot be \
                    edited or deleted.",
                ),
            ),
            Error::WorkspaceNotActive => (
                StatusCode::CONFLICT,
                Alert::error(
                    "Workspace not active",
                    "Archived or deleted workspaces cannot be changed. Restore \
                    the workspace first.",
                ),
            ),
            Error::Forbidden => (
                StatusCode::FORBIDDEN,
                Alert::error(
                    "Permission denied",
                    "You need the admin role in this workspace to do that.",
                ),
            ),
            Error::DuplicateAccountCode(code) => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Duplicate account code",
                    &format!(
                        "The account code {code} already exists in this workspace. \
                        Choose a different code, or edit or delete the existing account.",
                    ),
                ),
            ),
            Error::DuplicateMember => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Already a member",
                    "That user is already a member of this workspace.",
                ),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::error("Not found", "The requested item could not be found."),
            ),
            Error::UpdateMissingEntry => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not update journal entry",
                    "The journal entry could not be found.",
                ),
            ),
            Error::DeleteMissingEntry => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not delete journal entry",
                    "The journal entry could not be found. Try refreshing the \
                    page to see if the entry has already been deleted.",
                ),
            ),
            Error::UpdateMissingAccount => (
                StatusCode::NOT_FOUND,
                Alert::error("Could not update account", "The account could not be found."),
            ),
            Error::DeleteMissingAccount => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not delete account",
                    "The account could not be found. Try refreshing the page to \
                    see if the account has already been deleted.",
                ),
            ),
            Error::UpdateMissingTask => (
                StatusCode::NOT_FOUND,
                Alert::error("Could not update task", "The task could not be found."),
            ),
            Error::DeleteMissingTask => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not delete task",
                    "The task could not be found. Try refreshing the page to see \
                    if the task has already been deleted.",
                ),
            ),
            Error::UpdateMissingTimeEntry => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not update time entry",
                    "The time entry could not be found.",
                ),
            ),
            Error::DeleteMissingTimeEntry => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not delete time entry",
                    "The time entry could not be found. Try refreshing the page \
                    to see if the entry has already been deleted.",
                ),
            ),
            Error::UpdateMissingItem => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not update payroll item",
                    "The payroll item could not be found.",
                ),
            ),
            Error::DeleteMissingItem => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not delete payroll item",
                    "The payroll item could not be found. Try refreshing the \
                    page to see if the item has already been deleted.",
                ),
            ),
            Error::UpdateMissingWorkspace => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not update workspace",
                    "The workspace could not be found.",
                ),
            ),
            Error::UpdateMissingBoard => (
                StatusCode::NOT_FOUND,
                Alert::error("Could not update board", "The board could not be found."),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::error(
                        "Something went wrong",
                        "An unexpected error occurred, check the server logs for more details.",
                    ),
                )
            }
        };

        (status, alert).into_response()
    }
}
