//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/boards/{board_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing the current user's time entries.
pub const TIMESHEET_VIEW: &str = "/timesheet";
/// The page for logging a new time entry.
pub const NEW_TIME_ENTRY_VIEW: &str = "/timesheet/new";
/// The page for editing a time entry.
pub const EDIT_TIME_ENTRY_VIEW: &str = "/timesheet/{entry_id}/edit";
/// The page listing the workspace's task boards.
pub const BOARDS_VIEW: &str = "/boards";
/// The page for creating a new board.
pub const NEW_BOARD_VIEW: &str = "/boards/new";
/// The page showing one board's tasks by status column.
pub const BOARD_VIEW: &str = "/boards/{board_id}";
/// The page listing the workspace's chart of accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for creating a new ledger account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page for editing a ledger account.
pub const EDIT_ACCOUNT_VIEW: &str = "/accounts/{account_id}/edit";
/// The page listing journal entries.
pub const JOURNAL_VIEW: &str = "/journal";
/// The page for recording a new journal entry.
pub const NEW_ENTRY_VIEW: &str = "/journal/new";
/// The page for editing a journal entry.
pub const EDIT_ENTRY_VIEW: &str = "/journal/{entry_id}/edit";
/// The page listing payroll runs.
pub const PAYROLLS_VIEW: &str = "/payroll";
/// The page for creating a new payroll run.
pub const NEW_PAYROLL_VIEW: &str = "/payroll/new";
/// The page showing one payroll transaction and its items.
pub const PAYROLL_TRANSACTION_VIEW: &str = "/payroll/transactions/{transaction_id}";
/// The workspace administration page.
pub const WORKSPACES_VIEW: &str = "/workspaces";
/// The page for creating a new workspace.
pub const NEW_WORKSPACE_VIEW: &str = "/workspaces/new";
/// The page listing a workspace's members and their roles.
pub const WORKSPACE_MEMBERS_VIEW: &str = "/workspaces/{workspace_id}/members";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page for creating a user account.
pub const REGISTER_VIEW: &str = "/register";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The server-sent-event stream notifying clients that data changed.
pub const EVENTS: &str = "/api/events";
/// The route to create a time entry.
pub const POST_TIME_ENTRY: &str = "/api/timesheet";
/// The route to update a time entry.
pub const PUT_TIME_ENTRY: &str = "/api/timesheet/{entry_id}";
/// The route to delete a time entry.
pub const DELETE_TIME_ENTRY: &str = "/api/timesheet/{entry_id}";
/// The route to create a board.
pub const POST_BOARD: &str = "/api/boards";
/// The route to archive a board.
pub const ARCHIVE_BOARD: &str = "/api/boards/{board_id}/archive";
/// The route to restore an archived board.
pub const RESTORE_BOARD: &str = "/api/boards/{board_id}/restore";
/// The route to soft-delete an archived board.
pub const DELETE_BOARD: &str = "/api/boards/{board_id}";
/// The route to create a task.
pub const POST_TASK: &str = "/api/tasks";
/// The route to update a task.
pub const PUT_TASK: &str = "/api/tasks/{task_id}";
/// The route to delete a task.
pub const DELETE_TASK: &str = "/api/tasks/{task_id}";
/// The route to create a ledger account.
pub const POST_ACCOUNT: &str = "/api/accounts";
/// The route to update a ledger account.
pub const PUT_ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to delete a ledger account.
pub const DELETE_ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to record a journal entry.
pub const POST_ENTRY: &str = "/api/journal";
/// The route to update a journal entry.
pub const PUT_ENTRY: &str = "/api/journal/{entry_id}";
/// The route to delete a journal entry.
pub const DELETE_ENTRY: &str = "/api/journal/{entry_id}";
/// The route to download journal entries as CSV.
pub const EXPORT_JOURNAL: &str = "/api/journal/export";
/// The route to create a payroll run.
pub const POST_PAYROLL: &str = "/api/payroll";
/// The route to add an item to a payroll transaction.
pub const POST_PAYROLL_ITEM: &str = "/api/payroll/transactions/{transaction_id}/items";
/// The route to update a payroll item.
pub const PUT_PAYROLL_ITEM: &str = "/api/payroll/items/{item_id}";
/// The route to delete a payroll item.
pub const DELETE_PAYROLL_ITEM: &str = "/api/payroll/items/{item_id}";
/// The route to lock a payroll transaction, freezing its items.
pub const LOCK_PAYROLL_TRANSACTION: &str = "/api/payroll/transactions/{transaction_id}/lock";
/// The route to create a workspace.
pub const POST_WORKSPACE: &str = "/api/workspaces";
/// The route to rename a workspace.
pub const PUT_WORKSPACE: &str = "/api/workspaces/{workspace_id}";
/// The route to archive a workspace.
pub const ARCHIVE_WORKSPACE: &str = "/api/workspaces/{workspace_id}/archive";
/// The route to restore an archived workspace.
pub const RESTORE_WORKSPACE: &str = "/api/workspaces/{workspace_id}/restore";
/// The route to soft-delete an archived workspace.
pub const DELETE_WORKSPACE: &str = "/api/workspaces/{workspace_id}";
/// The route to switch the current user's active workspace.
pub const SELECT_WORKSPACE: &str = "/api/workspaces/{workspace_id}/select";
/// The route to add a member to a workspace.
pub const POST_MEMBER: &str = "/api/workspaces/{workspace_id}/members";
/// The route to create a user.
pub const USERS: &str = "/api/users";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/boards/{board_id}', '{board_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::TIMESHEET_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_TIME_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_TIME_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::BOARDS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_BOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::BOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::ACCOUNTS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_ACCOUNT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_ACCOUNT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::JOURNAL_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::PAYROLLS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_PAYROLL_VIEW);
        assert_endpoint_is_valid_uri(endpoints::PAYROLL_TRANSACTION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::WORKSPACES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_WORKSPACE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::WORKSPACE_MEMBERS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN_VIEW);
        assert_endpoint_is_valid_uri(endpoints::REGISTER_VIEW);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);

        assert_endpoint_is_valid_uri(endpoints::COFFEE);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN_API);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::EVENTS);
        assert_endpoint_is_valid_uri(endpoints::POST_TIME_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::PUT_TIME_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::DELETE_TIME_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::POST_BOARD);
        assert_endpoint_is_valid_uri(endpoints::ARCHIVE_BOARD);
        assert_endpoint_is_valid_uri(endpoints::RESTORE_BOARD);
        assert_endpoint_is_valid_uri(endpoints::DELETE_BOARD);
        assert_endpoint_is_valid_uri(endpoints::POST_TASK);
        assert_endpoint_is_valid_uri(endpoints::PUT_TASK);
        assert_endpoint_is_valid_uri(endpoints::DELETE_TASK);
        assert_endpoint_is_valid_uri(endpoints::POST_ACCOUNT);
        assert_endpoint_is_valid_uri(endpoints::PUT_ACCOUNT);
        assert_endpoint_is_valid_uri(endpoints::DELETE_ACCOUNT);
        assert_endpoint_is_valid_uri(endpoints::POST_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::PUT_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::DELETE_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::EXPORT_JOURNAL);
        assert_endpoint_is_valid_uri(endpoints::POST_PAYROLL);
        assert_endpoint_is_valid_uri(endpoints::POST_PAYROLL_ITEM);
        assert_endpoint_is_valid_uri(endpoints::PUT_PAYROLL_ITEM);
        assert_endpoint_is_valid_uri(endpoints::DELETE_PAYROLL_ITEM);
        assert_endpoint_is_valid_uri(endpoints::LOCK_PAYROLL_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::POST_WORKSPACE);
        assert_endpoint_is_valid_uri(endpoints::PUT_WORKSPACE);
        assert_endpoint_is_valid_uri(endpoints::ARCHIVE_WORKSPACE);
        assert_endpoint_is_valid_uri(endpoints::RESTORE_WORKSPACE);
        assert_endpoint_is_valid_uri(endpoints::DELETE_WORKSPACE);
        assert_endpoint_is_valid_uri(endpoints::SELECT_WORKSPACE);
        assert_endpoint_is_valid_uri(endpoints::POST_MEMBER);
        assert_endpoint_is_valid_uri(endpoints::USERS);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
