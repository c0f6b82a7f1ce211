//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, get_accounts_page,
        get_edit_account_page, get_new_account_page, update_account_endpoint,
    },
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    board::{
        archive_board_endpoint, create_board_endpoint, create_task_endpoint,
        delete_board_endpoint, delete_task_endpoint, get_board_page, get_boards_page,
        get_new_board_page, restore_board_endpoint, update_task_endpoint,
    },
    dashboard::get_dashboard_page,
    endpoints,
    events::get_event_stream,
    internal_server_error::get_internal_server_error_page,
    journal::{
        create_entry_endpoint, delete_entry_endpoint, export_journal_endpoint,
        get_edit_entry_page, get_journal_page, get_new_entry_page, update_entry_endpoint,
    },
    not_found::get_404_not_found,
    payroll::{
        create_item_endpoint, create_payroll_endpoint, delete_item_endpoint,
        get_new_payroll_page, get_payroll_transaction_page, get_payrolls_page,
        lock_transaction_endpoint, update_item_endpoint,
    },
    register::{get_register_page, register_user},
    timesheet::{
        create_time_entry_endpoint, delete_time_entry_endpoint, get_edit_time_entry_page,
        get_new_time_entry_page, get_timesheet_page, update_time_entry_endpoint,
    },
    workspace::{
        add_member_endpoint, archive_workspace_endpoint, create_workspace_endpoint,
        delete_workspace_endpoint, get_new_workspace_page, get_workspace_members_page,
        get_workspaces_page, restore_workspace_endpoint, select_workspace_endpoint,
        update_workspace_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TIMESHEET_VIEW, get(get_timesheet_page))
        .route(endpoints::NEW_TIME_ENTRY_VIEW, get(get_new_time_entry_page))
        .route(
            endpoints::EDIT_TIME_ENTRY_VIEW,
            get(get_edit_time_entry_page),
        )
        .route(endpoints::BOARDS_VIEW, get(get_boards_page))
        .route(endpoints::NEW_BOARD_VIEW, get(get_new_board_page))
        .route(endpoints::BOARD_VIEW, get(get_board_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_new_account_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .route(endpoints::JOURNAL_VIEW, get(get_journal_page))
        .route(endpoints::NEW_ENTRY_VIEW, get(get_new_entry_page))
        .route(endpoints::EDIT_ENTRY_VIEW, get(get_edit_entry_page))
        .route(endpoints::PAYROLLS_VIEW, get(get_payrolls_page))
        .route(endpoints::NEW_PAYROLL_VIEW, get(get_new_payroll_page))
        .route(
            endpoints::PAYROLL_TRANSACTION_VIEW,
            get(get_payroll_transaction_page),
        )
        .route(endpoints::WORKSPACES_VIEW, get(get_workspaces_page))
        .route(endpoints::NEW_WORKSPACE_VIEW, get(get_new_workspace_page))
        .route(
            endpoints::WORKSPACE_MEMBERS_VIEW,
            get(get_workspace_members_page),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::EVENTS, get(get_event_stream))
            .route(endpoints::POST_TIME_ENTRY, post(create_time_entry_endpoint))
            .route(endpoints::PUT_TIME_ENTRY, put(update_time_entry_endpoint))
            .route(
                endpoints::DELETE_TIME_ENTRY,
                delete(delete_time_entry_endpoint),
            )
            .route(endpoints::POST_BOARD, post(create_board_endpoint))
            .route(endpoints::ARCHIVE_BOARD, post(archive_board_endpoint))
            .route(endpoints::RESTORE_BOARD, post(restore_board_endpoint))
            .route(endpoints::DELETE_BOARD, delete(delete_board_endpoint))
            .route(endpoints::POST_TASK, post(create_task_endpoint))
            .route(endpoints::PUT_TASK, put(update_task_endpoint))
            .route(endpoints::DELETE_TASK, delete(delete_task_endpoint))
            .route(endpoints::POST_ACCOUNT, post(create_account_endpoint))
            .route(endpoints::PUT_ACCOUNT, put(update_account_endpoint))
            .route(endpoints::DELETE_ACCOUNT, delete(delete_account_endpoint))
            .route(endpoints::POST_ENTRY, post(create_entry_endpoint))
            .route(endpoints::PUT_ENTRY, put(update_entry_endpoint))
            .route(endpoints::DELETE_ENTRY, delete(delete_entry_endpoint))
            .route(endpoints::EXPORT_JOURNAL, get(export_journal_endpoint))
            .route(endpoints::POST_PAYROLL, post(create_payroll_endpoint))
            .route(endpoints::POST_PAYROLL_ITEM, post(create_item_endpoint))
            .route(endpoints::PUT_PAYROLL_ITEM, put(update_item_endpoint))
            .route(endpoints::DELETE_PAYROLL_ITEM, delete(delete_item_endpoint))
            .route(
                endpoints::LOCK_PAYROLL_TRANSACTION,
                post(lock_transaction_endpoint),
            )
            .route(endpoints::POST_WORKSPACE, post(create_workspace_endpoint))
            .route(endpoints::PUT_WORKSPACE, put(update_workspace_endpoint))
            .route(
                endpoints::ARCHIVE_WORKSPACE,
                post(archive_workspace_endpoint),
            )
            .route(
                endpoints::RESTORE_WORKSPACE,
                post(restore_workspace_endpoint),
            )
            .route(endpoints::DELETE_WORKSPACE, delete(delete_workspace_endpoint))
            .route(endpoints::SELECT_WORKSPACE, post(select_workspace_endpoint))
            .route(endpoints::POST_MEMBER, post(add_member_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}


#[cfg(test)]
mod locked_payroll_route_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        AppState,
        auth::COOKIE_TOKEN,
        endpoints,
        pagination::PaginationConfig,
        payroll::{
            ItemKind, create_item, create_payroll_run, get_item, get_transactions_for_payroll,
            lock_transaction,
        },
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    const TEST_EMAIL: &str = "admin@acme.test";
    const TEST_PASSWORD: &str = "averysafeandsecurepassword";

    /// A logged-in server over a workspace with one locked payroll
    /// transaction, plus the id of an item on that transaction.
    async fn get_locked_transaction_server() -> (TestServer, AppState, i64) {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "nafstenoas",
            "Etc/UTC",
            PaginationConfig::default(),
        )
        .expect("Could not create app state");

        let item_id = {
            let connection = state.db_connection.lock().unwrap();

            let password_hash = PasswordHash::from_raw_password(TEST_PASSWORD, 4)
                .expect("Could not hash test password");
            let user = create_user(
                NewUser {
                    email: TEST_EMAIL.to_owned(),
                    password_hash,
                },
                &connection,
            )
            .expect("Could not create test user");

            let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
                .expect("Could not create test workspace");

            let payroll = create_payroll_run(
                workspace.id,
                date!(2025 - 07 - 01),
                date!(2025 - 07 - 31),
                &connection,
            )
            .expect("Could not create payroll run");

            let transactions = get_transactions_for_payroll(payroll.id, &connection).unwrap();
            let transaction_id = transactions[0].transaction.id;
            let item = create_item(transaction_id, ItemKind::Wage, "Salary", 100_000, &connection)
                .unwrap();
            lock_transaction(transaction_id, &connection).expect("Could not lock transaction");

            item.id
        };

        let mut server = TestServer::new(crate::routing::build_router(state.clone()));

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("email", TEST_EMAIL), ("password", TEST_PASSWORD)])
            .await;
        response.assert_status_see_other();
        server.add_cookie(response.cookie(COOKIE_TOKEN));

        (server, state, item_id)
    }

    #[tokio::test]
    async fn locked_transaction_item_cannot_be_deleted_through_router() {
        let (server, state, item_id) = get_locked_transaction_server().await;

        let response = server
            .delete(&endpoints::format_endpoint(
                endpoints::DELETE_PAYROLL_ITEM,
                item_id,
            ))
            .await;

        response.assert_status(StatusCode::CONFLICT);

        let connection = state.db_connection.lock().unwrap();
        let item = get_item(item_id, &connection).expect("Expected the item to survive");
        assert_eq!(item.amount, 100_000);
    }

    #[tokio::test]
    async fn locked_transaction_refuses_new_items_through_router() {
        let (server, state, item_id) = get_locked_transaction_server().await;

        let transaction_id = {
            let connection = state.db_connection.lock().unwrap();
            get_item(item_id, &connection).unwrap().transaction_id
        };

        let response = server
            .post(&endpoints::format_endpoint(
                endpoints::POST_PAYROLL_ITEM,
                transaction_id,
            ))
            .form(&[
                ("kind", "wage"),
                ("description", "Bonus"),
                ("amount", "100.0"),
            ])
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }
}
