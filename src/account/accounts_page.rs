//! Chart of accounts listing page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    account::{Account, get_accounts},
    auth::RequestContext,
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for the accounts listing page.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the chart of accounts for the active workspace.
pub async fn get_accounts_page(
    State(state): State<AccountsPageState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_accounts(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve accounts: {error}"))?;

    Ok(accounts_view(&accounts, &context).into_response())
}

fn accounts_view(accounts: &[Account], context: &RequestContext) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Chart of Accounts" }

                    @if context.role.can_manage() {
                        a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE)
                        {
                            "Create Account"
                        }
                    }
                }

                section class="dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Code" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (account_row(account, context))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts yet."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Chart of Accounts", &content)
}

fn account_row(account: &Account, context: &RequestContext) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_ACCOUNT, account.id);
    let confirm_message = format!(
        "Are you sure you want to delete account {} '{}'?",
        account.code, account.name
    );

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (account.code) }
            td class=(TABLE_CELL_STYLE) { (account.name) }
            td class=(TABLE_CELL_STYLE) { (account.kind.label()) }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    @if context.role.can_manage() {
                        a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                        button
                            hx-delete=(delete_url)
                            hx-confirm=(confirm_message)
                            hx-target="closest tr"
                            hx-swap="delete"
                            class=(BUTTON_DELETE_STYLE)
                        {
                            "Delete"
                        }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod accounts_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        account::{AccountKind, create_account},
        auth::{RequestContext, Role},
        test_utils::{assert_valid_html, parse_html_document},
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    use super::{AccountsPageState, get_accounts_page};

    #[tokio::test]
    async fn render_page_lists_accounts() {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            NewUser {
                email: "foo@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
            },
            &connection,
        )
        .expect("Could not create test user");
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");
        create_account(workspace.id, "1000", "Cash", AccountKind::Asset, &connection)
            .expect("Could not create account");
        let context = RequestContext {
            user_id: user.id,
            workspace_id: workspace.id,
            role: Role::Manager,
        };
        let state = AccountsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_accounts_page(State(state), Extension(context))
            .await
            .expect("Could not render accounts page");

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("1000"), "want account code in page");
        assert!(text.contains("Cash"), "want account name in page");
        assert!(text.contains("Asset"), "want account kind in page");
    }
}
