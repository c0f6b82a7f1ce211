//! Account edit page and update endpoint.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    account::{Account, AccountKind, domain::AccountFormData, get_account, update_account},
    auth::RequestContext,
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for the account edit page.
#[derive(Debug, Clone)]
pub struct EditAccountPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating an account.
#[derive(Debug, Clone)]
pub struct EditAccountEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for EditAccountEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Fetch an account, hiding accounts from other workspaces.
fn get_workspace_account(
    account_id: DatabaseId,
    context: &RequestContext,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = get_account(account_id, connection)?;

    if account.workspace_id != context.workspace_id {
        return Err(Error::NotFound);
    }

    Ok(account)
}

/// Render the edit page for an account.
pub async fn get_edit_account_page(
    State(state): State<EditAccountPageState>,
    Extension(context): Extension<RequestContext>,
    Path(account_id): Path<DatabaseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_workspace_account(account_id, &context, &connection)?;

    Ok(edit_account_view(&account).into_response())
}

/// Handle the account edit form submission.
///
/// Only managers and admins may change the chart of accounts.
pub async fn update_account_endpoint(
    State(state): State<EditAccountEndpointState>,
    Extension(context): Extension<RequestContext>,
    Path(account_id): Path<DatabaseId>,
    Form(form_data): Form<AccountFormData>,
) -> Response {
    if !context.role.can_manage() {
        return Error::Forbidden.into_alert_response();
    }

    let Some(kind) = AccountKind::parse(&form_data.kind) else {
        return (
            StatusCode::BAD_REQUEST,
            crate::alert::Alert::error(
                "Invalid account kind",
                "Choose one of asset, liability, equity, revenue or expense.",
            ),
        )
            .into_response();
    };

    let result = lock_connection(&state).and_then(|connection| {
        get_workspace_account(account_id, &context, &connection)?;

        update_account(account_id, &form_data.code, &form_data.name, kind, &connection)
    });

    match result {
        Ok(()) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Journal);

            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn lock_connection(
    state: &EditAccountEndpointState,
) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

fn edit_account_view(account: &Account) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();
    let update_url = endpoints::format_endpoint(endpoints::PUT_ACCOUNT, account.id);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="code" class=(FORM_LABEL_STYLE) { "Code" }

                    input
                        id="code"
                        type="text"
                        name="code"
                        required
                        autofocus
                        value=(account.code)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        id="name"
                        type="text"
                        name="name"
                        required
                        value=(account.name)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="kind" class=(FORM_LABEL_STYLE) { "Kind" }

                    select id="kind" name="kind" class=(FORM_SELECT_STYLE)
                    {
                        @for kind in AccountKind::ALL {
                            option value=(kind.as_str()) selected[kind == account.kind]
                            {
                                (kind.label())
                            }
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Account" }
            }
        }
    };

    base("Edit Account", &content)
}

#[cfg(test)]
mod edit_account_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{AccountKind, create_account},
        auth::{RequestContext, Role},
        endpoints,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_valid_html, must_get_form,
            parse_html_document,
        },
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    use super::{EditAccountPageState, get_edit_account_page};

    fn get_test_state() -> (EditAccountPageState, RequestContext, crate::account::Account) {
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
        let account = create_account(workspace.id, "1000", "Cash", AccountKind::Asset, &connection)
            .expect("Could not create account");
        let context = RequestContext {
            user_id: user.id,
            workspace_id: workspace.id,
            role: Role::Manager,
        };

        (
            EditAccountPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            context,
            account,
        )
    }

    #[tokio::test]
    async fn render_page_prefills_account() {
        let (state, context, account) = get_test_state();

        let response = get_edit_account_page(State(state), Extension(context), Path(account.id))
            .await
            .expect("Could not render edit account page");

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        let update_url = endpoints::format_endpoint(endpoints::PUT_ACCOUNT, account.id);
        assert_hx_endpoint(&form, &update_url, "hx-put");
        assert_form_input_with_value(&form, "code", "text", "1000");
        assert_form_input_with_value(&form, "name", "text", "Cash");
    }

    #[tokio::test]
    async fn account_in_other_workspace_is_hidden() {
        let (state, context, account) = get_test_state();
        let other_context = RequestContext {
            workspace_id: context.workspace_id + 1,
            ..context
        };

        let result =
            get_edit_account_page(State(state), Extension(other_context), Path(account.id)).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
