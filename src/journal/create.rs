//! Journal entry creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// axum_extra's Form collects repeated fields into a Vec, which axum::Form
// does not.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    account::{Account, get_accounts},
    auth::RequestContext,
    events::{ChangeEvents, ChangeTopic},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    journal::{db::create_journal_entry, domain::EntryFormData},
    navigation::NavBar,
};

/// How many blank line rows the entry form starts with.
const DEFAULT_LINE_ROWS: usize = 4;

/// The state needed for the new entry page.
#[derive(Debug, Clone)]
pub struct NewEntryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewEntryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for creating a journal entry.
#[derive(Debug, Clone)]
pub struct CreateEntryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for CreateEntryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Render the page for posting a journal entry.
pub async fn get_new_entry_page(
    State(state): State<NewEntryPageState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_accounts(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve accounts: {error}"))?;

    Ok(new_entry_view(&accounts).into_response())
}

/// Handle the journal entry form submission.
///
/// The entry is validated and written atomically: either the header and all
/// of its lines are stored, or nothing is.
pub async fn create_entry_endpoint(
    State(state): State<CreateEntryEndpointState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<EntryFormData>,
) -> Response {
    if !context.role.can_manage() {
        return Error::Forbidden.into_alert_response();
    }

    let lines = match form_data.parse_lines() {
        Ok(lines) => lines,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_journal_entry(
        context.workspace_id,
        form_data.date,
        &form_data.memo,
        &lines,
        &connection,
    ) {
        Ok(_) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Journal);

            (
                HxRedirect(endpoints::JOURNAL_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn new_entry_view(accounts: &[Account]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_ENTRY_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_ENTRY)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        id="date"
                        type="date"
                        name="date"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="memo" class=(FORM_LABEL_STYLE) { "Memo" }

                    input
                        id="memo"
                        type="text"
                        name="memo"
                        placeholder="What is this entry for?"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                fieldset class="space-y-2"
                {
                    legend class=(FORM_LABEL_STYLE) { "Lines" }

                    @for _ in 0..DEFAULT_LINE_ROWS {
                        (entry_line_row(accounts))
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Post Entry" }
            }
        }
    };

    base("New Journal Entry", &content)
}

/// One line row of the entry form: account, side and amount.
pub(super) fn entry_line_row(accounts: &[Account]) -> Markup {
    entry_line_row_with_values(accounts, None, None, None)
}

/// A prefilled line row for the edit form.
pub(super) fn entry_line_row_with_values(
    accounts: &[Account],
    account_id: Option<i64>,
    kind: Option<&str>,
    amount: Option<f64>,
) -> Markup {
    html! {
        div class="flex gap-2"
        {
            select name="account_id" class=(FORM_SELECT_STYLE)
            {
                @for account in accounts {
                    option
                        value=(account.id)
                        selected[account_id == Some(account.id)]
                    {
                        (account.code) " " (account.name)
                    }
                }
            }

            select name="kind" class=(FORM_SELECT_STYLE)
            {
                option value="debit" selected[kind == Some("debit")] { "Debit" }
                option value="credit" selected[kind == Some("credit")] { "Credit" }
            }

            input
                type="number"
                name="amount"
                step="0.01"
                min="0"
                placeholder="0.00"
                value=[amount]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

#[cfg(test)]
mod new_entry_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        account::{AccountKind, create_account},
        auth::{RequestContext, Role},
        endpoints,
        test_utils::{assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document},
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    use super::{NewEntryPageState, get_new_entry_page};

    #[tokio::test]
    async fn render_page_lists_accounts_in_selects() {
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
        let state = NewEntryPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_new_entry_page(State(state), Extension(context))
            .await
            .expect("Could not render new entry page");

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_ENTRY, "hx-post");

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Cash"), "want account in line selects");
    }
}
