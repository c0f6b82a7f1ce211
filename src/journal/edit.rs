//! Journal entry edit page, update endpoint and delete endpoint.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    account::{Account, get_accounts},
    auth::RequestContext,
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    journal::{
        create::entry_line_row_with_values,
        db::{delete_journal_entry, get_entry_lines, get_journal_entry, update_journal_entry},
        domain::{EntryFormData, EntryLineDetail, JournalEntry},
    },
    navigation::NavBar,
};

/// The state needed for the entry edit page.
#[derive(Debug, Clone)]
pub struct EditEntryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditEntryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating or deleting a journal entry.
#[derive(Debug, Clone)]
pub struct EditEntryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for EditEntryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Fetch an entry, hiding entries from other workspaces.
fn get_workspace_entry(
    entry_id: DatabaseId,
    context: &RequestContext,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    let entry = get_journal_entry(entry_id, connection)?;

    if entry.workspace_id != context.workspace_id {
        return Err(Error::NotFound);
    }

    Ok(entry)
}

/// Render the edit page for a journal entry.
pub async fn get_edit_entry_page(
    State(state): State<EditEntryPageState>,
    Extension(context): Extension<RequestContext>,
    Path(entry_id): Path<DatabaseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entry = get_workspace_entry(entry_id, &context, &connection)?;
    let lines = get_entry_lines(entry_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve entry lines: {error}"))?;
    let accounts = get_accounts(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve accounts: {error}"))?;

    Ok(edit_entry_view(&entry, &lines, &accounts).into_response())
}

/// Handle the entry edit form submission.
pub async fn update_entry_endpoint(
    State(state): State<EditEntryEndpointState>,
    Extension(context): Extension<RequestContext>,
    Path(entry_id): Path<DatabaseId>,
    Form(form_data): Form<EntryFormData>,
) -> Response {
    if !context.role.can_manage() {
        return Error::Forbidden.into_alert_response();
    }

    let lines = match form_data.parse_lines() {
        Ok(lines) => lines,
        Err(error) => return error.into_alert_response(),
    };

    let result = lock_connection(&state).and_then(|connection| {
        get_workspace_entry(entry_id, &context, &connection)?;

        update_journal_entry(entry_id, form_data.date, &form_data.memo, &lines, &connection)
    });

    match result {
        Ok(()) => {
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

/// Delete a journal entry and its lines.
pub async fn delete_entry_endpoint(
    State(state): State<EditEntryEndpointState>,
    Extension(context): Extension<RequestContext>,
    Path(entry_id): Path<DatabaseId>,
) -> Response {
    if !context.role.can_manage() {
        return Error::Forbidden.into_alert_response();
    }

    let result = lock_connection(&state).and_then(|connection| {
        get_workspace_entry(entry_id, &context, &connection)?;

        delete_journal_entry(entry_id, &connection)
    });

    match result {
        Ok(()) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Journal);

            StatusCode::OK.into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn lock_connection(
    state: &EditEntryEndpointState,
) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

fn edit_entry_view(
    entry: &JournalEntry,
    lines: &[EntryLineDetail],
    accounts: &[Account],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::JOURNAL_VIEW).into_html();
    let update_url = endpoints::format_endpoint(endpoints::PUT_ENTRY, entry.id);

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
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        id="date"
                        type="date"
                        name="date"
                        required
                        value=(entry.date)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="memo" class=(FORM_LABEL_STYLE) { "Memo" }

                    input
                        id="memo"
                        type="text"
                        name="memo"
                        value=(entry.memo)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                fieldset class="space-y-2"
                {
                    legend class=(FORM_LABEL_STYLE) { "Lines" }

                    @for line in lines {
                        (entry_line_row_with_values(
                            accounts,
                            Some(line.account_id),
                            Some(line.kind.as_str()),
                            Some(line.amount as f64 / 100.0),
                        ))
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Entry" }
            }
        }
    };

    base("Edit Journal Entry", &content)
}

#[cfg(test)]
mod edit_entry_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, AccountKind, create_account},
        auth::{RequestContext, Role},
        events::ChangeEvents,
        journal::{
            create_journal_entry, get_entry_lines, get_journal_entry,
            domain::{EntryFormData, LineKind, NewEntryLine},
        },
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    use super::{
        EditEntryEndpointState, EditEntryPageState, delete_entry_endpoint, get_edit_entry_page,
        update_entry_endpoint,
    };

    struct Fixture {
        connection: Arc<Mutex<Connection>>,
        context: RequestContext,
        entry_id: i64,
        cash: Account,
        sales: Account,
    }

    fn get_fixture() -> Fixture {
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
        let cash = create_account(workspace.id, "1000", "Cash", AccountKind::Asset, &connection)
            .expect("Could not create account");
        let sales = create_account(
            workspace.id,
            "4000",
            "Sales",
            AccountKind::Revenue,
            &connection,
        )
        .expect("Could not create account");
        let entry = create_journal_entry(
            workspace.id,
            date!(2026 - 08 - 20),
            "Cash sale",
            &[
                NewEntryLine {
                    account_id: cash.id,
                    kind: LineKind::Debit,
                    amount: 10_000,
                },
                NewEntryLine {
                    account_id: sales.id,
                    kind: LineKind::Credit,
                    amount: 10_000,
                },
            ],
            &connection,
        )
        .expect("Could not create journal entry");

        Fixture {
            connection: Arc::new(Mutex::new(connection)),
            context: RequestContext {
                user_id: user.id,
                workspace_id: workspace.id,
                role: Role::Manager,
            },
            entry_id: entry.id,
            cash,
            sales,
        }
    }

    #[tokio::test]
    async fn render_edit_page() {
        let fixture = get_fixture();
        let state = EditEntryPageState {
            db_connection: fixture.connection.clone(),
        };

        let response = get_edit_entry_page(
            State(state),
            Extension(fixture.context),
            Path(fixture.entry_id),
        )
        .await
        .expect("Could not render edit entry page");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn entry_in_other_workspace_is_hidden() {
        let fixture = get_fixture();
        let state = EditEntryPageState {
            db_connection: fixture.connection.clone(),
        };
        let other_context = RequestContext {
            workspace_id: fixture.context.workspace_id + 1,
            ..fixture.context
        };

        let result =
            get_edit_entry_page(State(state), Extension(other_context), Path(fixture.entry_id))
                .await;

        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn manager_can_update_entry() {
        let fixture = get_fixture();
        let state = EditEntryEndpointState {
            db_connection: fixture.connection.clone(),
            events: ChangeEvents::new(),
        };
        let form = EntryFormData {
            date: date!(2026 - 08 - 21),
            memo: "Corrected sale".to_owned(),
            account_id: vec![fixture.cash.id, fixture.sales.id],
            kind: vec!["debit".to_owned(), "credit".to_owned()],
            amount: vec![50.0, 50.0],
        };

        let response = update_entry_endpoint(
            State(state),
            Extension(fixture.context),
            Path(fixture.entry_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = fixture.connection.lock().unwrap();
        let updated = get_journal_entry(fixture.entry_id, &connection).unwrap();
        assert_eq!(updated.memo, "Corrected sale");
        assert_eq!(
            get_entry_lines(fixture.entry_id, &connection).unwrap()[0].amount,
            5_000
        );
    }

    #[tokio::test]
    async fn unbalanced_update_is_rejected() {
        let fixture = get_fixture();
        let state = EditEntryEndpointState {
            db_connection: fixture.connection.clone(),
            events: ChangeEvents::new(),
        };
        let form = EntryFormData {
            date: date!(2026 - 08 - 21),
            memo: "Broken".to_owned(),
            account_id: vec![fixture.cash.id, fixture.sales.id],
            kind: vec!["debit".to_owned(), "credit".to_owned()],
            amount: vec![50.0, 40.0],
        };

        let response = update_entry_endpoint(
            State(state),
            Extension(fixture.context),
            Path(fixture.entry_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = fixture.connection.lock().unwrap();
        assert_eq!(
            get_journal_entry(fixture.entry_id, &connection).unwrap().memo,
            "Cash sale"
        );
    }

    #[tokio::test]
    async fn manager_can_delete_entry() {
        let fixture = get_fixture();
        let state = EditEntryEndpointState {
            db_connection: fixture.connection.clone(),
            events: ChangeEvents::new(),
        };

        let response = delete_entry_endpoint(
            State(state),
            Extension(fixture.context),
            Path(fixture.entry_id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let connection = fixture.connection.lock().unwrap();
        assert_eq!(
            get_journal_entry(fixture.entry_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn member_cannot_delete_entry() {
        let fixture = get_fixture();
        let state = EditEntryEndpointState {
            db_connection: fixture.connection.clone(),
            events: ChangeEvents::new(),
        };
        let member_context = RequestContext {
            role: Role::Member,
            ..fixture.context
        };

        let response = delete_entry_endpoint(
            State(state),
            Extension(member_context),
            Path(fixture.entry_id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let connection = fixture.connection.lock().unwrap();
        assert!(get_journal_entry(fixture.entry_id, &connection).is_ok());
    }
}
