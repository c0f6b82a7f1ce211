//! Account creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    account::{AccountKind, create_account, domain::AccountFormData},
    auth::RequestContext,
    events::{ChangeEvents, ChangeTopic},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for CreateAccountEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Render the account creation page.
pub async fn get_new_account_page() -> Response {
    new_account_view().into_response()
}

/// Handle account creation form submission.
///
/// Only managers and admins may change the chart of accounts.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountEndpointState>,
    Extension(context): Extension<RequestContext>,
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

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(
        context.workspace_id,
        &form_data.code,
        &form_data.name,
        kind,
        &connection,
    ) {
        Ok(_) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Journal);

            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::EmptyName(field)) => {
            new_account_form_view(&format!("Error: {} cannot be empty", capitalize(field)))
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn new_account_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html();
    let form = new_account_form_view("");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Account", &content)
}

fn new_account_form_view(error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_ACCOUNT)
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
                    placeholder="1000"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Cash at bank"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Kind" }

                select id="kind" name="kind" class=(FORM_SELECT_STYLE)
                {
                    @for kind in AccountKind::ALL {
                        option value=(kind.as_str()) { (kind.label()) }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE)
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Account" }
        }
    }
}
