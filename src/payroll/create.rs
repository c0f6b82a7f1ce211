//! Payroll run creation page and endpoint.

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
    auth::RequestContext,
    events::{ChangeEvents, ChangeTopic},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    payroll::{db::create_payroll_run, domain::PayrollFormData},
};

/// The state needed for creating a payroll run.
#[derive(Debug, Clone)]
pub struct CreatePayrollEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for CreatePayrollEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Render the payroll run creation page.
pub async fn get_new_payroll_page() -> Response {
    new_payroll_view().into_response()
}

/// Handle the payroll run form submission.
///
/// Only admins may run payroll. A transaction is created for every current
/// member, with a read-only wage item for any time they logged in the period.
pub async fn create_payroll_endpoint(
    State(state): State<CreatePayrollEndpointState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<PayrollFormData>,
) -> Response {
    if !context.role.is_admin() {
        return Error::Forbidden.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_payroll_run(
        context.workspace_id,
        form_data.period_start,
        form_data.period_end,
        &connection,
    ) {
        Ok(_) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Payroll);

            (
                HxRedirect(endpoints::PAYROLLS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn new_payroll_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_PAYROLL_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_PAYROLL)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="period_start" class=(FORM_LABEL_STYLE) { "Period Start" }

                    input
                        id="period_start"
                        type="date"
                        name="period_start"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="period_end" class=(FORM_LABEL_STYLE) { "Period End" }

                    input
                        id="period_end"
                        type="date"
                        name="period_end"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Payroll Run" }
            }
        }
    };

    base("New Payroll Run", &content)
}

#[cfg(test)]
mod new_payroll_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::get_new_payroll_page;

    #[tokio::test]
    async fn render_page() {
        let response = get_new_payroll_page().await;

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_PAYROLL, "hx-post");
        assert_form_input(&form, "period_start", "date");
        assert_form_input(&form, "period_end", "date");
        assert_form_submit_button(&form);
    }
}

#[cfg(test)]
mod create_payroll_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        auth::{RequestContext, Role},
        events::ChangeEvents,
        payroll::{domain::PayrollFormData, get_payrolls},
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    use super::{CreatePayrollEndpointState, create_payroll_endpoint};

    fn get_test_state() -> (CreatePayrollEndpointState, RequestContext) {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            NewUser {
                email: "admin@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
            },
            &connection,
        )
        .expect("Could not create test user");
        let workspace = create_workspace_with_admin("Acme Corp", user.id, &connection)
            .expect("Could not create workspace");

        (
            CreatePayrollEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
                events: ChangeEvents::new(),
            },
            RequestContext {
                user_id: user.id,
                workspace_id: workspace.id,
                role: Role::Admin,
            },
        )
    }

    #[tokio::test]
    async fn admin_can_create_payroll_run() {
        let (state, context) = get_test_state();
        let form = PayrollFormData {
            period_start: date!(2026 - 08 - 01),
            period_end: date!(2026 - 08 - 15),
        };

        let response = create_payroll_endpoint(State(state.clone()), Extension(context), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let payrolls =
            get_payrolls(context.workspace_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(payrolls.len(), 1);
    }

    #[tokio::test]
    async fn manager_cannot_create_payroll_run() {
        let (state, context) = get_test_state();
        let manager_context = RequestContext {
            role: Role::Manager,
            ..context
        };
        let form = PayrollFormData {
            period_start: date!(2026 - 08 - 01),
            period_end: date!(2026 - 08 - 15),
        };

        let response =
            create_payroll_endpoint(State(state.clone()), Extension(manager_context), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let payrolls =
            get_payrolls(context.workspace_id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(payrolls.is_empty());
    }

    #[tokio::test]
    async fn backwards_period_is_rejected() {
        let (state, context) = get_test_state();
        let form = PayrollFormData {
            period_start: date!(2026 - 08 - 15),
            period_end: date!(2026 - 08 - 01),
        };

        let response = create_payroll_endpoint(State(state), Extension(context), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
