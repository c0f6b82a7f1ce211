//! Workspace creation page and endpoint.

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
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    workspace::{create_workspace_with_admin, domain::WorkspaceFormData},
};

/// The state needed for creating a workspace.
#[derive(Debug, Clone)]
pub struct CreateWorkspaceEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for CreateWorkspaceEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Render the workspace creation page.
pub async fn get_new_workspace_page() -> Response {
    new_workspace_view().into_response()
}

/// Handle workspace creation form submission.
///
/// Any signed-in user may create a workspace; they become its admin.
pub async fn create_workspace_endpoint(
    State(state): State<CreateWorkspaceEndpointState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<WorkspaceFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_workspace_with_admin(&form_data.name, context.user_id, &connection) {
        Ok(workspace) => {
            state.events.publish(workspace.id, ChangeTopic::Workspace);

            (
                HxRedirect(endpoints::WORKSPACES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::EmptyName(_)) => {
            new_workspace_form_view("Error: Workspace name cannot be empty").into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a workspace: {error}");

            error.into_alert_response()
        }
    }
}

fn new_workspace_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_WORKSPACE_VIEW).into_html();
    let form = new_workspace_form_view("");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Workspace", &content)
}

fn new_workspace_form_view(error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_WORKSPACE)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Workspace Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Workspace Name"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE)
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Workspace" }
        }
    }
}
