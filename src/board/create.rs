//! Board creation page and endpoint.

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
    board::{create_board, domain::BoardFormData},
    events::{ChangeEvents, ChangeTopic},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for creating a board.
#[derive(Debug, Clone)]
pub struct CreateBoardEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for CreateBoardEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Render the board creation page.
pub async fn get_new_board_page() -> Response {
    new_board_view().into_response()
}

/// Handle board creation form submission. Requires the manager role.
pub async fn create_board_endpoint(
    State(state): State<CreateBoardEndpointState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<BoardFormData>,
) -> Response {
    if !context.role.can_manage() {
        return Error::Forbidden.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_board(context.workspace_id, &form_data.name, &connection) {
        Ok(_) => {
            state
                .events
                .publish(context.workspace_id, ChangeTopic::Boards);

            (
                HxRedirect(endpoints::BOARDS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::EmptyName(_)) => {
            new_board_form_view("Error: Board name cannot be empty").into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a board: {error}");

            error.into_alert_response()
        }
    }
}

fn new_board_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_BOARD_VIEW).into_html();
    let form = new_board_form_view("");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Board", &content)
}

fn new_board_form_view(error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_BOARD)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Board Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Board Name"
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

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Board" }
        }
    }
}

#[cfg(test)]
mod create_board_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::State,
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        auth::{RequestContext, Role},
        board::{domain::BoardFormData, get_boards},
        database_id::DatabaseId,
        endpoints,
        events::ChangeEvents,
        test_utils::assert_hx_redirect,
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    use super::{CreateBoardEndpointState, create_board_endpoint};

    fn get_test_state() -> (CreateBoardEndpointState, DatabaseId) {
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

        (
            CreateBoardEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
                events: ChangeEvents::new(),
            },
            workspace.id,
        )
    }

    fn manager_context(workspace_id: DatabaseId) -> RequestContext {
        RequestContext {
            user_id: crate::user::UserId::new(1),
            workspace_id,
            role: Role::Manager,
        }
    }

    #[tokio::test]
    async fn manager_can_create_board() {
        let (state, workspace_id) = get_test_state();
        let form = BoardFormData {
            name: "Sprint 1".to_owned(),
        };

        let response = create_board_endpoint(
            State(state.clone()),
            Extension(manager_context(workspace_id)),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::BOARDS_VIEW);

        let boards = get_boards(workspace_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].name, "Sprint 1");
    }

    #[tokio::test]
    async fn member_cannot_create_board() {
        let (state, workspace_id) = get_test_state();
        let form = BoardFormData {
            name: "Sprint 1".to_owned(),
        };
        let context = RequestContext {
            role: Role::Member,
            ..manager_context(workspace_id)
        };

        let response = create_board_endpoint(State(state.clone()), Extension(context), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(
            get_boards(workspace_id, &state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }
}
