//! The board page showing tasks grouped by status column.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::RequestContext,
    board::{Board, Task, TaskStatus, get_board, get_tasks_for_board},
    database_id::DatabaseId,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
    },
    navigation::NavBar,
    user::UserId,
    workspace::{Member, get_members},
};

/// The state needed for the board page.
#[derive(Debug, Clone)]
pub struct BoardPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BoardPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render a board with its tasks grouped into status columns.
///
/// Boards from other workspaces are reported as not found rather than
/// forbidden, so board IDs do not leak across tenants.
pub async fn get_board_page(
    Path(board_id): Path<DatabaseId>,
    State(state): State<BoardPageState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let board = get_board(board_id, &connection)?;
    if board.workspace_id != context.workspace_id {
        return Err(Error::NotFound);
    }

    let tasks = get_tasks_for_board(board_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve tasks: {error}"))?;
    let members = get_members(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve members: {error}"))?;

    Ok(board_view(&board, &tasks, &members).into_response())
}

fn board_view(board: &Board, tasks: &[Task], members: &[Member]) -> Markup {
    let nav_bar = NavBar::new(endpoints::BOARDS_VIEW).into_html();
    let emails_by_user: HashMap<UserId, &str> = members
        .iter()
        .map(|member| (member.user_id, member.email.as_str()))
        .collect();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { (board.name) }
                }

                (new_task_form_view(board.id, members))

                div class="grid gap-4 md:grid-cols-3"
                {
                    @for status in TaskStatus::ALL {
                        (column_view(status, tasks, &emails_by_user, members))
                    }
                }
            }
        }
    );

    base(&board.name, &content)
}

fn column_view(
    status: TaskStatus,
    tasks: &[Task],
    emails_by_user: &HashMap<UserId, &str>,
    members: &[Member],
) -> Markup {
    let column_tasks = tasks.iter().filter(|task| task.status == status);

    html!(
        section class="rounded bg-gray-100 p-3 dark:bg-gray-800"
        {
            h2 class="mb-3 text-sm font-bold uppercase text-gray-600 dark:text-gray-300"
            {
                (status.label())
            }

            ul class="space-y-3"
            {
                @for task in column_tasks {
                    (task_card_view(task, emails_by_user, members))
                }
            }
        }
    )
}

fn task_card_view(
    task: &Task,
    emails_by_user: &HashMap<UserId, &str>,
    members: &[Member],
) -> Markup {
    let update_url = endpoints::format_endpoint(endpoints::PUT_TASK, task.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_TASK, task.id);
    let confirm_message = format!("Are you sure you want to delete '{}'?", task.title);
    let assignee = task
        .assignee_id
        .and_then(|user_id| emails_by_user.get(&user_id).copied());

    html!(
        li class="rounded border border-gray-200 bg-white p-3 shadow-sm
            dark:border-gray-700 dark:bg-gray-900"
        {
            div class="flex items-start justify-between gap-2"
            {
                span class="font-medium" { (task.title) }

                button
                    hx-delete=(delete_url)
                    hx-confirm=(confirm_message)
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }

            @if !task.description.is_empty() {
                p class="mt-1 text-sm text-gray-600 dark:text-gray-400"
                {
                    (task.description)
                }
            }

            @if let Some(email) = assignee {
                p class="mt-1 text-xs text-gray-500 dark:text-gray-400" { (email) }
            }

            form
                hx-put=(update_url)
                hx-trigger="change"
                hx-target-error="#alert-container"
                class="mt-2"
            {
                input type="hidden" name="title" value=(task.title);
                input type="hidden" name="description" value=(task.description);
                input
                    type="hidden"
                    name="assignee_id"
                    value=[task.assignee_id.map(UserId::as_i64)];

                select name="status" class=(FORM_SELECT_STYLE)
                {
                    @for status in TaskStatus::ALL {
                        option
                            value=(status.as_str())
                            selected[status == task.status]
                        {
                            (status.label())
                        }
                    }
                }
            }

            (assignee_select_view(&update_url, task, members))
        }
    )
}

fn assignee_select_view(update_url: &str, task: &Task, members: &[Member]) -> Markup {
    html!(
        form
            hx-put=(update_url)
            hx-trigger="change"
            hx-target-error="#alert-container"
            class="mt-2"
        {
            input type="hidden" name="title" value=(task.title);
            input type="hidden" name="description" value=(task.description);
            input type="hidden" name="status" value=(task.status.as_str());

            select name="assignee_id" class=(FORM_SELECT_STYLE)
            {
                option value="" selected[task.assignee_id.is_none()] { "Unassigned" }

                @for member in members {
                    option
                        value=(member.user_id.as_i64())
                        selected[task.assignee_id == Some(member.user_id)]
                    {
                        (member.email)
                    }
                }
            }
        }
    )
}

fn new_task_form_view(board_id: DatabaseId, members: &[Member]) -> Markup {
    html!(
        form
            hx-post=(endpoints::POST_TASK)
            hx-target-error="#alert-container"
            class="flex flex-wrap items-end gap-3"
        {
            input type="hidden" name="board_id" value=(board_id);
            input type="hidden" name="status" value=(TaskStatus::Todo.as_str());

            div
            {
                label for="title" class=(FORM_LABEL_STYLE) { "Title" }

                input
                    id="title"
                    type="text"
                    name="title"
                    placeholder="New task"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description"
                    type="text"
                    name="description"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="assignee_id" class=(FORM_LABEL_STYLE) { "Assignee" }

                select id="assignee_id" name="assignee_id" class=(FORM_SELECT_STYLE)
                {
                    option value="" selected { "Unassigned" }

                    @for member in members {
                        option value=(member.user_id.as_i64()) { (member.email) }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Task" }
        }
    )
}

#[cfg(test)]
mod board_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{RequestContext, Role},
        board::{NewTask, TaskStatus, create_board, create_task},
        test_utils::{assert_valid_html, parse_html_document},
        user::{NewUser, PasswordHash, create_user},
        workspace::create_workspace_with_admin,
    };

    use super::{BoardPageState, get_board_page};

    fn get_test_state() -> (BoardPageState, RequestContext) {
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
        let context = RequestContext {
            user_id: user.id,
            workspace_id: workspace.id,
            role: Role::Member,
        };

        (
            BoardPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            context,
        )
    }

    #[tokio::test]
    async fn render_page_groups_tasks_by_status() {
        let (state, context) = get_test_state();
        let board = create_board(
            context.workspace_id,
            "Sprint 1",
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create board");
        create_task(
            NewTask {
                board_id: board.id,
                title: "Write the report".to_owned(),
                description: String::new(),
                status: TaskStatus::InProgress,
                assignee_id: None,
            },
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create task");

        let response = get_board_page(Path(board.id), State(state), Extension(context))
            .await
            .expect("Could not render board page");

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Write the report"), "want task in page");
        assert!(text.contains("In Progress"), "want column heading in page");
    }

    #[tokio::test]
    async fn board_from_another_workspace_is_not_found() {
        let (state, context) = get_test_state();
        let other_board = {
            let connection = state.db_connection.lock().unwrap();
            let other_user = create_user(
                NewUser {
                    email: "other@bar.baz".to_owned(),
                    password_hash: PasswordHash::new_unchecked("notarealhash"),
                },
                &connection,
            )
            .expect("Could not create test user");
            let other_workspace =
                create_workspace_with_admin("Other Corp", other_user.id, &connection)
                    .expect("Could not create workspace");
            create_board(other_workspace.id, "Secret", &connection)
                .expect("Could not create board")
        };

        let result = get_board_page(Path(other_board.id), State(state), Extension(context)).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
