//! Boards listing page.

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
    auth::RequestContext,
    board::{Board, BoardStatus, get_boards},
    html::{
        BADGE_ACTIVE_STYLE, BADGE_INACTIVE_STYLE, BUTTON_ACTION_STYLE, BUTTON_DELETE_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        TABLE_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for the boards listing page.
#[derive(Debug, Clone)]
pub struct BoardsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BoardsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the boards listing page for the active workspace.
pub async fn get_boards_page(
    State(state): State<BoardsPageState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let boards = get_boards(context.workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve boards: {error}"))?;

    Ok(boards_view(&boards, &context).into_response())
}

fn boards_view(boards: &[Board], context: &RequestContext) -> Markup {
    let nav_bar = NavBar::new(endpoints::BOARDS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Boards" }

                    @if context.role.can_manage() {
                        a href=(endpoints::NEW_BOARD_VIEW) class=(LINK_STYLE)
                        {
                            "Create Board"
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for board in boards {
                                (board_row(board, context))
                            }

                            @if boards.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No boards yet."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Boards", &content)
}

fn board_row(board: &Board, context: &RequestContext) -> Markup {
    let board_url = endpoints::format_endpoint(endpoints::BOARD_VIEW, board.id);
    let archive_url = endpoints::format_endpoint(endpoints::ARCHIVE_BOARD, board.id);
    let restore_url = endpoints::format_endpoint(endpoints::RESTORE_BOARD, board.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_BOARD, board.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? Its tasks will no longer be visible.",
        board.name
    );

    let is_active = board.status == BoardStatus::Active;
    let status_badge = if is_active {
        html!(span class=(BADGE_ACTIVE_STYLE) { "Active" })
    } else {
        html!(span class=(BADGE_INACTIVE_STYLE) { "Archived" })
    };

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                a href=(board_url) class=(LINK_STYLE) { (board.name) }
            }

            td class=(TABLE_CELL_STYLE) { (status_badge) }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    @if context.role.can_manage() {
                        @if is_active {
                            button
                                hx-post=(archive_url)
                                class=(BUTTON_ACTION_STYLE)
                            {
                                "Archive"
                            }
                        } @else {
                            button
                                hx-post=(restore_url)
                                class=(BUTTON_ACTION_STYLE)
                            {
                                "Restore"
                            }

                            button
                                hx-delete=(delete_url)
                                hx-confirm=(confirm_message)
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Delete"
                            }
                        }
                    }
                }
            }
        }
    )
}
