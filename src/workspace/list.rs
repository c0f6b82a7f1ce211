//! Workspaces listing page.

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
    auth::{RequestContext, Role},
    html::{
        BADGE_ACTIVE_STYLE, BADGE_INACTIVE_STYLE, BUTTON_ACTION_STYLE, BUTTON_DELETE_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        TABLE_STYLE, base,
    },
    navigation::NavBar,
    workspace::{Workspace, WorkspaceStatus, get_workspaces_for_user},
};

/// The state needed for the workspaces listing page.
#[derive(Debug, Clone)]
pub struct WorkspacesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for WorkspacesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the workspaces listing page for the current user.
pub async fn get_workspaces_page(
    State(state): State<WorkspacesPageState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let workspaces = get_workspaces_for_user(context.user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve workspaces: {error}"))?;

    Ok(workspaces_view(&workspaces, &context).into_response())
}

fn workspaces_view(workspaces: &[(Workspace, Role)], context: &RequestContext) -> Markup {
    let nav_bar = NavBar::new(endpoints::WORKSPACES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Workspaces" }

                    a href=(endpoints::NEW_WORKSPACE_VIEW) class=(LINK_STYLE)
                    {
                        "Create Workspace"
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Your Role" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for (workspace, role) in workspaces {
                                (workspace_row(workspace, *role, context))
                            }

                            @if workspaces.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No workspaces yet. "
                                        a href=(endpoints::NEW_WORKSPACE_VIEW) class=(LINK_STYLE)
                                        {
                                            "Create your first workspace"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Workspaces", &content)
}

fn workspace_row(workspace: &Workspace, role: Role, context: &RequestContext) -> Markup {
    let members_url =
        endpoints::format_endpoint(endpoints::WORKSPACE_MEMBERS_VIEW, workspace.id);
    let select_url = endpoints::format_endpoint(endpoints::SELECT_WORKSPACE, workspace.id);
    let archive_url = endpoints::format_endpoint(endpoints::ARCHIVE_WORKSPACE, workspace.id);
    let restore_url = endpoints::format_endpoint(endpoints::RESTORE_WORKSPACE, workspace.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_WORKSPACE, workspace.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? This cannot be undone.",
        workspace.name
    );

    let is_current = workspace.id == context.workspace_id;
    let is_active = workspace.status == WorkspaceStatus::Active;

    let status_badge = match workspace.status {
        WorkspaceStatus::Active => html!(span class=(BADGE_ACTIVE_STYLE) { "Active" }),
        WorkspaceStatus::Archived => html!(span class=(BADGE_INACTIVE_STYLE) { "Archived" }),
        WorkspaceStatus::Deleted => html!(span class=(BADGE_INACTIVE_STYLE) { "Deleted" }),
    };

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                (workspace.name)
                @if is_current {
                    span class="ml-2 text-xs text-gray-500 dark:text-gray-400" { "(current)" }
                }
            }

            td class=(TABLE_CELL_STYLE) { (status_badge) }

            td class=(TABLE_CELL_STYLE) { (role.as_str()) }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    @if is_active && !is_current {
                        button
                            hx-post=(select_url)
                            class=(BUTTON_ACTION_STYLE)
                        {
                            "Switch"
                        }
                    }

                    a href=(members_url) class=(LINK_STYLE) { "Members" }

                    @if role.is_admin() {
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
