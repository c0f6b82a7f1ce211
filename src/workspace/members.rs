//! Workspace members page, member addition and workspace rename endpoints.

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
    alert::Alert,
    auth::{RequestContext, Role},
    database_id::DatabaseId,
    events::{ChangeEvents, ChangeTopic},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE,
        base,
    },
    navigation::NavBar,
    user::get_user_by_email,
    workspace::{
        Member, Workspace, add_member, domain::MemberFormData, domain::WorkspaceFormData,
        get_members, get_membership, get_workspace, rename_workspace,
    },
};

/// The state needed for the workspace members page.
#[derive(Debug, Clone)]
pub struct MembersPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MembersPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for adding a member or renaming a workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceAdminEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: ChangeEvents,
}

impl FromRef<AppState> for WorkspaceAdminEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// Render the members page for a workspace.
///
/// Any member may view the page. The add-member and rename forms are only
/// rendered for admins, and the endpoints re-check the role server-side.
pub async fn get_workspace_members_page(
    Path(workspace_id): Path<DatabaseId>,
    State(state): State<MembersPageState>,
    Extension(context): Extension<RequestContext>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let membership = get_membership(workspace_id, context.user_id, &connection)?;
    let workspace = get_workspace(workspace_id, &connection)?;
    let members = get_members(workspace_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve members: {error}"))?;

    Ok(members_view(&workspace, &members, membership.role.is_admin()).into_response())
}

/// Handle member addition form submission. Admin only.
pub async fn add_member_endpoint(
    Path(workspace_id): Path<DatabaseId>,
    State(state): State<WorkspaceAdminEndpointState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<MemberFormData>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        require_admin(workspace_id, &context, &connection)?;

        let role = Role::parse(&form_data.role).ok_or(Error::Forbidden)?;
        let user = get_user_by_email(form_data.email.trim(), &connection)?;

        add_member(workspace_id, user.id, role, &connection)
    });

    match result {
        Ok(_) => {
            state.events.publish(workspace_id, ChangeTopic::Workspace);

            (
                HxRedirect(endpoints::format_endpoint(
                    endpoints::WORKSPACE_MEMBERS_VIEW,
                    workspace_id,
                )),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::NotFound) => (
            StatusCode::BAD_REQUEST,
            Alert::error(
                "No such user",
                "No user with that email address exists. They need to be \
                registered before they can be added to a workspace.",
            ),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Failed to add member to workspace {workspace_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Handle workspace rename form submission. Admin only.
pub async fn update_workspace_endpoint(
    Path(workspace_id): Path<DatabaseId>,
    State(state): State<WorkspaceAdminEndpointState>,
    Extension(context): Extension<RequestContext>,
    Form(form_data): Form<WorkspaceFormData>,
) -> Response {
    let result = lock_connection(&state).and_then(|connection| {
        require_admin(workspace_id, &context, &connection)?;

        rename_workspace(workspace_id, &form_data.name, &connection)
    });

    match result {
        Ok(()) => {
            state.events.publish(workspace_id, ChangeTopic::Workspace);

            (
                HxRedirect(endpoints::WORKSPACES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Failed to rename workspace {workspace_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn lock_connection(
    state: &WorkspaceAdminEndpointState,
) -> Result<MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

fn require_admin(
    workspace_id: DatabaseId,
    context: &RequestContext,
    connection: &Connection,
) -> Result<(), Error> {
    let membership = get_membership(workspace_id, context.user_id, connection)?;

    if !membership.role.is_admin() {
        return Err(Error::Forbidden);
    }

    Ok(())
}

fn members_view(workspace: &Workspace, members: &[Member], is_admin: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::WORKSPACES_VIEW).into_html();
    let title = format!("{} Members", workspace.name);

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { (title) }
                }

                section class="dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Role" }
                            }
                        }

                        tbody
                        {
                            @for member in members {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (member.email) }
                                    td class=(TABLE_CELL_STYLE) { (member.role.as_str()) }
                                }
                            }
                        }
                    }
                }

                @if is_admin {
                    (add_member_form_view(workspace.id))
                    (rename_form_view(workspace))
                }
            }
        }
    );

    base(&title, &content)
}

fn add_member_form_view(workspace_id: DatabaseId) -> Markup {
    let add_member_endpoint = endpoints::format_endpoint(endpoints::POST_MEMBER, workspace_id);

    html! {
        form
            hx-post=(add_member_endpoint)
            hx-target-error="#alert-container"
            class="w-full max-w-md space-y-4"
        {
            h2 class="text-lg font-bold" { "Add Member" }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }

                input
                    id="email"
                    type="email"
                    name="email"
                    placeholder="user@example.com"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="role" class=(FORM_LABEL_STYLE) { "Role" }

                select id="role" name="role" class=(FORM_SELECT_STYLE)
                {
                    option value="member" selected { "Member" }
                    option value="manager" { "Manager" }
                    option value="admin" { "Admin" }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Member" }
        }
    }
}

fn rename_form_view(workspace: &Workspace) -> Markup {
    let rename_endpoint = endpoints::format_endpoint(endpoints::PUT_WORKSPACE, workspace.id);

    html! {
        form
            hx-put=(rename_endpoint)
            hx-target-error="#alert-container"
            class="w-full max-w-md space-y-4"
        {
            h2 class="text-lg font-bold" { "Rename Workspace" }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Workspace Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    value=(workspace.name)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Rename" }
        }
    }
}
