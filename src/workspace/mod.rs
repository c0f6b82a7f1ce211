//! Workspace administration: workspaces, memberships and the active
//! request context.

mod create;
mod db;
pub(crate) mod domain;
mod lifecycle;
mod list;
mod members;

pub use create::{create_workspace_endpoint, get_new_workspace_page};
pub use db::{
    add_member, archive_workspace, create_membership_table, create_workspace_table,
    create_workspace_with_admin, delete_workspace, get_active_context, get_members,
    get_membership, get_workspace, get_workspaces_for_user, rename_workspace, restore_workspace,
};
pub use domain::{Member, Membership, Workspace, WorkspaceStatus};
pub use lifecycle::{
    archive_workspace_endpoint, delete_workspace_endpoint, restore_workspace_endpoint,
    select_workspace_endpoint,
};
pub use list::get_workspaces_page;
pub use members::{add_member_endpoint, get_workspace_members_page, update_workspace_endpoint};
