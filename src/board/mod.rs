//! Task boards: boards, tasks and their status columns.

mod create;
mod db;
pub(crate) mod domain;
mod lifecycle;
mod list;
mod tasks;
mod view;

pub use create::{create_board_endpoint, get_new_board_page};
pub use db::{
    archive_board, count_open_tasks, create_board, create_board_table, create_task,
    create_task_table, delete_board, delete_task, get_board, get_boards, get_task,
    get_tasks_for_board, get_workspace_tasks, restore_board, update_task,
};
pub use domain::{Board, BoardStatus, NewTask, Task, TaskStatus, TaskUpdate};
pub use lifecycle::{archive_board_endpoint, delete_board_endpoint, restore_board_endpoint};
pub use list::get_boards_page;
pub use tasks::{create_task_endpoint, delete_task_endpoint, update_task_endpoint};
pub use view::get_board_page;
