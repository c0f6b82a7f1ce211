//! The task board types.

use serde::Deserialize;

use crate::{Error, database_id::DatabaseId, user::UserId};

/// Where a board is in its lifecycle.
///
/// Boards follow the same archive-before-delete rule as workspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardStatus {
    /// The board is in use.
    Active,
    /// The board is hidden from the default listing but can be restored.
    Archived,
    /// The board is soft-deleted.
    Deleted,
}

impl BoardStatus {
    /// The string stored in the board table.
    pub fn as_str(self) -> &'static str {
        match self {
            BoardStatus::Active => "active",
            BoardStatus::Archived => "archived",
            BoardStatus::Deleted => "deleted",
        }
    }

    /// Parse a status from its database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(BoardStatus::Active),
            "archived" => Some(BoardStatus::Archived),
            "deleted" => Some(BoardStatus::Deleted),
            _ => None,
        }
    }
}

/// The column a task sits in on its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Every status, in board column order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// The string stored in the task table.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Parse a status from its database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// The column heading shown to users.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

/// A task board within a workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// The board's ID in the database.
    pub id: DatabaseId,
    /// The workspace the board belongs to.
    pub workspace_id: DatabaseId,
    /// The board's display name.
    pub name: String,
    /// Where the board is in its lifecycle.
    pub status: BoardStatus,
}

/// A task on a board.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// The task's ID in the database.
    pub id: DatabaseId,
    /// The board the task sits on.
    pub board_id: DatabaseId,
    /// The task's one-line title.
    pub title: String,
    /// A longer free-text description, possibly empty.
    pub description: String,
    /// The column the task sits in.
    pub status: TaskStatus,
    /// The member responsible for the task, if any.
    pub assignee_id: Option<UserId>,
}

/// The data needed to create a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// The board the task goes on.
    pub board_id: DatabaseId,
    /// The task's one-line title.
    pub title: String,
    /// A longer free-text description, possibly empty.
    pub description: String,
    /// The column the task starts in.
    pub status: TaskStatus,
    /// The member responsible for the task, if any.
    pub assignee_id: Option<UserId>,
}

/// The fields written by a task update.
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    /// The task's one-line title.
    pub title: String,
    /// A longer free-text description, possibly empty.
    pub description: String,
    /// The column the task sits in.
    pub status: TaskStatus,
    /// The member responsible for the task, if any.
    pub assignee_id: Option<UserId>,
}

/// The form data for creating a board.
#[derive(Debug, Deserialize)]
pub struct BoardFormData {
    /// The board name the user typed.
    pub name: String,
}

/// The form data for creating or updating a task.
#[derive(Debug, Deserialize)]
pub struct TaskFormData {
    /// The board the task goes on. Only present when creating.
    pub board_id: Option<DatabaseId>,
    /// The task's one-line title.
    pub title: String,
    /// A longer free-text description.
    #[serde(default)]
    pub description: String,
    /// The column the task sits in, one of "todo", "in_progress" or "done".
    pub status: String,
    /// The member responsible for the task. An empty string means unassigned.
    #[serde(default)]
    pub assignee_id: Option<String>,
}

impl TaskFormData {
    /// Parse the assignee field, treating the empty string as unassigned.
    pub fn parse_assignee(&self) -> Result<Option<UserId>, Error> {
        match self.assignee_id.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(|id| Some(UserId::new(id)))
                .map_err(|_| Error::NotFound),
        }
    }
}

/// Trim `title` and reject it if nothing is left.
pub(crate) fn validate_task_title(title: &str) -> Result<String, Error> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(Error::EmptyName("task title"));
    }

    Ok(trimmed.to_owned())
}

/// Trim `name` and reject it if nothing is left.
pub(crate) fn validate_board_name(name: &str) -> Result<String, Error> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(Error::EmptyName("board name"));
    }

    Ok(trimmed.to_owned())
}


#[cfg(test)]
mod task_form_tests {
    use crate::user::UserId;

    use super::TaskFormData;

    fn form_with_assignee(assignee_id: Option<&str>) -> TaskFormData {
        TaskFormData {
            board_id: Some(1),
            title: "A task".to_owned(),
            description: String::new(),
            status: "todo".to_owned(),
            assignee_id: assignee_id.map(str::to_owned),
        }
    }

    #[test]
    fn empty_assignee_means_unassigned() {
        assert_eq!(form_with_assignee(None).parse_assignee(), Ok(None));
        assert_eq!(form_with_assignee(Some("")).parse_assignee(), Ok(None));
    }

    #[test]
    fn numeric_assignee_is_parsed() {
        assert_eq!(
            form_with_assignee(Some("7")).parse_assignee(),
            Ok(Some(UserId::new(7)))
        );
    }

    #[test]
    fn garbage_assignee_is_rejected() {
        assert!(form_with_assignee(Some("seven")).parse_assignee().is_err());
    }
}
