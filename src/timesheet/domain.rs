//! The time tracking types.

use serde::Deserialize;
use time::{Date, Duration};

use crate::{Error, database_id::DatabaseId, user::UserId};

/// A block of time a user logged against their workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    /// The entry's ID in the database.
    pub id: DatabaseId,
    /// The workspace the time was logged in.
    pub workspace_id: DatabaseId,
    /// The user who logged the time.
    pub user_id: UserId,
    /// The task the time was spent on, if any.
    pub task_id: Option<DatabaseId>,
    /// The day the work happened.
    pub date: Date,
    /// How long the work took, in whole minutes.
    pub minutes: i64,
    /// What the time was spent on.
    pub description: String,
}

/// The data needed to create a time entry.
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    /// The workspace the time was logged in.
    pub workspace_id: DatabaseId,
    /// The user who logged the time.
    pub user_id: UserId,
    /// The task the time was spent on, if any.
    pub task_id: Option<DatabaseId>,
    /// The day the work happened.
    pub date: Date,
    /// How long the work took, in whole minutes.
    pub minutes: i64,
    /// What the time was spent on.
    pub description: String,
}

/// The fields written by a time entry update.
#[derive(Debug, Clone)]
pub struct TimeEntryUpdate {
    /// The task the time was spent on, if any.
    pub task_id: Option<DatabaseId>,
    /// The day the work happened.
    pub date: Date,
    /// How long the work took, in whole minutes.
    pub minutes: i64,
    /// What the time was spent on.
    pub description: String,
}

/// The form data for creating or updating a time entry.
#[derive(Debug, Deserialize)]
pub struct TimeEntryFormData {
    /// The day the work happened.
    pub date: Date,
    /// How long the work took, in whole minutes.
    pub minutes: i64,
    /// What the time was spent on.
    #[serde(default)]
    pub description: String,
    /// The task the time was spent on. An empty string means no task.
    #[serde(default)]
    pub task_id: Option<String>,
}

impl TimeEntryFormData {
    /// Parse the task field, treating the empty string as no task.
    pub fn parse_task_id(&self) -> Result<Option<DatabaseId>, Error> {
        match self.task_id.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| Error::NotFound),
        }
    }
}

/// The Monday of the week containing `date`.
pub fn week_start(date: Date) -> Date {
    let days_into_week = date.weekday().number_days_from_monday();

    date - Duration::days(days_into_week as i64)
}

/// The Sunday of the week containing `date`.
pub fn week_end(date: Date) -> Date {
    week_start(date) + Duration::days(6)
}

/// Check that a duration is a positive number of minutes.
pub(crate) fn validate_minutes(minutes: i64) -> Result<i64, Error> {
    if minutes <= 0 {
        return Err(Error::NonPositiveAmount);
    }

    Ok(minutes)
}


#[cfg(test)]
mod minutes_tests {
    use crate::Error;

    use super::validate_minutes;

    #[test]
    fn positive_minutes_pass() {
        assert_eq!(validate_minutes(30), Ok(30));
    }

    #[test]
    fn zero_and_negative_minutes_fail() {
        assert_eq!(validate_minutes(0), Err(Error::NonPositiveAmount));
        assert_eq!(validate_minutes(-15), Err(Error::NonPositiveAmount));
    }
}
