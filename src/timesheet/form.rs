//! The shared form for logging and editing time entries.

use maud::{Markup, html};
use time::Date;

use crate::{
    board::Task,
    database_id::DatabaseId,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
};

/// How the form submits: a POST to create or a PUT to update.
pub(super) enum FormMethod {
    Post,
    Put,
}

pub(super) struct TimeEntryFormDefaults<'a> {
    pub date: Date,
    pub minutes: Option<i64>,
    pub description: &'a str,
    pub task_id: Option<DatabaseId>,
}

pub(super) fn time_entry_form_view(
    method: FormMethod,
    endpoint: &str,
    defaults: &TimeEntryFormDefaults,
    tasks: &[Task],
    submit_label: &str,
    error_message: &str,
) -> Markup {
    html! {
        form
            hx-post=[matches!(method, FormMethod::Post).then_some(endpoint)]
            hx-put=[matches!(method, FormMethod::Put).then_some(endpoint)]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name="date"
                    value=(defaults.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="minutes" class=(FORM_LABEL_STYLE) { "Minutes" }

                input
                    id="minutes"
                    type="number"
                    name="minutes"
                    min="1"
                    step="1"
                    value=[defaults.minutes]
                    placeholder="60"
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
                    value=(defaults.description)
                    placeholder="What did you work on?"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="task_id" class=(FORM_LABEL_STYLE) { "Task" }

                select id="task_id" name="task_id" class=(FORM_SELECT_STYLE)
                {
                    option value="" selected[defaults.task_id.is_none()] { "No task" }

                    @for task in tasks {
                        option
                            value=(task.id)
                            selected[defaults.task_id == Some(task.id)]
                        {
                            (task.title)
                        }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}
