//! Alert fragments for displaying success and error messages to users.
//!
//! Alerts are swapped out-of-band into the `#alert-container` element that the
//! base layout renders on every page, so endpoints can respond to htmx
//! requests with an alert without replacing the page content.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

const ALERT_SUCCESS_STYLE: &str = "p-4 mb-4 rounded-lg border text-green-800 \
    border-green-300 bg-green-50 dark:bg-gray-800 dark:text-green-400 \
    dark:border-green-800";

const ALERT_ERROR_STYLE: &str = "p-4 mb-4 rounded-lg border text-red-800 \
    border-red-300 bg-red-50 dark:bg-gray-800 dark:text-red-400 \
    dark:border-red-800";

/// An alert message rendered into the page's alert container.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An operation succeeded.
    Success {
        /// The headline shown in bold.
        message: String,
        /// Extra detail shown below the headline.
        details: String,
    },
    /// An operation succeeded, no extra detail needed.
    SuccessSimple {
        /// The headline shown in bold.
        message: String,
    },
    /// An operation failed.
    Error {
        /// The headline shown in bold.
        message: String,
        /// Extra detail shown below the headline.
        details: String,
    },
}

impl Alert {
    /// Create a success alert with details.
    pub fn success(message: &str, details: &str) -> Self {
        Self::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create an error alert with details.
    pub fn error(message: &str, details: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Success { message, details } => (ALERT_SUCCESS_STYLE, message, details),
            Alert::SuccessSimple { message } => (ALERT_SUCCESS_STYLE, message, String::new()),
            Alert::Error { message, details } => (ALERT_ERROR_STYLE, message, details),
        };

        html! {
            div id="alert-container" hx-swap-oob="true" class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(style) role="alert"
                {
                    p class="font-medium" { (message) }

                    @if !details.is_empty() {
                        p { (details) }
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
