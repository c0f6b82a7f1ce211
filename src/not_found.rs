//! Defines the route handler for the page to display when a resource cannot be found.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Sorry, we could not find that page or resource.",
            "Check the address for typos or head back to the dashboard.",
        ),
    )
        .into_response()
}
