use axum::{body::Body, response::Response};
use scraper::Html;

use super::http::get_body_text;

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    let text = get_body_text(response).await;

    Html::parse_document(&text)
}

pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    let text = get_body_text(response).await;

    Html::parse_fragment(&text)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}
