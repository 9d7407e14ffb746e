use askama::Template;

/// Shared page for 404, 409, 429 and 500. It shows only the home link in the
/// nav since it is rendered without the request's session.
#[derive(Template)]
#[template(path = "errors/error.html")]
pub struct ErrorPage {
    pub status: u16,
    pub title: String,
    pub detail: Option<String>,
}
