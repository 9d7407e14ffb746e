//! Page view models rendered through askama templates.

mod auth;
mod error;
mod posts;

use actix_web::{HttpResponse, http::StatusCode};
use askama::Template;

use inkpost_core::domain::FieldErrors;

use crate::middleware::error::AppResult;

pub use auth::{LoginPage, RegisterPage};
pub use error::ErrorPage;
pub use posts::{NewPostPage, PostCard, PostDetail, PostPage, PostsListPage};

/// Render `page` as an HTML response with the given status.
pub fn render(status: StatusCode, page: &impl Template) -> AppResult<HttpResponse> {
    let html = page.render()?;
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// Messages recorded against `field`, owned for the template.
fn messages(errors: &FieldErrors, field: &str) -> Vec<String> {
    errors.get(field).map(str::to_string).collect()
}
