use askama::Template;

use inkpost_core::domain::FieldErrors;

use super::messages;

#[derive(Template)]
#[template(path = "users/register.html")]
pub struct RegisterPage {
    pub user: Option<String>,
    pub username: String,
    pub username_errors: Vec<String>,
    pub password1_errors: Vec<String>,
    pub password2_errors: Vec<String>,
}

impl RegisterPage {
    /// Form prefilled with `username`; passwords are never echoed back.
    pub fn new(user: Option<String>, username: &str, errors: &FieldErrors) -> Self {
        Self {
            user,
            username: username.to_string(),
            username_errors: messages(errors, "username"),
            password1_errors: messages(errors, "password1"),
            password2_errors: messages(errors, "password2"),
        }
    }
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginPage {
    pub user: Option<String>,
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}
