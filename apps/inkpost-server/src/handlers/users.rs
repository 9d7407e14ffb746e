//! Account pages: register, log in, log out.

use actix_web::{HttpResponse, http::StatusCode, http::header, web};
use std::sync::Arc;

use inkpost_core::domain::{FieldErrors, Registration, User};
use inkpost_core::error::RepoError;
use inkpost_core::ports::TokenService;
use inkpost_shared::dto::{LoginForm, NextQuery, RegisterForm};

use crate::middleware::auth::{OptionalIdentity, safe_next};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{self, LoginPage, RegisterPage};

const BAD_CREDENTIALS: &str = "Invalid username or password.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// GET /users/register/
pub async fn register_form(identity: OptionalIdentity) -> AppResult<HttpResponse> {
    let page = RegisterPage::new(identity.username(), "", &FieldErrors::new());
    views::render(StatusCode::OK, &page)
}

/// POST /users/register/
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    form: web::Form<RegisterForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    let registration = match Registration::parse(&form.username, &form.password1, &form.password2)
    {
        Ok(registration) => registration,
        Err(errors) => return redisplay_register(&form.username, &errors),
    };

    if state
        .users
        .find_by_username(&registration.username)
        .await?
        .is_some()
    {
        return redisplay_register(&form.username, &username_taken());
    }

    let passwords = state.passwords.clone();
    let password = registration.password;
    let password_hash = web::block(move || passwords.hash(&password)).await??;

    let user = match state
        .users
        .save(User::new(registration.username, password_hash))
        .await
    {
        Ok(user) => user,
        // lost a race with another sign-up for the same name
        Err(RepoError::Constraint(_)) => {
            return redisplay_register(&form.username, &username_taken());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");
    start_session(&state, token_service.get_ref().as_ref(), &user, "/")
}

/// GET /users/login/
pub async fn login_form(
    identity: OptionalIdentity,
    query: web::Query<NextQuery>,
) -> AppResult<HttpResponse> {
    let page = LoginPage {
        user: identity.username(),
        username: String::new(),
        next: safe_next(query.next.as_deref()),
        error: None,
    };
    views::render(StatusCode::OK, &page)
}

/// POST /users/login/
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let next = safe_next(form.next.as_deref());

    let user = state.users.find_by_username(form.username.trim()).await?;

    let verified = match user {
        Some(user) => {
            let passwords = state.passwords.clone();
            let password = form.password.clone();
            let hash = user.password_hash.clone();
            web::block(move || passwords.verify(&password, &hash))
                .await??
                .then_some(user)
        }
        None => {
            let passwords = state.passwords.clone();
            let password = form.password.clone();
            web::block(move || passwords.verify_without_hash(&password)).await?;
            None
        }
    };

    let Some(user) = verified else {
        tracing::info!(username = %form.username, "Failed login attempt");
        let page = LoginPage {
            user: None,
            username: form.username,
            next,
            error: Some(BAD_CREDENTIALS.to_string()),
        };
        return views::render(StatusCode::OK, &page);
    };

    tracing::info!(user_id = %user.id, "User logged in");
    start_session(&state, token_service.get_ref().as_ref(), &user, &next)
}

/// GET|POST /users/logout/
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(state.session.removal_cookie())
        .finish()
}

fn start_session(
    state: &AppState,
    token_service: &dyn TokenService,
    user: &User,
    location: &str,
) -> AppResult<HttpResponse> {
    let token = token_service.generate_token(user.id, &user.username)?;
    let cookie = state
        .session
        .session_cookie(token, token_service.expiration_seconds());

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish())
}

fn username_taken() -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add("username", USERNAME_TAKEN);
    errors
}

fn redisplay_register(username: &str, errors: &FieldErrors) -> AppResult<HttpResponse> {
    tracing::debug!(%errors, "Registration form rejected");
    views::render(StatusCode::OK, &RegisterPage::new(None, username, errors))
}
