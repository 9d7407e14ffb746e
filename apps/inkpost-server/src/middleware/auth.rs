//! Session authentication: extractors, login redirect and session cookies.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload};
use std::future::{Ready, ready};
use std::sync::Arc;

use inkpost_core::ports::{AuthError, TokenClaims, TokenService};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "inkpost_session";

/// Where unauthenticated visitors of login-only pages are sent.
pub const LOGIN_URL: &str = "/users/login/";

/// Session cookie settings.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Set the `Secure` attribute (serve over HTTPS only).
    pub cookie_secure: bool,
}

impl SessionConfig {
    /// Cookie that stores `token` for `max_age_secs`.
    pub fn session_cookie(&self, token: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(CookieDuration::seconds(max_age_secs))
            .finish()
    }

    /// Cookie that tells the browser to drop the session.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .finish();
        cookie.make_removal();
        cookie
    }
}

/// The logged-in user.
///
/// Taking this as a handler argument makes the route login-only:
/// ```ignore
/// async fn new_post(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Rejection for login-only routes: redirects to the login page.
#[derive(Debug, thiserror::Error)]
#[error("{cause}")]
pub struct AuthenticationError {
    cause: AuthError,
    /// Path to come back to after logging in.
    next: Option<String>,
}

impl AuthenticationError {
    fn new(cause: AuthError, req: &HttpRequest) -> Self {
        let path = req.path();
        let url_safe = path
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"/-_.~%".contains(&b));

        Self {
            cause,
            next: url_safe.then(|| path.to_string()),
        }
    }

    fn login_location(&self) -> String {
        match &self.next {
            Some(next) => format!("{LOGIN_URL}?next={next}"),
            None => LOGIN_URL.to_string(),
        }
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        match &self.cause {
            AuthError::MissingAuth => {}
            other => tracing::debug!(reason = %other, "Rejected session"),
        }

        HttpResponse::Found()
            .insert_header((header::LOCATION, self.login_location()))
            .finish()
    }
}

fn session_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Ok(cookie.value().to_string());
    }

    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Err(AuthError::MissingAuth);
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(token_service) = req.app_data::<actix_web::web::Data<Arc<dyn TokenService>>>()
        else {
            tracing::error!("TokenService not found in app data");
            return ready(Err(AuthenticationError::new(
                AuthError::InvalidToken("Server configuration error".to_string()),
                req,
            )));
        };

        let result = session_token(req)
            .and_then(|token| token_service.validate_token(&token))
            .map(Identity::from)
            .map_err(|cause| AuthenticationError::new(cause, req));

        ready(result)
    }
}

/// Optional identity extractor - doesn't fail if not logged in.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    /// Username to show in the page header.
    pub fn username(&self) -> Option<String> {
        self.0.as_ref().map(|identity| identity.username.clone())
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        match Identity::from_request(req, payload).into_inner() {
            Ok(identity) => ready(Ok(OptionalIdentity(Some(identity)))),
            Err(_) => ready(Ok(OptionalIdentity(None))),
        }
    }
}

/// Accept `next` only when it is a path on this site.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
