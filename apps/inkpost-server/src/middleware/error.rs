//! Error handling - HTML error pages for the site, RFC 7807 bodies for the API.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use inkpost_core::DomainError;
use inkpost_core::error::RepoError;
use inkpost_core::ports::AuthError;
use inkpost_shared::ErrorResponse;

use crate::observability::RequestId;
use crate::views::ErrorPage;

/// Application-level error type rendered as an HTML error page.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests; retry in {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn title(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "Page not found",
            AppError::Conflict(_) => "Conflict",
            AppError::TooManyRequests { .. } => "Too many attempts",
            AppError::Internal(_) => "Server error",
        }
    }

    /// Detail safe to show to the client; internal causes stay in the logs.
    fn public_detail(&self) -> Option<String> {
        match self {
            AppError::NotFound(detail) | AppError::Conflict(detail) => Some(detail.clone()),
            AppError::TooManyRequests { retry_after_secs } => Some(format!(
                "Too many attempts. Try again in {retry_after_secs} seconds."
            )),
            AppError::Internal(_) => None,
        }
    }

    fn log(&self) {
        if let AppError::Internal(detail) = self {
            tracing::error!("Internal error: {}", detail);
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.log();

        let status = self.status_code();
        let page = ErrorPage {
            status: status.as_u16(),
            title: self.title().to_string(),
            detail: self.public_detail(),
        };

        let mut response = HttpResponse::build(status);
        if let AppError::TooManyRequests { retry_after_secs } = self {
            response.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
        }

        match askama::Template::render(&page) {
            Ok(html) => response.content_type("text/html; charset=utf-8").body(html),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                response.body(page.title)
            }
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("No {} matches “{}”.", entity_type.to_lowercase(), key))
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Internal(format!("Template rendering failed: {err}"))
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Result type alias for HTML handlers.
pub type AppResult<T> = Result<T, AppError>;

/// [`AppError`] rendered as an RFC 7807 JSON document, for `/api` routes.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ApiError {
    error: AppError,
    request_id: String,
}

impl ApiError {
    /// Adapter for `map_err` that tags the error with the request's ID.
    pub fn tagged<E: Into<AppError>>(request_id: &RequestId) -> impl FnOnce(E) -> ApiError + '_ {
        move |err| ApiError {
            error: err.into(),
            request_id: request_id.as_str().to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.error.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        self.error.log();

        let status = self.status_code();
        let mut body =
            ErrorResponse::new(status.as_u16(), self.error.title()).with_request_id(&self.request_id);
        if let Some(detail) = self.error.public_detail() {
            body = body.with_detail(detail);
        }

        HttpResponse::build(status).json(body)
    }
}

/// Result type alias for JSON handlers.
pub type ApiResult<T> = Result<T, ApiError>;
