//! Domain entities - the core business objects.

pub mod form;
mod post;
mod user;

pub use form::{FieldError, FieldErrors, Registration, slugify};
pub use post::{DEFAULT_BANNER, NewPost, Post};
pub use user::User;
