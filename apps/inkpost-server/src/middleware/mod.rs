//! Middleware, extractors and error rendering.

pub mod auth;
pub mod error;
pub mod rate_limit;
