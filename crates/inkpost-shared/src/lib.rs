//! # Inkpost Shared
//!
//! Wire types shared by the server and any client: HTML form payloads,
//! JSON response bodies and the RFC 7807 error document.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
