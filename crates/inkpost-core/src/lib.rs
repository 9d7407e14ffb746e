//! # Inkpost Core
//!
//! The domain layer of the Inkpost blog.
//! Entities, form validation and the repository/auth ports live here;
//! nothing in this crate touches a database or the network.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::DomainError;
