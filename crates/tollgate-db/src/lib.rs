//! Tollgate Database Layer
//!
//! This crate owns the user records that the authentication layer
//! resolves sessions against, persisted in SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
