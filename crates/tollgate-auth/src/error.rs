//! Authentication error types

use thiserror::Error;

/// Errors raised by the authentication layer.
///
/// Rejected credentials and missing or invalid sessions are not errors at
/// this level; they come back as `None` or `false`. `InvalidCredentials`
/// is raised by the HTTP edge when it turns a rejected login into a
/// response.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token signing error: {0}")]
    Signing(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("User store error: {0}")]
    Store(#[from] tollgate_db::DbError),
}
