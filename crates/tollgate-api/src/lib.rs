//! Tollgate REST API
//!
//! This crate provides the Axum-based HTTP surface for Tollgate:
//! cookie-session login, logout and current-user lookup, plus health
//! and metrics endpoints.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use routes::auth::{CurrentUser, RequireUser};
pub use state::{AppState, MetricsHandle};
