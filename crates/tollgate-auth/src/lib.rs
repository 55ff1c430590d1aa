//! Tollgate Authentication
//!
//! Password hashing, signed session tokens carried in a cookie, and
//! resolution of the current user from a request.

pub mod cookie;
pub mod error;
pub mod jwt;
pub mod password;
pub mod session;
pub mod store;

pub use cookie::{DEFAULT_SESSION_COOKIE, SessionCookie};
pub use error::AuthError;
pub use jwt::{Claims, TokenConfig, TokenSigner, TokenStatus};
pub use password::{PasswordHasher, PasswordParams, hash_password, verify_password};
pub use session::{authenticate_user, get_current_user, resolve_session};
pub use store::UserStore;
