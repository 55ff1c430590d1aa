//! Login and per-request session resolution
//!
//! The request path is three explicit steps: pull the token out of the
//! cookie jar, validate it, then load the user it names. Every rejection
//! along the way ends as `Ok(None)`; only store or configuration failures
//! surface as errors.

use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;
use tollgate_db::User;
use tracing::{debug, info, warn};

use crate::cookie::SessionCookie;
use crate::error::AuthError;
use crate::jwt::{Claims, TokenSigner};
use crate::password::PasswordHasher;
use crate::store::UserStore;

/// Check an email/password pair, returning the user on success
///
/// Unknown email and wrong password both yield `Ok(None)`, and both cost
/// one password verification. A hash stored under outdated parameters is
/// upgraded after a successful check.
pub async fn authenticate_user<S>(
    email: &str,
    password: &str,
    store: &S,
    hasher: &PasswordHasher,
) -> Result<Option<User>, AuthError>
where
    S: UserStore + ?Sized,
{
    let Some(mut user) = store.find_user_by_email(email).await? else {
        hasher.verify_dummy(password).await?;
        debug!("Login rejected for {}: unknown account", email);
        return Ok(None);
    };

    if !hasher.verify_blocking(password, &user.password_hash).await? {
        debug!("Login rejected for {}: password mismatch", email);
        return Ok(None);
    }

    if hasher.needs_rehash(&user.password_hash) {
        match hasher.hash_blocking(password).await {
            Ok(new_hash) => match store.update_password_hash(user.id, &new_hash).await {
                Ok(_) => {
                    info!("Upgraded password hash for user {}", user.id);
                    user.password_hash = new_hash;
                }
                Err(e) => warn!("Failed to store upgraded hash for user {}: {}", user.id, e),
            },
            Err(e) => warn!("Failed to rehash password for user {}: {}", user.id, e),
        }
    }

    Ok(Some(user))
}

/// Load the user named by a validated payload's `sub` claim
pub async fn get_current_user<S>(
    payload: Option<&Claims>,
    store: &S,
) -> Result<Option<User>, AuthError>
where
    S: UserStore + ?Sized,
{
    let Some(claims) = payload else {
        return Ok(None);
    };

    let Some(user_id) = subject_id(claims) else {
        debug!("Session token has no usable sub claim");
        return Ok(None);
    };

    Ok(store.find_user_by_id(user_id).await?)
}

/// Cookie -> token -> claims -> user
pub async fn resolve_session<S>(
    jar: &CookieJar,
    cookie: &SessionCookie,
    signer: &TokenSigner,
    store: &S,
) -> Result<Option<User>, AuthError>
where
    S: UserStore + ?Sized,
{
    let token = cookie.extract_token(jar);
    let status = signer.validate(token.as_deref());

    metrics::counter!("tollgate_session_checks_total", "status" => status.label()).increment(1);

    let claims = status.into_claims();
    get_current_user(claims.as_ref(), store).await
}

/// User id from `sub`, given either as a string or a number
fn subject_id(claims: &Claims) -> Option<i64> {
    match claims.get("sub")? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}
