//! Session extractors and authentication routes

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Map, Value};
use tollgate_auth::{AuthError, authenticate_user, resolve_session};
use tollgate_db::User;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse, UserResponse};

// ==================== Session Extractors ====================

/// Extractor for the current user, if the request carries a valid session
///
/// Never rejects for a missing, expired or malformed token; handlers that
/// allow anonymous access decide what `None` means.
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let user = resolve_session(
            &jar,
            &app_state.session,
            &app_state.signer,
            &app_state.db,
        )
        .await?;

        Ok(CurrentUser(user))
    }
}

/// Extractor for an authenticated user (required)
pub struct RequireUser(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        let user = user.ok_or(ApiError::Unauthorized)?;

        debug!("Authenticated user: {}", user.id);
        Ok(RequireUser(user))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

fn validate_login(request: &LoginRequest) -> Result<(), ApiError> {
    if request.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email cannot be empty".to_string()));
    }
    if request.email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} bytes",
            MAX_EMAIL_LENGTH
        )));
    }
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} bytes",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    if let Err(e) = validate_login(&request) {
        metrics::counter!("tollgate_login_attempts_total", "outcome" => "invalid").increment(1);
        return Err(e);
    }

    debug!("Login attempt for {}", request.email);

    let user = authenticate_user(&request.email, &request.password, &state.db, &state.hasher).await?;
    let Some(user) = user else {
        metrics::counter!("tollgate_login_attempts_total", "outcome" => "rejected").increment(1);
        return Err(AuthError::InvalidCredentials.into());
    };

    let mut claims = Map::new();
    claims.insert("sub".to_string(), Value::from(user.id.to_string()));
    let ttl = state.session.ttl();
    let token = state.signer.create_token(&claims, ttl)?;

    metrics::counter!("tollgate_login_attempts_total", "outcome" => "success").increment(1);
    info!("User {} logged in successfully", user.id);

    let jar = jar.add(state.session.issue(token));
    Ok((
        jar,
        Json(LoginResponse {
            user: user.into(),
            expires_in: ttl.num_seconds(),
        }),
    ))
}

/// POST /api/v1/auth/logout
async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.remove(state.session.removal()), StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
async fn me(RequireUser(user): RequireUser) -> Json<UserResponse> {
    Json(user.into())
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(me))
}
