use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{error::AppError, state::AppState};

use super::{
    dto::{AuthResponse, Credentials, PublicUser, RefreshRequest},
    extractors::AuthUser,
    jwt::JwtKeys,
    password::{hash_password, is_strong_enough, verify_password},
    repo::is_duplicate_email,
    repo_types::User,
    services::{is_valid_email, issue_tokens, normalize_email},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn credentials(payload: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, AppError> {
    let Json(mut creds) = payload.map_err(|e| {
        warn!(error = %e, "invalid credentials body");
        AppError::Input("Invalid request body".into())
    })?;
    creds.email = normalize_email(&creds.email);
    if !is_valid_email(&creds.email) {
        warn!(email = %creds.email, "invalid email");
        return Err(AppError::Input("Invalid email".into()));
    }
    Ok(creds)
}

/// The pre-check in `register` can lose a race with a concurrent signup, so
/// the unique index has the final word.
fn registration_failed(email: &str, e: anyhow::Error) -> AppError {
    if is_duplicate_email(&e) {
        warn!(%email, "email already registered (insert conflict)");
        return AppError::Conflict("Email already registered");
    }
    error!(error = %e, "create user failed");
    AppError::persistence("Failed to register", e)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let creds = credentials(payload)?;

    if !is_strong_enough(&creds.password) {
        warn!("password too short");
        return Err(AppError::Input("Password too short".into()));
    }

    let existing = User::find_by_email(&state.db, &creds.email)
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_email failed");
            AppError::persistence("Failed to register", e)
        })?;
    if existing.is_some() {
        warn!(email = %creds.email, "email already registered");
        return Err(AppError::Conflict("Email already registered"));
    }

    let hash = hash_password(&creds.password)
        .map_err(|e| AppError::internal("Failed to register", e))?;

    let user = User::create(&state.db, &creds.email, &hash)
        .await
        .map_err(|e| registration_failed(&creds.email, e))?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(issue_tokens(&JwtKeys::from_ref(&state), user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let creds = credentials(payload)?;

    let user = User::find_by_email(&state.db, &creds.email)
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_email failed");
            AppError::persistence("Failed to log in", e)
        })?
        .ok_or_else(|| {
            warn!(email = %creds.email, "login unknown email");
            AppError::Auth("Invalid credentials")
        })?;

    let ok = verify_password(&creds.password, &user.password_hash)
        .map_err(|e| AppError::internal("Failed to log in", e))?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Auth("Invalid credentials"));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&JwtKeys::from_ref(&state), user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "invalid refresh body");
        AppError::Input("Invalid request body".into())
    })?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        AppError::Auth("Invalid or expired token")
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(|e| {
            error!(error = %e, "find_by_id failed");
            AppError::persistence("Failed to refresh token", e)
        })?
        .ok_or(AppError::Auth("User not found"))?;

    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "find_by_id failed");
            AppError::persistence("Failed to load user", e)
        })?
        .ok_or(AppError::Auth("User not found"))?;

    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
    }))
}
