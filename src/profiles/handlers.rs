use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{auth::extractors::AuthUser, error::AppError, state::AppState};

use super::{
    dto::{ProfileResponse, UpdateProfileRequest},
    services::build_update,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.profiles.get(user_id).await.map_err(|e| {
        error!(error = %e, %user_id, "load profile failed");
        AppError::persistence("Failed to load profile", e)
    })?;
    Ok(Json(profile.map_or_else(ProfileResponse::empty, Into::into)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "invalid profile body");
        AppError::Input("Invalid profile".into())
    })?;

    let update = build_update(payload);
    let profile = state.profiles.upsert(user_id, update).await.map_err(|e| {
        error!(error = %e, %user_id, "upsert profile failed");
        AppError::persistence("Failed to update profile", e)
    })?;

    info!(%user_id, "profile updated");
    Ok(Json(profile.into()))
}
