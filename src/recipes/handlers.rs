use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{auth::extractors::AuthUser, error::AppError, state::AppState};

use super::{
    dto::{Ack, GenerateRecipeRequest, ListParams, RateRecipeRequest},
    repo_types::RecipeRecord,
    services,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe).delete(delete_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/generate", post(generate_recipe))
        .route("/recipes/:id/rating", put(rate_recipe))
}

fn recipe_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id).map_err(|e| {
        warn!(error = %e, "invalid recipe id");
        AppError::Input("Invalid recipe id".into())
    })
}

/// POST /recipes/generate { ingredients: ["eggs", "spinach"] }
#[instrument(skip(state, payload))]
pub async fn generate_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<GenerateRecipeRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<RecipeRecord>), AppError> {
    let Json(body) = payload.map_err(|e| {
        warn!(error = %e, "invalid generate body");
        AppError::Input("Invalid ingredients".into())
    })?;

    let record = services::generate_recipe(&state, user_id, body.ingredients).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/recipes/{}", record.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(record)))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<ListParams>,
) -> Result<Json<Vec<RecipeRecord>>, AppError> {
    let records = services::list_recipes(&state, user_id, p.into()).await?;
    Ok(Json(records))
}

#[instrument(skip(state, path))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RecipeRecord>, AppError> {
    let id = recipe_id(path)?;
    Ok(Json(services::get_recipe(&state, user_id, id).await?))
}

/// PUT /recipes/:id/rating { rating: 1..=5 }
#[instrument(skip(state, path, payload))]
pub async fn rate_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RateRecipeRequest>, JsonRejection>,
) -> Result<Json<Ack>, AppError> {
    let id = recipe_id(path)?;
    let Json(body) = payload.map_err(|e| {
        warn!(error = %e, "invalid rating body");
        AppError::Input("Invalid rating".into())
    })?;
    services::rate_recipe(&state, user_id, id, body.rating).await?;
    Ok(Json(Ack { success: true }))
}

#[instrument(skip(state, path))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ack>, AppError> {
    let id = recipe_id(path)?;
    services::delete_recipe(&state, user_id, id).await?;
    Ok(Json(Ack { success: true }))
}
