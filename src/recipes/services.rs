use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::profiles::services::AggregatedPreferences;
use crate::state::AppState;

use super::extract::extract_recipe;
use super::prompt::build_request;
use super::repo_types::{Rating, RecipeQuery, RecipeRecord};

/// Trims entries and drops blanks. An empty result is an input error.
pub fn clean_ingredients(raw: Vec<String>) -> Result<Vec<String>, AppError> {
    let cleaned: Vec<String> = raw
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        return Err(AppError::Input("Invalid ingredients".into()));
    }
    Ok(cleaned)
}

/// Generates, validates and stores one recipe for `user_id`.
///
/// Nothing is written unless the model's reply yields a complete recipe.
pub async fn generate_recipe(
    state: &AppState,
    user_id: Uuid,
    ingredients: Vec<String>,
) -> Result<RecipeRecord, AppError> {
    let ingredients = clean_ingredients(ingredients)?;

    let profile = match state.profiles.get(user_id).await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, %user_id, "profile lookup failed; using default preferences");
            None
        }
    };
    let prefs = AggregatedPreferences::from_profile(profile.as_ref());
    let request = build_request(&ingredients, &prefs);

    let reply = state.inference.generate(&request).await.map_err(|e| {
        error!(error = %e, provider = state.inference.name(), "inference call failed");
        AppError::from(e)
    })?;
    if reply.is_prose_only() {
        warn!(len = reply.text.len(), "model reply contains no JSON object");
    }

    let draft = extract_recipe(&reply.text).map_err(|e| {
        let preview: String = reply.text.chars().take(500).collect();
        error!(error = %e, reply = %preview, "recipe extraction failed");
        AppError::from(e)
    })?;

    let record = state
        .recipes
        .create(user_id, ingredients, draft)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "save recipe failed");
            AppError::persistence("Failed to save recipe", e)
        })?;

    info!(%user_id, recipe_id = %record.id, title = %record.recipe_json.title, "recipe generated");
    Ok(record)
}

pub async fn list_recipes(
    state: &AppState,
    user_id: Uuid,
    query: RecipeQuery,
) -> Result<Vec<RecipeRecord>, AppError> {
    state.recipes.list_by_owner(user_id, &query).await.map_err(|e| {
        error!(error = %e, %user_id, "list recipes failed");
        AppError::persistence("Failed to load recipes", e)
    })
}

pub async fn get_recipe(state: &AppState, user_id: Uuid, id: Uuid) -> Result<RecipeRecord, AppError> {
    state
        .recipes
        .get(id, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, %id, "get recipe failed");
            AppError::persistence("Failed to load recipe", e)
        })?
        .ok_or(AppError::NotFound("Recipe not found"))
}

pub async fn rate_recipe(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    rating: i64,
) -> Result<(), AppError> {
    let rating = Rating::try_from(rating)
        .map_err(|r| AppError::Input(format!("Rating must be between 1 and 5, got {r}")))?;

    let updated = state
        .recipes
        .update_rating(id, user_id, rating)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, %id, "rate recipe failed");
            AppError::persistence("Failed to rate recipe", e)
        })?;
    if !updated {
        warn!(%user_id, %id, "rating matched no owned recipe");
        return Err(AppError::NotFound("Recipe not found"));
    }
    info!(%user_id, %id, rating = rating.get(), "recipe rated");
    Ok(())
}

pub async fn delete_recipe(state: &AppState, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let deleted = state.recipes.delete(id, user_id).await.map_err(|e| {
        error!(error = %e, %user_id, %id, "delete recipe failed");
        AppError::persistence("Failed to delete recipe", e)
    })?;
    if !deleted {
        warn!(%user_id, %id, "delete matched no owned recipe");
        return Err(AppError::NotFound("Recipe not found"));
    }
    info!(%user_id, %id, "recipe deleted");
    Ok(())
}
