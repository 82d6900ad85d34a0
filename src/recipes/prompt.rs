use crate::inference::InferenceRequest;
use crate::profiles::services::AggregatedPreferences;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful chef assistant. Always respond with valid JSON only.";

const RESPONSE_SHAPE: &str = r#"{
  "title": "Recipe name",
  "description": "Brief description",
  "ingredients": ["ingredient 1 with quantity", "ingredient 2"],
  "instructions": ["Step 1", "Step 2"],
  "prep_time": "time in minutes"
}"#;

/// Builds the generation request for `ingredients` under the user's
/// preferences. Text is passed through as-is; the prompt is natural language,
/// not code.
pub fn build_request(ingredients: &[String], prefs: &AggregatedPreferences) -> InferenceRequest {
    let ingredients = ingredients.join(", ");

    let allergy_line = if prefs.has_allergies() {
        format!("Allergies (MUST AVOID): {}", prefs.allergies)
    } else {
        format!("Allergies: {}", prefs.allergies)
    };

    let prompt = format!(
        "Create a recipe using these ingredients: {ingredients}.\n\
         \n\
         Requirements:\n\
         - Use only the provided ingredients (salt, pepper, oil and water may be added)\n\
         - Dietary restrictions: {dietary}\n\
         - {allergy_line}\n\
         - Cuisine: {cuisines}\n\
         \n\
         Return ONLY this JSON format (no other text):\n\
         {RESPONSE_SHAPE}",
        dietary = prefs.dietary_prefs,
        cuisines = prefs.favorite_cuisines,
    );

    InferenceRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt,
        ingredients,
        dietary_prefs: prefs.dietary_prefs.clone(),
        allergies: prefs.allergies.clone(),
        favorite_cuisines: prefs.favorite_cuisines.clone(),
    }
}
