use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Stored preferences of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PreferenceProfile {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub dietary_prefs: Vec<String>,   // e.g. "Vegetarian", "Keto"
    pub allergies: Vec<String>,       // must-avoid ingredients
    pub favorite_cuisines: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Normalized profile write: tags trimmed, blank-free and de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub dietary_prefs: Vec<String>,
    pub allergies: Vec<String>,
    pub favorite_cuisines: Vec<String>,
}
