use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::PreferenceProfile;

/// Body of `PUT /profile`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub dietary_prefs: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub favorite_cuisines: Vec<String>,
    pub custom_allergies: Option<String>, // comma separated, merged into allergies
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: Option<String>,
    pub dietary_prefs: Vec<String>,
    pub allergies: Vec<String>,
    pub favorite_cuisines: Vec<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl ProfileResponse {
    pub fn empty() -> Self {
        Self {
            name: None,
            dietary_prefs: Vec::new(),
            allergies: Vec::new(),
            favorite_cuisines: Vec::new(),
            updated_at: None,
        }
    }
}

impl From<PreferenceProfile> for ProfileResponse {
    fn from(p: PreferenceProfile) -> Self {
        Self {
            name: p.name,
            dietary_prefs: p.dietary_prefs,
            allergies: p.allergies,
            favorite_cuisines: p.favorite_cuisines,
            updated_at: Some(p.updated_at),
        }
    }
}
