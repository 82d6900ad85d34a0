use serde::{Deserialize, Serialize};

use super::repo_types::RecipeQuery;

#[derive(Debug, Deserialize)]
pub struct GenerateRecipeRequest {
    pub ingredients: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RateRecipeRequest {
    pub rating: i64,
}

/// Outcome of a rating or delete.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl From<ListParams> for RecipeQuery {
    fn from(p: ListParams) -> Self {
        Self {
            q: p.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
            limit: p.limit.clamp(1, 100),
            offset: p.offset.max(0),
        }
    }
}
