use serde::Serialize;
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use super::extract::RecipeDraft;

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ingredients_used: Vec<String>,
    pub recipe_json: Json<RecipeDraft>,
    pub rating: Option<i16>,
    pub created_at: OffsetDateTime,
}

/// A validated recipe owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ingredients_used: Vec<String>, // as submitted
    pub recipe_json: RecipeDraft,
    pub rating: Option<i16>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<RecipeRow> for RecipeRecord {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            ingredients_used: r.ingredients_used,
            recipe_json: r.recipe_json.0,
            rating: r.rating,
            created_at: r.created_at,
        }
    }
}

/// A star rating, 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(i16);

impl Rating {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 5;

    pub fn get(self) -> i16 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as i16))
        } else {
            Err(value)
        }
    }
}

/// Filter and page for listing a user's recipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeQuery {
    pub q: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for RecipeQuery {
    fn default() -> Self {
        Self {
            q: None,
            limit: 20,
            offset: 0,
        }
    }
}

impl RecipeQuery {
    /// Case-insensitive match on title, ingredients and instructions. Mirrors
    /// the ILIKE filter in `PgRecipeRepo::list_by_owner`.
    #[cfg(test)]
    pub fn matches(&self, record: &RecipeRecord) -> bool {
        let Some(q) = self.q.as_deref() else {
            return true;
        };
        let q = q.to_lowercase();
        let draft = &record.recipe_json;
        draft.title.to_lowercase().contains(&q)
            || draft.ingredients.iter().any(|i| i.to_lowercase().contains(&q))
            || draft.instructions.iter().any(|i| i.to_lowercase().contains(&q))
    }
}
