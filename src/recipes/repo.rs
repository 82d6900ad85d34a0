use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::extract::RecipeDraft;
use super::repo_types::{Rating, RecipeQuery, RecipeRecord, RecipeRow};

/// Owner-scoped recipe storage. Every read and write is filtered by both
/// record id and owner, so a foreign id behaves exactly like a missing one.
#[async_trait]
pub trait RecipeRepo: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        ingredients: Vec<String>,
        draft: RecipeDraft,
    ) -> anyhow::Result<RecipeRecord>;

    /// Newest first.
    async fn list_by_owner(&self, user_id: Uuid, query: &RecipeQuery) -> anyhow::Result<Vec<RecipeRecord>>;

    async fn get(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<RecipeRecord>>;

    /// Returns `false` when no row matched (unknown id or not the owner).
    async fn update_rating(&self, id: Uuid, user_id: Uuid, rating: Rating) -> anyhow::Result<bool>;

    /// Returns `false` when no row matched (unknown id, not the owner, or already deleted).
    async fn delete(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgRecipeRepo {
    db: PgPool,
}

impl PgRecipeRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl RecipeRepo for PgRecipeRepo {
    async fn create(
        &self,
        user_id: Uuid,
        ingredients: Vec<String>,
        draft: RecipeDraft,
    ) -> anyhow::Result<RecipeRecord> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            INSERT INTO recipes (id, user_id, ingredients_used, recipe_json)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, ingredients_used, recipe_json, rating, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(ingredients)
        .bind(Json(draft))
        .fetch_one(&self.db)
        .await
        .context("insert recipe")?;
        Ok(row.into())
    }

    async fn list_by_owner(&self, user_id: Uuid, query: &RecipeQuery) -> anyhow::Result<Vec<RecipeRecord>> {
        let pattern = query.q.as_deref().map(like_pattern);
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, user_id, ingredients_used, recipe_json, rating, created_at
              FROM recipes
             WHERE user_id = $1
               AND ($2::text IS NULL
                    OR recipe_json->>'title' ILIKE $2
                    OR (recipe_json->'ingredients')::text ILIKE $2
                    OR (recipe_json->'instructions')::text ILIKE $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(pattern)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.db)
        .await
        .context("list recipes by owner")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<RecipeRecord>> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, user_id, ingredients_used, recipe_json, rating, created_at
              FROM recipes
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get recipe")?;
        Ok(row.map(Into::into))
    }

    async fn update_rating(&self, id: Uuid, user_id: Uuid, rating: Rating) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE recipes
               SET rating = $1
             WHERE id = $2 AND user_id = $3
            "#,
        )
        .bind(rating.get())
        .bind(id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .context("update recipe rating")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM recipes WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete recipe")?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub use memory::MemoryRecipeRepo;


#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> RecipeDraft {
        RecipeDraft {
            title: title.into(),
            description: "desc".into(),
            ingredients: vec!["1 cup rice".into()],
            instructions: vec!["Boil water".into(), "Add rice".into()],
            prep_time: "20 minutes".into(),
        }
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("egg"), "%egg%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[tokio::test]
    async fn new_records_start_unrated() {
        let repo = MemoryRecipeRepo::default();
        let record = repo
            .create(Uuid::new_v4(), vec!["rice".into()], draft("Rice"))
            .await
            .unwrap();
        assert_eq!(record.rating, None);
        assert_eq!(record.ingredients_used, vec!["rice".to_string()]);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_owner_scoped() {
        let repo = MemoryRecipeRepo::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        repo.create(alice, vec![], draft("first")).await.unwrap();
        repo.create(bob, vec![], draft("bob's")).await.unwrap();
        repo.create(alice, vec![], draft("second")).await.unwrap();

        let titles: Vec<String> = repo
            .list_by_owner(alice, &RecipeQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.recipe_json.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn list_filters_and_pages() {
        let repo = MemoryRecipeRepo::default();
        let user = Uuid::new_v4();
        repo.create(user, vec![], draft("Tomato Soup")).await.unwrap();
        repo.create(user, vec![], draft("Fried Rice")).await.unwrap();
        repo.create(user, vec![], draft("Tomato Salad")).await.unwrap();

        let query = RecipeQuery { q: Some("TOMATO".into()), ..Default::default() };
        assert_eq!(repo.list_by_owner(user, &query).await.unwrap().len(), 2);

        let query = RecipeQuery { q: Some("boil".into()), limit: 1, offset: 1 };
        let page = repo.list_by_owner(user, &query).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].recipe_json.title, "Fried Rice");
    }

    #[tokio::test]
    async fn rating_by_non_owner_touches_nothing() {
        let repo = MemoryRecipeRepo::default();
        let owner = Uuid::new_v4();
        let record = repo.create(owner, vec![], draft("Mine")).await.unwrap();
        let four = Rating::try_from(4_i64).unwrap();

        assert!(!repo.update_rating(record.id, Uuid::new_v4(), four).await.unwrap());
        assert_eq!(repo.get(record.id, owner).await.unwrap().unwrap().rating, None);

        assert!(repo.update_rating(record.id, owner, four).await.unwrap());
        assert!(repo.update_rating(record.id, owner, Rating::try_from(2_i64).unwrap()).await.unwrap());
        assert_eq!(repo.get(record.id, owner).await.unwrap().unwrap().rating, Some(2));
    }

    #[tokio::test]
    async fn delete_is_owner_scoped_and_not_repeatable() {
        let repo = MemoryRecipeRepo::default();
        let owner = Uuid::new_v4();
        let record = repo.create(owner, vec![], draft("Mine")).await.unwrap();

        assert!(!repo.delete(record.id, Uuid::new_v4()).await.unwrap());
        assert_eq!(repo.len().await, 1);

        assert!(repo.delete(record.id, owner).await.unwrap());
        assert!(!repo.delete(record.id, owner).await.unwrap());
        assert!(repo.get(record.id, owner).await.unwrap().is_none());
    }
}
