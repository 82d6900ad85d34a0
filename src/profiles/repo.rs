use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{PreferenceProfile, ProfileUpdate};

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<PreferenceProfile>>;
    async fn upsert(&self, user_id: Uuid, update: ProfileUpdate) -> anyhow::Result<PreferenceProfile>;
}

#[derive(Clone)]
pub struct PgProfileRepo {
    db: PgPool,
}

impl PgProfileRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileRepo for PgProfileRepo {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<PreferenceProfile>> {
        let profile = sqlx::query_as::<_, PreferenceProfile>(
            r#"
            SELECT user_id, name, dietary_prefs, allergies, favorite_cuisines, updated_at
              FROM profiles
             WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("select profile")?;
        Ok(profile)
    }

    async fn upsert(&self, user_id: Uuid, update: ProfileUpdate) -> anyhow::Result<PreferenceProfile> {
        let profile = sqlx::query_as::<_, PreferenceProfile>(
            r#"
            INSERT INTO profiles (user_id, name, dietary_prefs, allergies, favorite_cuisines, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (user_id) DO UPDATE
               SET name = EXCLUDED.name,
                   dietary_prefs = EXCLUDED.dietary_prefs,
                   allergies = EXCLUDED.allergies,
                   favorite_cuisines = EXCLUDED.favorite_cuisines,
                   updated_at = EXCLUDED.updated_at
            RETURNING user_id, name, dietary_prefs, allergies, favorite_cuisines, updated_at
            "#,
        )
        .bind(user_id)
        .bind(update.name)
        .bind(update.dietary_prefs)
        .bind(update.allergies)
        .bind(update.favorite_cuisines)
        .fetch_one(&self.db)
        .await
        .context("upsert profile")?;
        Ok(profile)
    }
}

#[cfg(test)]
pub use memory::MemoryProfileRepo;

#[cfg(test)]
mod memory {
    use std::collections::HashMap;

    use time::OffsetDateTime;
    use tokio::sync::RwLock;

    use super::*;

    #[derive(Default)]
    pub struct MemoryProfileRepo {
        rows: RwLock<HashMap<Uuid, PreferenceProfile>>,
        pub fail: bool,
    }

    impl MemoryProfileRepo {
        /// Every call errors, as if the database were down.
        pub fn broken() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ProfileRepo for MemoryProfileRepo {
        async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<PreferenceProfile>> {
            anyhow::ensure!(!self.fail, "profile store unavailable");
            Ok(self.rows.read().await.get(&user_id).cloned())
        }

        async fn upsert(&self, user_id: Uuid, update: ProfileUpdate) -> anyhow::Result<PreferenceProfile> {
            anyhow::ensure!(!self.fail, "profile store unavailable");
            let profile = PreferenceProfile {
                user_id,
                name: update.name,
                dietary_prefs: update.dietary_prefs,
                allergies: update.allergies,
                favorite_cuisines: update.favorite_cuisines,
                updated_at: OffsetDateTime::now_utc(),
            };
            self.rows.write().await.insert(user_id, profile.clone());
            Ok(profile)
        }
    }

    #[tokio::test]
    async fn upsert_replaces_existing_profile() {
        let repo = MemoryProfileRepo::default();
        let user = Uuid::new_v4();
        assert!(repo.get(user).await.unwrap().is_none());

        repo.upsert(user, ProfileUpdate { allergies: vec!["Nuts".into()], ..Default::default() })
            .await
            .unwrap();
        let second = repo
            .upsert(user, ProfileUpdate { dietary_prefs: vec!["Vegan".into()], ..Default::default() })
            .await
            .unwrap();

        assert!(second.allergies.is_empty());
        assert_eq!(repo.get(user).await.unwrap(), Some(second));
    }
}
