use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// True when `err` came from an insert that hit the unique email index, e.g.
/// a concurrent registration that won the race.
pub fn is_duplicate_email(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => {
            db.is_unique_violation()
                && db.constraint().map_or(true, |c| c == EMAIL_UNIQUE_CONSTRAINT)
        }
        _ => false,
    }
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
              FROM users
             WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .context("insert user")?;
        Ok(user)
    }
}

/// Hand-built database errors for exercising the conflict mapping.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::{borrow::Cow, error::Error as StdError, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    #[derive(Debug)]
    struct Violation {
        unique: bool,
        constraint: &'static str,
    }

    impl fmt::Display for Violation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violates constraint {}", self.constraint)
        }
    }

    impl StdError for Violation {}

    impl DatabaseError for Violation {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(if self.unique { "23505" } else { "23514" }))
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::CheckViolation
            }
        }
    }

    /// What `User::create` returns when the insert trips `constraint`.
    pub(crate) fn insert_failure(unique: bool, constraint: &'static str) -> anyhow::Error {
        anyhow::Error::from(sqlx::Error::Database(Box::new(Violation { unique, constraint })))
            .context("insert user")
    }
}
