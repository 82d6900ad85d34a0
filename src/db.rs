use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Applies `./migrations`. A failure is logged and startup continues, so a
/// database managed out of band still works.
pub async fn migrate(db: &PgPool) {
    match sqlx::migrate!("./migrations").run(db).await {
        Ok(()) => info!("migrations applied"),
        Err(e) => warn!(error = %e, "migration failed; continuing"),
    }
}
