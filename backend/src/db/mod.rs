pub mod comments;
pub mod posts;
pub mod profiles;
pub mod reactions;
pub mod users;

use crate::config::AppConfig;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

// Setup the database and execute any migrations
pub async fn setup_database(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        // In-memory databases vanish with their last connection.
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Migrations executed");
    }

    Ok(pool)
}
