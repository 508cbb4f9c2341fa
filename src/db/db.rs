// db/db.rs
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::config::Config;

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .field("closed", &self.pool.is_closed())
            .finish()
    }
}

/// Result of the startup database probe.
#[derive(Debug, Serialize)]
pub struct ConnectionCheck {
    pub now: DateTime<Utc>,
    pub property_table_exists: bool,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    /// Opens the PostgreSQL pool described by `config`.
    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.query_timeout_secs))
            .connect(&config.database_url)
            .await?;

        tracing::info!(
            "✅ Connection to the database is successful (max connections: {})",
            config.max_connections
        );
        Ok(DBClient::new(pool))
    }

    /// Waits for checked-out connections to be returned, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    pub async fn check_connection(&self) -> Result<ConnectionCheck, sqlx::Error> {
        let now: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
            .fetch_one(&self.pool)
            .await?;

        let property_table_exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = 'public'
                AND table_name = 'property'
            )
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ConnectionCheck {
            now,
            property_table_exists,
        })
    }
}
