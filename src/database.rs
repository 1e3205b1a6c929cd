//! PostgreSQL connection pool.
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Postgres;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "roster";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Pool shared by every repository.
#[derive(Clone)]
pub struct Database {
    pub postgres: PgPool,
}

impl Database {
    /// Init database connections.
    pub async fn new(
        hostname: &str,
        username: &str,
        password: &str,
        db: &str,
        pool: u32,
    ) -> Result<Self, sqlx::Error> {
        let addr = format!("postgres://{username}:{password}@{hostname}/{db}");
        let pool = PgPoolOptions::new().max_connections(pool);
        let postgres = pool.connect(&addr).await?;

        tracing::info!(%hostname, %db, "postgres connected");

        Ok(Self { postgres })
    }

    /// Connect using the `postgres` configuration entry, filling defaults.
    pub async fn from_config(config: &Postgres) -> Result<Self, sqlx::Error> {
        Self::new(
            &config.address,
            config.username.as_deref().unwrap_or(DEFAULT_CREDENTIALS),
            config.password.as_deref().unwrap_or(DEFAULT_CREDENTIALS),
            config.database.as_deref().unwrap_or(DEFAULT_DATABASE_NAME),
            config.pool_size.unwrap_or(DEFAULT_POOL_SIZE),
        )
        .await
    }

    /// Apply pending `migrations/` scripts.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.postgres).await
    }
}
