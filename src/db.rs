use diesel::{prelude::*, r2d2};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::config::Config;
use crate::errors::ServiceError;

pub type DbPool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn initialize_db_pool(config: &Config) -> Result<DbPool, ServiceError> {
    let manager = r2d2::ConnectionManager::<PgConnection>::new(config.database_url.as_str());
    let pool = r2d2::Pool::builder().max_size(config.pool_size).build(manager)?;
    Ok(pool)
}

/// Applies any embedded migrations the database has not seen yet.
pub fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| ServiceError::Internal(format!("Migration error: {}", e)))?;
    for version in applied {
        log::info!("applied migration {}", version);
    }
    Ok(())
}
