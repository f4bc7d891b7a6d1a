//! Database connection utilities.

use crate::DatabaseResult;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use rolebot_error::{DatabaseError, DatabaseErrorKind};
use tracing::info;

/// Connection pool used by the store.
pub type DbPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Read the connection string from the `DATABASE_URL` environment variable.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is not set.
pub fn database_url_from_env() -> DatabaseResult<String> {
    std::env::var("DATABASE_URL").map_err(|_| {
        DatabaseError::new(DatabaseErrorKind::Connection(
            "DATABASE_URL environment variable not set".to_string(),
        ))
    })
}

/// Build a connection pool and verify that one connection can be opened.
///
/// # Errors
///
/// Returns an error if the pool cannot reach the database.
pub fn establish_pool(database_url: &str) -> DatabaseResult<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder().build(manager)?;
    info!(max_size = pool.max_size(), "Database pool ready");
    Ok(pool)
}

/// Apply any pending embedded migrations.
///
/// # Errors
///
/// Returns an error if a connection cannot be checked out or a migration fails.
pub fn run_migrations(pool: &DbPool) -> DatabaseResult<usize> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))?;
    for version in &applied {
        info!(%version, "Applied migration");
    }
    Ok(applied.len())
}
