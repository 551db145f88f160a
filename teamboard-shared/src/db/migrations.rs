/// Schema migrations
///
/// Migration files live in `teamboard-shared/migrations/` and are embedded at
/// compile time with `sqlx::migrate!`, so the binary carries its own schema.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Applies every migration that has not run yet
///
/// # Errors
///
/// Returns an error if a migration fails; sqlx rolls that migration back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(
        embedded = embedded_migration_count(),
        "Starting database migrations"
    );

    match sqlx::migrate!().run(pool).await {
        Ok(()) => {
            info!("Database migrations completed");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Number of migrations compiled into this build
pub fn embedded_migration_count() -> usize {
    sqlx::migrate!().iter().count()
}

/// Creates the database named in `database_url` if it is missing
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
    } else {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_migration_is_embedded() {
        assert!(embedded_migration_count() >= 1);
    }
}
