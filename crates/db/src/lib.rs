//! Storage for users, groups, posts, comments and follows.
//!
//! [`init`] opens the pool described by [`DatabaseConfig`] and [`migrate`]
//! brings the schema up to date before the server starts taking requests.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::log::LevelFilter;
use yatube_common::{AppError, DatabaseConfig};

/// Pooled connections are recycled after this long regardless of use.
const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// Pool options for `config`.
#[must_use]
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let timeout = Duration::from_secs(config.connect_timeout_secs);
    let mut opt = ConnectOptions::new(&config.url);

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(MAX_CONNECTION_LIFETIME)
        .sqlx_logging(config.log_statements)
        .sqlx_logging_level(LevelFilter::Debug);
    opt
}

/// Open the connection pool.
pub async fn init(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    let db = Database::connect(connect_options(config))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connected to database"
    );
    Ok(db)
}

/// Apply pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    let pending = migrations::Migrator::get_pending_migrations(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if pending.is_empty() {
        tracing::debug!("Schema is up to date");
        return Ok(());
    }

    for migration in &pending {
        tracing::info!(name = %migration.name(), "Applying migration");
    }
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            url: "postgres://localhost/yatube".to_string(),
            max_connections: 5,
            min_connections: 8,
            connect_timeout_secs: 3,
            idle_timeout_secs: 60,
            log_statements: false,
        }
    }

    #[test]
    fn test_connect_options_follow_config() {
        let opt = connect_options(&config());

        assert_eq!(opt.get_url(), "postgres://localhost/yatube");
        assert_eq!(opt.get_max_connections(), Some(5));
        assert_eq!(opt.get_connect_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(opt.get_acquire_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(opt.get_idle_timeout(), Some(Duration::from_secs(60)));
        assert!(!opt.get_sqlx_logging());
    }

    #[test]
    fn test_min_connections_never_exceed_max() {
        assert_eq!(connect_options(&config()).get_min_connections(), Some(5));
    }
}
