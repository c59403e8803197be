//! Test utilities for database operations.
//!
//! Integration tests connect to a throwaway PostgreSQL database, run the
//! migrations and seed rows through the fixture helpers below. Connection
//! settings come from the `TEST_DB_*` environment variables.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{follow, group, post, user};
use crate::migrations::Migrator;

/// Tables truncated by [`TestDatabase::cleanup`], children first.
const TABLES: [&str; 5] = ["comment", "follow", "post", "group", "user"];

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "yatube_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "yatube_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "yatube_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Get URL for connecting to the `postgres` maintenance database.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the configured test database and run migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and run migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self { conn, config })
    }

    /// Create a freshly named database (for parallel tests).
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let unique_suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("yatube_test_{}", &unique_suffix[..8]);

        let postgres_conn = Database::connect(&config.postgres_url()).await?;
        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        postgres_conn.close().await?;

        info!(database = %config.database, "Created unique test database");

        Self::with_config(config).await
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Remove every row from the application tables.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        for table in TABLES {
            self.conn
                .execute(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("TRUNCATE TABLE \"{table}\" CASCADE"),
                ))
                .await?;
        }

        info!("Cleaned up test database");
        Ok(())
    }

    /// Drop the database. Consumes `self` to close the connection first.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close().await?;

        let postgres_conn = Database::connect(&self.config.postgres_url()).await?;

        // Best effort: other pooled connections may still be open.
        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                    self.config.database
                ),
            ))
            .await
            .ok();

        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database),
            ))
            .await?;
        postgres_conn.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }

    // ==================== Fixtures ====================

    /// Insert a user with a placeholder password hash.
    pub async fn insert_user(&self, id: &str, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(username.to_string()),
            name: Set(None),
            password: Set("!".to_string()),
            token: Set(None),
            is_admin: Set(false),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.conn)
        .await
    }

    /// Insert a group.
    pub async fn insert_group(&self, id: &str, slug: &str) -> Result<group::Model, DbErr> {
        group::ActiveModel {
            id: Set(id.to_string()),
            title: Set(format!("Group {slug}")),
            slug: Set(slug.to_string()),
            description: Set(String::new()),
        }
        .insert(&self.conn)
        .await
    }

    /// Insert a post, optionally filed under a group.
    pub async fn insert_post(
        &self,
        id: &str,
        author_id: &str,
        group_id: Option<&str>,
        text: &str,
    ) -> Result<post::Model, DbErr> {
        post::ActiveModel {
            id: Set(id.to_string()),
            text: Set(text.to_string()),
            author_id: Set(author_id.to_string()),
            group_id: Set(group_id.map(ToString::to_string)),
            image: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.conn)
        .await
    }

    /// Insert the edge `user_id -> author_id`.
    pub async fn insert_follow(
        &self,
        id: &str,
        user_id: &str,
        author_id: &str,
    ) -> Result<follow::Model, DbErr> {
        follow::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(user_id.to_string()),
            author_id: Set(author_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.conn)
        .await
    }
}
