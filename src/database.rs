use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use crate::ent_framework::{create_default_hook_registry, HookRegistry};
use crate::error::{AppError, AppResult};

// Wiki database: SQLx connection pool plus the entity hook registry
#[derive(Clone)]
pub struct WikiDatabase {
    pub pool: SqlitePool, // Public for entity query helpers
    hooks: Arc<HookRegistry>,
}

impl WikiDatabase {
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid database url {}: {}", database_url, e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        // get_filename consumes the options
        let filename = options.clone().get_filename();
        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::DatabaseError(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to {}: {}", database_url, e))
            })?;

        Ok(Self::with_pool(pool))
    }

    /// Single-connection in-memory database; every handle shares the same data.
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::ConfigurationError(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Self::with_pool(pool);
        db.init().await?;
        Ok(db)
    }

    pub fn with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            hooks: Arc::new(create_default_hook_registry()),
        }
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub async fn init(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // tags holds a JSON array of strings
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                url_title TEXT NOT NULL,
                content TEXT NOT NULL,
                status TEXT CHECK (status IN ('open', 'closed')),
                tags TEXT NOT NULL DEFAULT '[]',
                author_id INTEGER REFERENCES users(id),
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_pages_url_title ON pages(url_title)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_pages_author ON pages(author_id)")
            .execute(&self.pool)
            .await?;

        tracing::debug!("wiki schema ready");
        Ok(())
    }

    /// Remove every page and user
    pub async fn truncate(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM pages").execute(&self.pool).await?;
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }
}
