use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the data store, with integrity violations already classified
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated on {field}")]
    UniqueViolation { field: String, message: String },

    #[error("Foreign key violated on {field}")]
    ForeignKeyViolation { field: String },

    #[error(transparent)]
    Sqlx(sqlx::Error),

    #[error(transparent)]
    Migration(#[from] MigrateError),
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        let (code, constraint) = match &err {
            sqlx::Error::Database(db_err) => (
                db_err.code().map(|c| c.into_owned()),
                db_err.constraint().map(str::to_string),
            ),
            _ => return DatabaseError::Sqlx(err),
        };

        match (code.as_deref(), constraint.as_deref()) {
            (Some(UNIQUE_VIOLATION), Some("users_username_key")) => DatabaseError::UniqueViolation {
                field: "username".to_string(),
                message: "A user with that username already exists.".to_string(),
            },
            (Some(FOREIGN_KEY_VIOLATION), Some(constraint)) => DatabaseError::ForeignKeyViolation {
                field: foreign_key_field(constraint).to_string(),
            },
            _ => DatabaseError::Sqlx(err),
        }
    }
}

/// Map a foreign key constraint name to the wire field it guards
fn foreign_key_field(constraint: &str) -> &'static str {
    match constraint {
        "messages_chat_id_fkey" => "chat",
        _ => "user",
    }
}

/// Connection pool construction and store-wide maintenance
pub struct DatabaseManager;

impl DatabaseManager {
    /// Build the shared pool from DATABASE_URL. Connections are opened lazily
    /// so the server can start before the store is reachable.
    pub fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = Self::database_url()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&url)?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    fn database_url() -> Result<String, DatabaseError> {
        let raw = std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let url = url::Url::parse(&raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url.into()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
