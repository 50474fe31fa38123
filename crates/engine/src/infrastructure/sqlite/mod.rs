//! SQLite adapters.
//!
//! One pool is shared by every repository; the schema is created on connect.

mod designer_repo;
mod location_repo;
mod schema;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::infrastructure::ports::{ClockPort, RepoError};

pub use designer_repo::SqliteDesignerRepo;
pub use location_repo::SqliteLocationRepo;
pub use schema::ensure_schema;

/// All SQLite-backed repositories over one pool.
pub struct SqliteRepositories {
    pub location: Arc<SqliteLocationRepo>,
    pub designer: Arc<SqliteDesignerRepo>,
}

impl SqliteRepositories {
    pub async fn connect(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("connect", e))?;
        ensure_schema(&pool).await?;
        tracing::info!(path = %db_path, "SQLite store ready");

        Ok(Self {
            location: Arc::new(SqliteLocationRepo::new(pool.clone())),
            designer: Arc::new(SqliteDesignerRepo::new(pool, clock)),
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("invalid timestamp '{}': {}", value, e)))
}
