//! SQLite schema bootstrap.

use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        parent_id TEXT REFERENCES locations(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_locations_type_parent ON locations (type, parent_id)",
    r#"
    CREATE TABLE IF NOT EXISTS designer_profiles (
        id TEXT PRIMARY KEY,
        name TEXT,
        bio TEXT NOT NULL DEFAULT '',
        services TEXT NOT NULL DEFAULT '{}',
        pricing TEXT NOT NULL DEFAULT '{}',
        price_per_unit REAL NOT NULL DEFAULT 0,
        images TEXT NOT NULL DEFAULT '[]',
        is_approved INTEGER NOT NULL DEFAULT 0,
        styles TEXT NOT NULL DEFAULT '[]',
        room_types TEXT NOT NULL DEFAULT '[]',
        experience_level INTEGER NOT NULL DEFAULT 0,
        rating REAL NOT NULL DEFAULT 0,
        portfolio_types TEXT NOT NULL DEFAULT '[]',
        completed_projects INTEGER NOT NULL DEFAULT 0,
        location_id TEXT REFERENCES locations(id),
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_designer_profiles_location ON designer_profiles (location_id)",
];

/// Create tables and indexes when missing.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("ensure_schema", e))?;
    }
    tracing::debug!(statements = STATEMENTS.len(), "SQLite schema ensured");
    Ok(())
}
