//! SQLite location repository.

use async_trait::async_trait;
use roomcraft_domain::{Location, LocationId, LocationLevel, LocationName};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::parse_timestamp;
use crate::infrastructure::ports::{LocationRepo, RepoError};

const LOCATION_COLUMNS: &str = "id, name, type, parent_id, created_at, updated_at";

pub struct SqliteLocationRepo {
    pool: SqlitePool,
}

impl SqliteLocationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_location(row: &SqliteRow) -> Result<Location, RepoError> {
        let get = |column: &str| -> Result<String, RepoError> {
            row.try_get::<String, _>(column)
                .map_err(|e| RepoError::database("decode_location", e))
        };

        let id: LocationId = get("id")?
            .parse()
            .map_err(RepoError::serialization)?;
        let name = LocationName::new(get("name")?).map_err(RepoError::serialization)?;
        let level: LocationLevel = get("type")?
            .parse()
            .map_err(RepoError::serialization)?;
        let parent_id = row
            .try_get::<Option<String>, _>("parent_id")
            .map_err(|e| RepoError::database("decode_location", e))?
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<LocationId>())
            .transpose()
            .map_err(RepoError::serialization)?;

        Ok(Location {
            id,
            name,
            level,
            parent_id,
            created_at: parse_timestamp(&get("created_at")?)?,
            updated_at: parse_timestamp(&get("updated_at")?)?,
        })
    }
}

#[async_trait]
impl LocationRepo for SqliteLocationRepo {
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, RepoError> {
        let sql = format!("SELECT {} FROM locations WHERE id = ?", LOCATION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("get_location", e))?;

        row.as_ref().map(Self::row_to_location).transpose()
    }

    async fn list_locations(
        &self,
        level: LocationLevel,
        parent_id: Option<LocationId>,
    ) -> Result<Vec<Location>, RepoError> {
        // lower() so rows written with legacy casing still match the canonical form
        let mut sql = format!(
            "SELECT {} FROM locations WHERE lower(type) = ?",
            LOCATION_COLUMNS
        );
        if parent_id.is_some() {
            sql.push_str(" AND parent_id = ?");
        }
        sql.push_str(" ORDER BY name");

        let mut query = sqlx::query(&sql).bind(level.as_str());
        if let Some(parent_id) = parent_id {
            query = query.bind(parent_id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("list_locations", e))?;

        rows.iter().map(Self::row_to_location).collect()
    }

    async fn save_location(&self, location: &Location) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, name, type, parent_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                type = excluded.type,
                parent_id = excluded.parent_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(location.id.to_string())
        .bind(location.name.as_str())
        .bind(location.level.as_str())
        .bind(location.parent_id.map(|id| id.to_string()))
        .bind(location.created_at.to_rfc3339())
        .bind(location.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("save_location", e))?;

        Ok(())
    }
}
