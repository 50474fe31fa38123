//! SQLite designer profile repository.
//!
//! List-valued fields are stored as JSON arrays and filtered with
//! `json_each`; the location predicate expands the chosen location's subtree
//! with a recursive CTE.

use std::sync::Arc;

use async_trait::async_trait;
use roomcraft_domain::{
    Designer, DesignerFilter, DesignerId, DesignerName, LocationId, ValueRange,
};
use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::infrastructure::ports::{ClockPort, DesignerRepo, RepoError};

const DESIGNER_COLUMNS: &str = "d.id, d.name, d.bio, d.services, d.pricing, d.images, \
     d.is_approved, d.styles, d.room_types, d.experience_level, d.rating, \
     d.portfolio_types, d.completed_projects, d.location_id";

pub struct SqliteDesignerRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

/// A positional parameter collected while composing a search.
#[derive(Debug, Clone, PartialEq)]
enum Param {
    Text(String),
    Real(f64),
    Int(i64),
}

/// SQL text plus its parameters, in bind order.
#[derive(Debug, Default)]
struct SearchQuery {
    sql: String,
    params: Vec<Param>,
}

impl SearchQuery {
    fn build(filter: &DesignerFilter) -> Self {
        let mut prefix = String::new();
        let mut clauses = vec!["d.is_approved = 1".to_string()];
        let mut params = Vec::new();

        if let Some(location_id) = filter.location_id {
            // UNION (not UNION ALL) terminates even on a corrupted, cyclic tree
            prefix.push_str(
                "WITH RECURSIVE scope(id) AS (\
                 SELECT ? UNION \
                 SELECT l.id FROM locations l JOIN scope s ON l.parent_id = s.id) ",
            );
            params.push(Param::Text(location_id.to_string()));
            clauses.push("d.location_id IN (SELECT id FROM scope)".to_string());
        }

        if !filter.styles.is_empty() {
            clauses.push(any_of_clause("d.styles", filter.styles.len()));
            params.extend(filter.styles.iter().map(|s| Param::Text(s.as_str().to_string())));
        }
        if !filter.room_types.is_empty() {
            clauses.push(any_of_clause("d.room_types", filter.room_types.len()));
            params.extend(
                filter
                    .room_types
                    .iter()
                    .map(|r| Param::Text(r.as_str().to_string())),
            );
        }

        push_range(&mut clauses, &mut params, "d.price_per_unit", filter.price, Param::Real);
        push_range(&mut clauses, &mut params, "d.rating", filter.rating, Param::Real);
        push_range(
            &mut clauses,
            &mut params,
            "d.experience_level",
            filter.experience,
            |v| Param::Int(i64::from(v)),
        );
        push_range(
            &mut clauses,
            &mut params,
            "d.completed_projects",
            filter.completed_projects,
            |v| Param::Int(i64::from(v)),
        );

        let sql = format!(
            "{}SELECT {} FROM designer_profiles d WHERE {} ORDER BY d.rating DESC, d.name ASC",
            prefix,
            DESIGNER_COLUMNS,
            clauses.join(" AND ")
        );
        Self { sql, params }
    }
}

fn any_of_clause(column: &str, count: usize) -> String {
    let placeholders = vec!["?"; count].join(", ");
    format!(
        "EXISTS (SELECT 1 FROM json_each({}) WHERE json_each.value IN ({}))",
        column, placeholders
    )
}

fn push_range<T: PartialOrd + Copy>(
    clauses: &mut Vec<String>,
    params: &mut Vec<Param>,
    column: &str,
    range: ValueRange<T>,
    to_param: impl Fn(T) -> Param,
) {
    if let Some(min) = range.min {
        clauses.push(format!("{} >= ?", column));
        params.push(to_param(min));
    }
    if let Some(max) = range.max {
        clauses.push(format!("{} <= ?", column));
        params.push(to_param(max));
    }
}

fn decode_json<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, RepoError> {
    let raw: String = row
        .try_get(column)
        .map_err(|e| RepoError::database("decode_designer", e))?;
    serde_json::from_str(&raw)
        .map_err(|e| RepoError::serialization(format!("column {}: {}", column, e)))
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, RepoError> {
    serde_json::to_string(value).map_err(RepoError::serialization)
}

impl SqliteDesignerRepo {
    pub fn new(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Self {
        Self { pool, clock }
    }

    fn row_to_designer(row: &SqliteRow) -> Result<Designer, RepoError> {
        let db = |e: sqlx::Error| RepoError::database("decode_designer", e);

        let id: DesignerId = row
            .try_get::<String, _>("id")
            .map_err(db)?
            .parse()
            .map_err(RepoError::serialization)?;
        let name: Option<String> = row.try_get("name").map_err(db)?;
        let location_id = row
            .try_get::<Option<String>, _>("location_id")
            .map_err(db)?
            .map(|s| s.parse::<LocationId>())
            .transpose()
            .map_err(RepoError::serialization)?;
        let experience: i64 = row.try_get("experience_level").map_err(db)?;
        let completed: i64 = row.try_get("completed_projects").map_err(db)?;

        Ok(Designer {
            id,
            name: DesignerName::or_placeholder(name.as_deref()),
            bio: row.try_get("bio").map_err(db)?,
            services: decode_json(row, "services")?,
            pricing: decode_json(row, "pricing")?,
            images: decode_json(row, "images")?,
            is_approved: row.try_get("is_approved").map_err(db)?,
            styles: decode_json(row, "styles")?,
            room_types: decode_json(row, "room_types")?,
            experience_level: u32::try_from(experience).map_err(RepoError::serialization)?,
            rating: row.try_get("rating").map_err(db)?,
            portfolio_types: decode_json(row, "portfolio_types")?,
            completed_projects: u32::try_from(completed).map_err(RepoError::serialization)?,
            location_id,
        })
    }
}

#[async_trait]
impl DesignerRepo for SqliteDesignerRepo {
    async fn get_designer(&self, id: DesignerId) -> Result<Option<Designer>, RepoError> {
        let sql = format!(
            "SELECT {} FROM designer_profiles d WHERE d.id = ?",
            DESIGNER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("get_designer", e))?;

        row.as_ref().map(Self::row_to_designer).transpose()
    }

    async fn search_designers(&self, filter: &DesignerFilter) -> Result<Vec<Designer>, RepoError> {
        let search = SearchQuery::build(filter);
        tracing::debug!(params = search.params.len(), "Searching designers");

        let mut query = sqlx::query(&search.sql);
        for param in &search.params {
            query = match param {
                Param::Text(s) => query.bind(s.clone()),
                Param::Real(v) => query.bind(*v),
                Param::Int(v) => query.bind(*v),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("search_designers", e))?;

        rows.iter().map(Self::row_to_designer).collect()
    }

    async fn save_designer(&self, designer: &Designer) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO designer_profiles (
                id, name, bio, services, pricing, price_per_unit, images, is_approved,
                styles, room_types, experience_level, rating, portfolio_types,
                completed_projects, location_id, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                bio = excluded.bio,
                services = excluded.services,
                pricing = excluded.pricing,
                price_per_unit = excluded.price_per_unit,
                images = excluded.images,
                is_approved = excluded.is_approved,
                styles = excluded.styles,
                room_types = excluded.room_types,
                experience_level = excluded.experience_level,
                rating = excluded.rating,
                portfolio_types = excluded.portfolio_types,
                completed_projects = excluded.completed_projects,
                location_id = excluded.location_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(designer.id.to_string())
        .bind(designer.name.as_str())
        .bind(designer.bio.as_str())
        .bind(encode_json(&designer.services)?)
        .bind(encode_json(&designer.pricing)?)
        .bind(designer.pricing.price_per_unit)
        .bind(encode_json(&designer.images)?)
        .bind(designer.is_approved)
        .bind(encode_json(&designer.styles)?)
        .bind(encode_json(&designer.room_types)?)
        .bind(i64::from(designer.experience_level))
        .bind(designer.rating)
        .bind(encode_json(&designer.portfolio_types)?)
        .bind(i64::from(designer.completed_projects))
        .bind(designer.location_id.map(|id| id.to_string()))
        .bind(self.clock.now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("save_designer", e))?;

        Ok(())
    }
}
