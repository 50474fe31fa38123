//! HTTP routes.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use roomcraft_domain::{
    Designer, DesignerFilter, DesignerId, Location, LocationHierarchy, LocationId, LocationLevel,
    ValueRange,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::App;
use crate::infrastructure::ports::{ChangeKind, RepoError};
use crate::use_cases::designer::DesignerError;
use crate::use_cases::location::HierarchyError;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/locations", get(list_locations))
        .route("/api/locations/{id}", get(get_location))
        .route("/api/locations/{id}/hierarchy", get(get_hierarchy))
        .route("/api/designers", get(list_designers))
        .route("/api/designers/{id}", get(get_designer).put(put_designer))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Locations
// =============================================================================

#[derive(Debug, Deserialize)]
struct LocationQuery {
    #[serde(rename = "type")]
    level: String,
    parent_id: Option<Uuid>,
}

async fn list_locations(
    State(app): State<Arc<App>>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Vec<Location>>, ApiError> {
    let level =
        LocationLevel::from_str(&query.level).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let locations = app
        .use_cases
        .location
        .location
        .fetch_locations(level, query.parent_id.map(LocationId::from_uuid))
        .await?;
    Ok(Json(locations))
}

async fn get_location(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Location>, ApiError> {
    let location = app
        .use_cases
        .location
        .location
        .get(LocationId::from_uuid(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(location))
}

async fn get_hierarchy(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<LocationHierarchy>, ApiError> {
    let hierarchy = app
        .use_cases
        .location
        .resolve_hierarchy
        .execute(Some(LocationId::from_uuid(id)))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(hierarchy))
}

// =============================================================================
// Designers
// =============================================================================

/// Flat query-string form of [`DesignerFilter`]. Lists are comma separated.
#[derive(Debug, Default, Deserialize)]
struct DesignerQuery {
    location_id: Option<Uuid>,
    styles: Option<String>,
    room_types: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    min_rating: Option<f64>,
    max_rating: Option<f64>,
    min_experience: Option<u32>,
    max_experience: Option<u32>,
    min_projects: Option<u32>,
    max_projects: Option<u32>,
}

impl TryFrom<DesignerQuery> for DesignerFilter {
    type Error = ApiError;

    fn try_from(query: DesignerQuery) -> Result<Self, Self::Error> {
        Ok(DesignerFilter {
            location_id: query.location_id.map(LocationId::from_uuid),
            styles: parse_list(query.styles.as_deref())?,
            room_types: parse_list(query.room_types.as_deref())?,
            price: ValueRange::new(query.min_price, query.max_price),
            rating: ValueRange::new(query.min_rating, query.max_rating),
            experience: ValueRange::new(query.min_experience, query.max_experience),
            completed_projects: ValueRange::new(query.min_projects, query.max_projects),
        })
    }
}

fn parse_list<T>(raw: Option<&str>) -> Result<Vec<T>, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| ApiError::BadRequest(e.to_string())))
        .collect()
}

async fn list_designers(
    State(app): State<Arc<App>>,
    Query(query): Query<DesignerQuery>,
) -> Result<Json<Vec<Designer>>, ApiError> {
    let filter = DesignerFilter::try_from(query)?;
    let designers = app.use_cases.designers.search(&filter).await?;
    Ok(Json(designers))
}

async fn get_designer(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Designer>, ApiError> {
    let designer = app
        .use_cases
        .designers
        .get(DesignerId::from_uuid(id))
        .await?;
    Ok(Json(designer))
}

async fn put_designer(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(mut designer): Json<Designer>,
) -> Result<(StatusCode, Json<Designer>), ApiError> {
    designer.id = DesignerId::from_uuid(id);
    let status = match app.use_cases.designers.save_profile(&designer).await? {
        ChangeKind::Insert => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(designer)))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<HierarchyError> for ApiError {
    fn from(e: HierarchyError) -> Self {
        match e {
            HierarchyError::NotFound(_) => ApiError::NotFound,
            HierarchyError::Corruption { .. } => ApiError::Unprocessable(e.to_string()),
            HierarchyError::QueryFailure(e) => e.into(),
        }
    }
}

impl From<DesignerError> for ApiError {
    fn from(e: DesignerError) -> Self {
        match e {
            DesignerError::NotFound(_) => ApiError::NotFound,
            DesignerError::InvalidFilter(_) | DesignerError::InvalidProfile(_) => {
                ApiError::BadRequest(e.to_string())
            }
            DesignerError::Repo(e) => e.into(),
        }
    }
}
