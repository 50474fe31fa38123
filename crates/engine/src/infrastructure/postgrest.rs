//! Hosted location store spoken to over its PostgREST interface.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use roomcraft_domain::{Location, LocationId, LocationLevel, LocationName};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{LocationRepo, RepoError};

/// Request timeout for the hosted backend.
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct PostgrestLocationRepo {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Wire shape of a `locations` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LocationRow {
    id: String,
    name: String,
    #[serde(rename = "type")]
    level: String,
    #[serde(default)]
    parent_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Location> for LocationRow {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id.to_string(),
            name: location.name.as_str().to_string(),
            level: location.level.as_str().to_string(),
            parent_id: location.parent_id.map(|id| id.to_string()),
            created_at: location.created_at,
            updated_at: location.updated_at,
        }
    }
}

impl TryFrom<LocationRow> for Location {
    type Error = RepoError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        Ok(Location {
            id: row.id.parse().map_err(RepoError::serialization)?,
            name: LocationName::new(row.name).map_err(RepoError::serialization)?,
            level: row.level.parse().map_err(RepoError::serialization)?,
            parent_id: row
                .parent_id
                .filter(|p| !p.is_empty())
                .map(|p| p.parse::<LocationId>())
                .transpose()
                .map_err(RepoError::serialization)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl PostgrestLocationRepo {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/locations", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch_rows(
        &self,
        operation: &'static str,
        query: Vec<(&'static str, String)>,
    ) -> Result<Vec<LocationRow>, RepoError> {
        let response = self
            .authorized(self.client.get(self.table_url()).query(&query))
            .send()
            .await
            .map_err(|e| RepoError::backend(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepoError::backend(operation, describe_failure(status, &body)));
        }

        response
            .json()
            .await
            .map_err(|e| RepoError::serialization(format!("{}: {}", operation, e)))
    }
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    if body.is_empty() {
        format!("status {}", status)
    } else {
        format!("status {}: {}", status, body)
    }
}

/// Query parameters for listing one level, optionally under a parent.
///
/// `type` is matched with `ilike` so rows stored as `Country` still match.
fn list_query(level: LocationLevel, parent_id: Option<LocationId>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("type", format!("ilike.{}", level.as_str())),
    ];
    if let Some(parent_id) = parent_id {
        query.push(("parent_id", format!("eq.{}", parent_id)));
    }
    query.push(("order", "name.asc".to_string()));
    query
}

fn get_query(id: LocationId) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("id", format!("eq.{}", id)),
        ("limit", "1".to_string()),
    ]
}

#[async_trait]
impl LocationRepo for PostgrestLocationRepo {
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, RepoError> {
        let rows = self.fetch_rows("get_location", get_query(id)).await?;
        rows.into_iter().next().map(Location::try_from).transpose()
    }

    async fn list_locations(
        &self,
        level: LocationLevel,
        parent_id: Option<LocationId>,
    ) -> Result<Vec<Location>, RepoError> {
        let rows = self
            .fetch_rows("list_locations", list_query(level, parent_id))
            .await?;
        tracing::trace!(level = %level, rows = rows.len(), "Fetched locations from backend");
        rows.into_iter().map(Location::try_from).collect()
    }

    async fn save_location(&self, location: &Location) -> Result<(), RepoError> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&LocationRow::from(location))
            .send()
            .await
            .map_err(|e| RepoError::backend("save_location", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepoError::backend(
                "save_location",
                describe_failure(status, &body),
            ));
        }
        Ok(())
    }
}
