//! Location entity operations.

use std::sync::Arc;
use std::time::Duration;

use roomcraft_domain::{self as domain, LocationId, LocationLevel};

use crate::infrastructure::ports::{LocationRepo, RepoError};
use crate::infrastructure::query_cache::QueryCache;

type LevelKey = (LocationLevel, Option<LocationId>);

/// Location entity operations.
///
/// Level listings go through a per-`(level, parent)` cache; point lookups
/// always hit the store.
pub struct Location {
    repo: Arc<dyn LocationRepo>,
    cache: QueryCache<LevelKey, Vec<domain::Location>>,
}

impl Location {
    pub fn new(repo: Arc<dyn LocationRepo>, cache_ttl: Duration) -> Self {
        Self {
            repo,
            cache: QueryCache::new(cache_ttl),
        }
    }

    /// Uncached variant for tests and one-shot tools.
    pub fn uncached(repo: Arc<dyn LocationRepo>) -> Self {
        Self::new(repo, Duration::ZERO)
    }

    // =========================================================================
    // Level queries
    // =========================================================================

    /// Every location at `level`, under `parent_id` when given, sorted by name.
    pub async fn fetch_locations(
        &self,
        level: LocationLevel,
        parent_id: Option<LocationId>,
    ) -> Result<Vec<domain::Location>, RepoError> {
        let key = (level, parent_id);
        if let Some(hit) = self.cache.get(&key).await {
            tracing::trace!(level = %level, parent_id = ?parent_id, "Location cache hit");
            return Ok(hit);
        }
        self.load(key).await
    }

    /// Skip and replace the cached entry for this key.
    pub async fn refetch_locations(
        &self,
        level: LocationLevel,
        parent_id: Option<LocationId>,
    ) -> Result<Vec<domain::Location>, RepoError> {
        let key = (level, parent_id);
        self.cache.invalidate(&key).await;
        self.load(key).await
    }

    async fn load(&self, key: LevelKey) -> Result<Vec<domain::Location>, RepoError> {
        let (level, parent_id) = key;
        let mut locations = self.repo.list_locations(level, parent_id).await?;
        // Stores order by name already; re-sort so every backend agrees on collation.
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        self.cache.store(key, locations.clone()).await;
        Ok(locations)
    }

    // =========================================================================
    // Point lookups
    // =========================================================================

    pub async fn get(&self, id: LocationId) -> Result<Option<domain::Location>, RepoError> {
        self.repo.get_location(id).await
    }
}
