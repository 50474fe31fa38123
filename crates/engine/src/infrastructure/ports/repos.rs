//! Repository port traits for database access.
//!
//! These are the query-executor seams: every store the engine talks to
//! (SQLite, the hosted REST backend, test doubles) sits behind one of them.

use async_trait::async_trait;
use roomcraft_domain::{Designer, DesignerFilter, DesignerId, Location, LocationId, LocationLevel};

use super::error::RepoError;

// =============================================================================
// Location hierarchy
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationRepo: Send + Sync {
    /// Point lookup by id.
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, RepoError>;

    /// `type = level [AND parent_id = parent_id] ORDER BY name`.
    ///
    /// Without a parent constraint every row at `level` is returned.
    async fn list_locations(
        &self,
        level: LocationLevel,
        parent_id: Option<LocationId>,
    ) -> Result<Vec<Location>, RepoError>;

    /// Insert or replace a row. Used by seeding; selection never writes.
    async fn save_location(&self, location: &Location) -> Result<(), RepoError>;
}

// =============================================================================
// Designer directory
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DesignerRepo: Send + Sync {
    async fn get_designer(&self, id: DesignerId) -> Result<Option<Designer>, RepoError>;

    /// Approved designers matching every predicate of `filter`, ordered by
    /// rating descending then name.
    async fn search_designers(&self, filter: &DesignerFilter) -> Result<Vec<Designer>, RepoError>;

    async fn save_designer(&self, designer: &Designer) -> Result<(), RepoError>;
}
