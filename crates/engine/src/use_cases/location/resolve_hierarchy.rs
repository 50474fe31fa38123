//! Ancestor chain resolution.
//!
//! Walks `parent_id` links upward from a location using point lookups, one
//! round trip per hop, and returns the chain root first.

use std::collections::HashSet;
use std::sync::Arc;

use roomcraft_domain::{LocationHierarchy, LocationId, LocationLevel};

use crate::entities::Location;
use crate::infrastructure::ports::RepoError;

/// A valid tree has at most one ancestor per level above the deepest.
pub const MAX_ANCESTOR_HOPS: usize = LocationLevel::ALL.len() - 1;

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("Location query failed: {0}")]
    QueryFailure(#[from] RepoError),
    #[error("Location not found: {0}")]
    NotFound(LocationId),
    #[error("Location hierarchy for {location_id} is corrupt: {reason}")]
    Corruption {
        location_id: LocationId,
        reason: String,
    },
}

impl HierarchyError {
    pub(crate) fn corruption(location_id: LocationId, reason: impl Into<String>) -> Self {
        Self::Corruption {
            location_id,
            reason: reason.into(),
        }
    }

    /// Whether the failure came from the store rather than from the data.
    pub fn is_query_failure(&self) -> bool {
        matches!(self, Self::QueryFailure(_) | Self::NotFound(_))
    }
}

pub struct ResolveHierarchy {
    location: Arc<Location>,
}

impl ResolveHierarchy {
    pub fn new(location: Arc<Location>) -> Self {
        Self { location }
    }

    /// Resolve `location_id` and its ancestors.
    ///
    /// `None` resolves to `None` without touching the store. Any failed
    /// lookup aborts the walk; a partial chain is never returned.
    pub async fn execute(
        &self,
        location_id: Option<LocationId>,
    ) -> Result<Option<LocationHierarchy>, HierarchyError> {
        let Some(id) = location_id else {
            return Ok(None);
        };

        let current = self
            .location
            .get(id)
            .await?
            .ok_or(HierarchyError::NotFound(id))?;

        let mut visited = HashSet::from([current.id]);
        let mut ancestors = Vec::new();
        let mut next = current.parent_id;

        while let Some(parent_id) = next {
            if !visited.insert(parent_id) {
                return Err(HierarchyError::corruption(
                    id,
                    format!("parent cycle through {}", parent_id),
                ));
            }
            if ancestors.len() == MAX_ANCESTOR_HOPS {
                return Err(HierarchyError::corruption(
                    id,
                    format!("more than {} ancestors", MAX_ANCESTOR_HOPS),
                ));
            }
            let parent = self.location.get(parent_id).await?.ok_or_else(|| {
                HierarchyError::corruption(id, format!("parent {} does not exist", parent_id))
            })?;
            next = parent.parent_id;
            ancestors.push(parent);
        }

        ancestors.reverse();
        tracing::debug!(
            location_id = %id,
            depth = ancestors.len(),
            "Resolved location hierarchy"
        );
        Ok(Some(LocationHierarchy { current, ancestors }))
    }
}
