//! Location hierarchy use cases.

mod resolve_hierarchy;
mod selector;

pub use resolve_hierarchy::{HierarchyError, ResolveHierarchy, MAX_ANCESTOR_HOPS};
pub use selector::{
    BackfillOutcome, ChangeHandler, DropdownState, LoadOutcome, LocationSelector,
    SelectorError, SelectorSnapshot,
};

use std::sync::Arc;

use crate::entities::Location;

/// Container for location use cases.
pub struct LocationUseCases {
    pub location: Arc<Location>,
    pub resolve_hierarchy: Arc<ResolveHierarchy>,
}

impl LocationUseCases {
    pub fn new(location: Arc<Location>, resolve_hierarchy: Arc<ResolveHierarchy>) -> Self {
        Self {
            location,
            resolve_hierarchy,
        }
    }

    /// A fresh selector sharing this container's level cache.
    pub fn selector(&self, on_change: Option<ChangeHandler>) -> LocationSelector {
        match on_change {
            Some(handler) => LocationSelector::with_on_change(
                self.location.clone(),
                self.resolve_hierarchy.clone(),
                handler,
            ),
            None => LocationSelector::new(self.location.clone(), self.resolve_hierarchy.clone()),
        }
    }
}
