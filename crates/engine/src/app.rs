//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use crate::entities;
use crate::infrastructure::ports::{ClockPort, DesignerRepo, LocationRepo, RealtimePort};
use crate::use_cases::designer::DesignerDirectory;
use crate::use_cases::location::{LocationUseCases, ResolveHierarchy};

/// Main application state.
///
/// Holds all repository ports and use cases.
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Port traits injected by the binary or by tests.
#[derive(Clone)]
pub struct Repositories {
    pub location: Arc<dyn LocationRepo>,
    pub designer: Arc<dyn DesignerRepo>,
    pub realtime: Arc<dyn RealtimePort>,
    pub clock: Arc<dyn ClockPort>,
}

/// Container for all use cases.
pub struct UseCases {
    pub location: LocationUseCases,
    pub designers: DesignerDirectory,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(repositories: Repositories, location_cache_ttl: Duration) -> Self {
        let location = Arc::new(entities::Location::new(
            repositories.location.clone(),
            location_cache_ttl,
        ));
        let designer = Arc::new(entities::Designer::new(repositories.designer.clone()));

        let resolve_hierarchy = Arc::new(ResolveHierarchy::new(location.clone()));
        let use_cases = UseCases {
            location: LocationUseCases::new(location, resolve_hierarchy),
            designers: DesignerDirectory::new(designer, repositories.realtime.clone()),
        };

        Self {
            repositories,
            use_cases,
        }
    }
}
