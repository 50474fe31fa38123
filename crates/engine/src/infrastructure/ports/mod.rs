//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Database access (SQLite locally, the hosted REST backend in production)
//! - Realtime change notifications
//! - Clock (for testing)

mod error;
mod realtime;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{DesignerRepo, LocationRepo};

// =============================================================================
// Realtime Port
// =============================================================================
pub use realtime::{
    ChangeCallback, ChangeEvent, ChangeKind, ChangeTopic, ColumnFilter, RealtimePort,
    Subscription,
};

// =============================================================================
// Test-Only Mock Repositories (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockDesignerRepo, MockLocationRepo};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::RepoError;
