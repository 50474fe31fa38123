//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod importers;
pub mod ports;
pub mod postgrest;
pub mod query_cache;
pub mod realtime;
pub mod sqlite;
