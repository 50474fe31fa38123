//! Roomcraft Engine library.
//!
//! Location hierarchy resolution, cascading location selection and the
//! designer directory, behind an HTTP surface.
//!
//! ## Structure
//!
//! - `entities/` - Entity modules wrapping repository ports
//! - `use_cases/` - User story orchestration across entities
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition
//! - `config` - Environment configuration

pub mod api;
pub mod app;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod use_cases;

/// Shared test doubles and sample trees.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
