//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.
//! Use cases orchestrate across entity modules to fulfill user stories.

pub mod designer;
pub mod location;

pub use designer::{DesignerDirectory, DesignerError};
pub use location::{LocationSelector, LocationUseCases, ResolveHierarchy};
