//! Roomcraft domain: the location hierarchy and designer directory vocabulary.
//!
//! No I/O lives here. Stores and transports are engine concerns.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{
    Designer, DesignerServices, DesignerStyle, Location, LocationHierarchy, LocationLevel,
    PortfolioType, PriceUnit, Pricing, PricingKind, RoomType, MAX_RATING,
};

pub use error::DomainError;

pub use ids::{DesignerId, LocationId};

pub use value_objects::{DesignerFilter, DesignerName, LocationName, LocationSelection, ValueRange};
