//! Domain entities - Core business objects with identity

mod designer;
mod location;

pub use designer::{
    Designer, DesignerServices, DesignerStyle, PortfolioType, PriceUnit, Pricing, PricingKind,
    RoomType, MAX_RATING,
};
pub use location::{Location, LocationHierarchy, LocationLevel};
