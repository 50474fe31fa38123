//! Value objects - Immutable objects defined by their attributes

mod designer_filter;
mod names;
mod selection;

pub use designer_filter::{DesignerFilter, ValueRange};
pub use names::{DesignerName, LocationName};
pub use selection::LocationSelection;
