//! Importers that load reference data into the stores.

mod location_seed;

pub use location_seed::{ImportError, LocationSeedImporter, SeedNode, SeedReport};
