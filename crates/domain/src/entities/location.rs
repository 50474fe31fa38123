//! Location entity - nodes of the country/state/city/locality tree
//!
//! Locations form a strict four-level hierarchy through `parent_id`.
//! Rows are owned by the backing store; this crate only reads them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::LocationId;
use crate::value_objects::LocationName;

/// Depth of a location in the hierarchy.
///
/// Ordering follows depth: `Country < State < City < Locality`.
/// The canonical wire and storage form is lowercase; parsing accepts any
/// casing so mixed-case rows and query parameters normalize on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LocationLevel {
    Country,
    State,
    City,
    Locality,
}

impl LocationLevel {
    /// All levels, root first.
    pub const ALL: [LocationLevel; 4] = [
        LocationLevel::Country,
        LocationLevel::State,
        LocationLevel::City,
        LocationLevel::Locality,
    ];

    /// Zero-based depth (country = 0).
    pub fn depth(self) -> usize {
        match self {
            Self::Country => 0,
            Self::State => 1,
            Self::City => 2,
            Self::Locality => 3,
        }
    }

    /// The level one step shallower, if any.
    pub fn parent(self) -> Option<Self> {
        match self {
            Self::Country => None,
            Self::State => Some(Self::Country),
            Self::City => Some(Self::State),
            Self::Locality => Some(Self::City),
        }
    }

    /// The level one step deeper, if any.
    pub fn child(self) -> Option<Self> {
        match self {
            Self::Country => Some(Self::State),
            Self::State => Some(Self::City),
            Self::City => Some(Self::Locality),
            Self::Locality => None,
        }
    }

    /// Levels strictly deeper than this one, shallowest first.
    pub fn descendants(self) -> impl Iterator<Item = LocationLevel> {
        Self::ALL.into_iter().filter(move |l| *l > self)
    }

    /// Get the string representation for database storage
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::State => "state",
            Self::City => "city",
            Self::Locality => "locality",
        }
    }
}

impl fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "country" => Ok(Self::Country),
            "state" => Ok(Self::State),
            "city" => Ok(Self::City),
            "locality" => Ok(Self::Locality),
            other => Err(DomainError::parse(format!("Unknown location level: {}", other))),
        }
    }
}

impl TryFrom<String> for LocationLevel {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<LocationLevel> for String {
    fn from(level: LocationLevel) -> String {
        level.as_str().to_string()
    }
}

/// A single node of the location tree.
///
/// Simple data struct with public fields: the tree invariants (parent is
/// exactly one level shallower, no cycles) belong to the store, not to the
/// individual row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: LocationName,
    #[serde(rename = "type")]
    pub level: LocationLevel,
    pub parent_id: Option<LocationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn new(
        name: LocationName,
        level: LocationLevel,
        parent_id: Option<LocationId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LocationId::new(),
            name,
            level,
            parent_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A location together with its ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationHierarchy {
    pub current: Location,
    /// Ancestors ordered root first, ending at the immediate parent.
    pub ancestors: Vec<Location>,
}

impl LocationHierarchy {
    /// The full chain from root to `current` inclusive.
    pub fn chain(&self) -> impl Iterator<Item = &Location> {
        self.ancestors.iter().chain(std::iter::once(&self.current))
    }

    pub fn root(&self) -> &Location {
        self.ancestors.first().unwrap_or(&self.current)
    }

    /// Find the member of the chain at `level`.
    pub fn at_level(&self, level: LocationLevel) -> Option<&Location> {
        self.chain().find(|l| l.level == level)
    }
}
