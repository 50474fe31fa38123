//! Designer profile - the supply side of the marketplace

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{DesignerId, LocationId};
use crate::value_objects::DesignerName;

/// Interior design style a designer works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DesignerStyle {
    Modern,
    Rustic,
    Traditional,
    Minimalist,
    Bohemian,
    Industrial,
}

impl DesignerStyle {
    pub const ALL: [DesignerStyle; 6] = [
        DesignerStyle::Modern,
        DesignerStyle::Rustic,
        DesignerStyle::Traditional,
        DesignerStyle::Minimalist,
        DesignerStyle::Bohemian,
        DesignerStyle::Industrial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Modern => "Modern",
            Self::Rustic => "Rustic",
            Self::Traditional => "Traditional",
            Self::Minimalist => "Minimalist",
            Self::Bohemian => "Bohemian",
            Self::Industrial => "Industrial",
        }
    }
}

impl FromStr for DesignerStyle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::parse(format!("Unknown designer style: {}", s)))
    }
}

impl fmt::Display for DesignerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Room a designer is willing to take on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "Living Room")]
    LivingRoom,
    Bedroom,
    Kitchen,
    Office,
    #[serde(rename = "Outdoor Spaces")]
    OutdoorSpaces,
}

impl RoomType {
    pub const ALL: [RoomType; 5] = [
        RoomType::LivingRoom,
        RoomType::Bedroom,
        RoomType::Kitchen,
        RoomType::Office,
        RoomType::OutdoorSpaces,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LivingRoom => "Living Room",
            Self::Bedroom => "Bedroom",
            Self::Kitchen => "Kitchen",
            Self::Office => "Office",
            Self::OutdoorSpaces => "Outdoor Spaces",
        }
    }
}

impl FromStr for RoomType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|room| room.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::parse(format!("Unknown room type: {}", s)))
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of deliverable shown in a designer's portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortfolioType {
    #[serde(rename = "2D Layouts")]
    Layouts2d,
    #[serde(rename = "3D Renders")]
    Renders3d,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingKind {
    #[default]
    Hourly,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    Sqft,
    #[default]
    Hour,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pricing {
    pub kind: PricingKind,
    pub rate: f64,
    pub price_per_unit: f64,
    pub unit: PriceUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DesignerServices {
    pub full_room_design: bool,
    pub consultation: bool,
    pub e_design: bool,
}

/// Highest rating a designer can hold.
pub const MAX_RATING: f64 = 5.0;

/// A designer's public profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Designer {
    pub id: DesignerId,
    pub name: DesignerName,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub services: DesignerServices,
    #[serde(default)]
    pub pricing: Pricing,
    /// Portfolio image URLs
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub styles: Vec<DesignerStyle>,
    #[serde(default)]
    pub room_types: Vec<RoomType>,
    /// Years of experience
    #[serde(default)]
    pub experience_level: u32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub portfolio_types: Vec<PortfolioType>,
    #[serde(default)]
    pub completed_projects: u32,
    #[serde(default)]
    pub location_id: Option<LocationId>,
}

impl Designer {
    pub fn new(name: DesignerName) -> Self {
        Self {
            id: DesignerId::new(),
            name,
            bio: String::new(),
            services: DesignerServices::default(),
            pricing: Pricing::default(),
            images: Vec::new(),
            is_approved: false,
            styles: Vec::new(),
            room_types: Vec::new(),
            experience_level: 0,
            rating: 0.0,
            portfolio_types: Vec::new(),
            completed_projects: 0,
            location_id: None,
        }
    }

    /// Check profile fields that the store cannot enforce.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(DomainError::validation(format!(
                "Rating must be between 0 and {}, got {}",
                MAX_RATING, self.rating
            )));
        }
        if self.pricing.rate < 0.0 || self.pricing.price_per_unit < 0.0 {
            return Err(DomainError::validation("Prices cannot be negative"));
        }
        Ok(())
    }

    pub fn offers_style(&self, style: DesignerStyle) -> bool {
        self.styles.contains(&style)
    }

    pub fn handles_room(&self, room: RoomType) -> bool {
        self.room_types.contains(&room)
    }
}
