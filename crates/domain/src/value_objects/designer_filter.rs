//! Designer search filter
//!
//! Every field is optional and applied as an independent predicate; an
//! empty filter matches every approved designer.

use serde::{Deserialize, Serialize};

use crate::entities::{Designer, DesignerStyle, RoomType, MAX_RATING};
use crate::error::DomainError;
use crate::ids::LocationId;

/// Inclusive bounds, either side optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> ValueRange<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: T) -> Self {
        Self::new(Some(min), None)
    }

    pub fn between(min: T, max: T) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }

    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DesignerFilter {
    /// Designers located here or anywhere beneath it in the hierarchy.
    pub location_id: Option<LocationId>,
    /// Any-of match.
    #[serde(default)]
    pub styles: Vec<DesignerStyle>,
    /// Any-of match.
    #[serde(default)]
    pub room_types: Vec<RoomType>,
    /// Bounds on price per unit.
    #[serde(default)]
    pub price: ValueRange<f64>,
    #[serde(default)]
    pub rating: ValueRange<f64>,
    /// Bounds on years of experience.
    #[serde(default)]
    pub experience: ValueRange<u32>,
    #[serde(default)]
    pub completed_projects: ValueRange<u32>,
}

impl DesignerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_location(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn with_styles(mut self, styles: impl IntoIterator<Item = DesignerStyle>) -> Self {
        self.styles = styles.into_iter().collect();
        self
    }

    pub fn with_room_types(mut self, rooms: impl IntoIterator<Item = RoomType>) -> Self {
        self.room_types = rooms.into_iter().collect();
        self
    }

    pub fn with_price(mut self, price: ValueRange<f64>) -> Self {
        self.price = price;
        self
    }

    pub fn with_rating(mut self, rating: ValueRange<f64>) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_experience(mut self, experience: ValueRange<u32>) -> Self {
        self.experience = experience;
        self
    }

    pub fn with_completed_projects(mut self, projects: ValueRange<u32>) -> Self {
        self.completed_projects = projects;
        self
    }

    /// Reject filters that can never match or carry impossible bounds.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.price.is_inverted() {
            return Err(DomainError::validation("price range minimum exceeds maximum"));
        }
        if self.rating.is_inverted() {
            return Err(DomainError::validation("rating range minimum exceeds maximum"));
        }
        if self.experience.is_inverted() {
            return Err(DomainError::validation(
                "experience range minimum exceeds maximum",
            ));
        }
        if self.completed_projects.is_inverted() {
            return Err(DomainError::validation(
                "completed projects range minimum exceeds maximum",
            ));
        }
        if self.price.min.is_some_and(|p| p < 0.0) {
            return Err(DomainError::validation("price cannot be negative"));
        }
        let rating_in_bounds = |r: f64| (0.0..=MAX_RATING).contains(&r);
        if !self.rating.min.map_or(true, rating_in_bounds)
            || !self.rating.max.map_or(true, rating_in_bounds)
        {
            return Err(DomainError::validation(format!(
                "rating bounds must be between 0 and {}",
                MAX_RATING
            )));
        }
        Ok(())
    }

    /// Evaluate every predicate except the location scope, which needs the
    /// hierarchy and is resolved by the store.
    pub fn matches_profile(&self, designer: &Designer) -> bool {
        let styles_ok =
            self.styles.is_empty() || self.styles.iter().any(|s| designer.offers_style(*s));
        let rooms_ok = self.room_types.is_empty()
            || self.room_types.iter().any(|r| designer.handles_room(*r));

        styles_ok
            && rooms_ok
            && self.price.contains(designer.pricing.price_per_unit)
            && self.rating.contains(designer.rating)
            && self.experience.contains(designer.experience_level)
            && self.completed_projects.contains(designer.completed_projects)
    }
}
