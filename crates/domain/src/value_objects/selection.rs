//! Cascading location selection
//!
//! Four dependent slots, one per [`LocationLevel`]. A deeper slot may only
//! hold a value while every shallower slot does, and changing a slot clears
//! everything beneath it.

use serde::{Deserialize, Serialize};

use crate::entities::{Location, LocationHierarchy, LocationLevel};
use crate::error::DomainError;
use crate::ids::LocationId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSelection {
    pub country: Option<LocationId>,
    pub state: Option<LocationId>,
    pub city: Option<LocationId>,
    pub locality: Option<LocationId>,
}

impl LocationSelection {
    pub fn get(&self, level: LocationLevel) -> Option<LocationId> {
        match level {
            LocationLevel::Country => self.country,
            LocationLevel::State => self.state,
            LocationLevel::City => self.city,
            LocationLevel::Locality => self.locality,
        }
    }

    fn slot_mut(&mut self, level: LocationLevel) -> &mut Option<LocationId> {
        match level {
            LocationLevel::Country => &mut self.country,
            LocationLevel::State => &mut self.state,
            LocationLevel::City => &mut self.city,
            LocationLevel::Locality => &mut self.locality,
        }
    }

    /// The selected id that scopes the options of `level`.
    ///
    /// Countries are unscoped, so this is always `None` for them.
    pub fn parent_for(&self, level: LocationLevel) -> Option<LocationId> {
        level.parent().and_then(|p| self.get(p))
    }

    /// Whether the dropdown for `level` can be used.
    pub fn is_enabled(&self, level: LocationLevel) -> bool {
        match level.parent() {
            None => true,
            Some(parent) => self.get(parent).is_some(),
        }
    }

    /// Apply a user choice at `level` and clear every deeper slot.
    ///
    /// `None` is the "no selection" placeholder. Choosing a value for a level
    /// whose parent slot is empty is rejected.
    pub fn select(
        &mut self,
        level: LocationLevel,
        id: Option<LocationId>,
    ) -> Result<(), DomainError> {
        if id.is_some() {
            self.ensure_enabled(level)?;
        }
        *self.slot_mut(level) = id;
        for deeper in level.descendants() {
            *self.slot_mut(deeper) = None;
        }
        Ok(())
    }

    /// Check that `candidate` may fill the `level` slot: it must be a
    /// location of that level whose parent is the currently selected parent.
    pub fn check_candidate(
        &self,
        level: LocationLevel,
        candidate: &Location,
    ) -> Result<(), DomainError> {
        self.ensure_enabled(level)?;
        if candidate.level != level {
            return Err(DomainError::invalid_state_transition(format!(
                "{} is a {}, not a {}",
                candidate.id, candidate.level, level
            )));
        }
        if candidate.parent_id != self.parent_for(level) {
            return Err(DomainError::invalid_state_transition(format!(
                "{} does not belong to the selected {}",
                candidate.id,
                level.parent().map(|p| p.as_str()).unwrap_or("parent")
            )));
        }
        Ok(())
    }

    /// Reject `level` while its parent slot is empty.
    pub fn ensure_enabled(&self, level: LocationLevel) -> Result<(), DomainError> {
        if self.is_enabled(level) {
            return Ok(());
        }
        Err(DomainError::invalid_state_transition(format!(
            "cannot select a {} before its {} is selected",
            level,
            level.parent().map(|p| p.as_str()).unwrap_or("parent")
        )))
    }

    /// Build a selection from a resolved hierarchy.
    ///
    /// Ancestors fill their own slots; `current` fills the locality slot only
    /// when it is a locality. The chain must start at a country, descend one
    /// level per step and link every `parent_id` to the previous member.
    pub fn from_hierarchy(hierarchy: &LocationHierarchy) -> Result<Self, DomainError> {
        let mut expected_parent: Option<LocationId> = None;
        for (depth, location) in hierarchy.chain().enumerate() {
            let expected_level = LocationLevel::ALL.get(depth).copied().ok_or_else(|| {
                DomainError::inconsistent_hierarchy(format!(
                    "chain for {} is deeper than {} levels",
                    hierarchy.current.id,
                    LocationLevel::ALL.len()
                ))
            })?;
            if location.level != expected_level {
                return Err(DomainError::inconsistent_hierarchy(format!(
                    "{} ({}) found where a {} was expected",
                    location.id, location.level, expected_level
                )));
            }
            if location.parent_id != expected_parent {
                return Err(DomainError::inconsistent_hierarchy(format!(
                    "{} is not a child of the preceding {}",
                    location.id,
                    expected_level.parent().map(|p| p.as_str()).unwrap_or("root")
                )));
            }
            expected_parent = Some(location.id);
        }

        let mut selection = Self::default();
        for ancestor in &hierarchy.ancestors {
            *selection.slot_mut(ancestor.level) = Some(ancestor.id);
        }
        if hierarchy.current.level == LocationLevel::Locality {
            selection.locality = Some(hierarchy.current.id);
        }
        Ok(selection)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        LocationLevel::ALL.iter().all(|l| self.get(*l).is_none())
    }

    pub fn is_complete(&self) -> bool {
        LocationLevel::ALL.iter().all(|l| self.get(*l).is_some())
    }

    /// No gaps: every filled slot has all shallower slots filled.
    pub fn is_contiguous(&self) -> bool {
        let mut seen_gap = false;
        for level in LocationLevel::ALL {
            match self.get(level) {
                Some(_) if seen_gap => return false,
                Some(_) => {}
                None => seen_gap = true,
            }
        }
        true
    }

    /// The deepest filled slot.
    pub fn deepest(&self) -> Option<(LocationLevel, LocationId)> {
        LocationLevel::ALL
            .iter()
            .rev()
            .find_map(|l| self.get(*l).map(|id| (*l, id)))
    }
}
