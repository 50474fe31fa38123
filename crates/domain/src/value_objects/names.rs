//! Validated name newtypes for domain entities
//!
//! These newtypes ensure that names are valid by construction:
//! - Non-empty
//! - Within length limits
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for name fields (LocationName, DesignerName)
const MAX_NAME_LENGTH: usize = 200;

// ============================================================================
// LocationName
// ============================================================================

/// A validated location name (non-empty, <=200 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationName(String);

impl LocationName {
    /// Create a new validated location name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - The name is empty after trimming
    /// - The name exceeds 200 characters after trimming
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Location name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Location name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LocationName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LocationName> for String {
    fn from(name: LocationName) -> String {
        name.0
    }
}

// ============================================================================
// DesignerName
// ============================================================================

/// A validated designer display name (non-empty, <=200 chars, trimmed).
///
/// Profiles without a name fall back to [`DesignerName::placeholder`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DesignerName(String);

impl DesignerName {
    const PLACEHOLDER: &'static str = "Designer";

    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Designer name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Designer name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Name shown for profiles that never set one.
    pub fn placeholder() -> Self {
        Self(Self::PLACEHOLDER.to_string())
    }

    /// Parse an optional stored name, falling back to the placeholder.
    pub fn or_placeholder(name: Option<&str>) -> Self {
        name.and_then(|n| Self::new(n).ok())
            .unwrap_or_else(Self::placeholder)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DesignerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DesignerName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DesignerName> for String {
    fn from(name: DesignerName) -> String {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_name_is_trimmed() {
        let name = LocationName::new("  Los Angeles ").expect("valid");
        assert_eq!(name.as_str(), "Los Angeles");
    }

    #[test]
    fn location_name_rejects_blank() {
        assert!(LocationName::new("   ").is_err());
    }

    #[test]
    fn location_name_rejects_overlong() {
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        let err = LocationName::new(long).unwrap_err();
        assert!(err.to_string().contains("200"));
    }

    #[test]
    fn location_name_deserialize_validates() {
        let result: Result<LocationName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn designer_name_falls_back_to_placeholder() {
        assert_eq!(DesignerName::or_placeholder(None).as_str(), "Designer");
        assert_eq!(DesignerName::or_placeholder(Some(" ")).as_str(), "Designer");
        assert_eq!(DesignerName::or_placeholder(Some("Ava")).as_str(), "Ava");
    }
}
