//! Unified error types for the rules layer
//!
//! Provides a common error type usable across table lookups, progression
//! arithmetic, and the builder state machine, so callers never have to deal
//! with String or anyhow errors.

use thiserror::Error;

use crate::dice::DiceParseError;

/// Unified error type for rules operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RulesError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Rule table entry not found
    #[error("Unknown {table} entry: {key}")]
    UnknownEntry { table: &'static str, key: String },

    /// Bundled rule table could not be decoded
    #[error("Malformed rule table {table}: {detail}")]
    MalformedTable { table: &'static str, detail: String },

    /// Business rule violation
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Builder step transition not allowed
    #[error("Invalid step transition: {0}")]
    InvalidStepTransition(String),
}

impl RulesError {
    /// Creates a validation error for business rule violations.
    ///
    /// Use this when invariants or constraints are violated: required fields
    /// empty, values outside allowed ranges, allocations incomplete.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an unknown-entry error for a failed table lookup
    pub fn unknown_entry(table: &'static str, key: impl Into<String>) -> Self {
        Self::UnknownEntry {
            table,
            key: key.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Create a parse error for string-to-type conversion failures
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an invalid step transition error
    pub fn invalid_step_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStepTransition(msg.into())
    }
}

impl From<DiceParseError> for RulesError {
    fn from(err: DiceParseError) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = RulesError::validation("name cannot be empty");
        assert!(matches!(err, RulesError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: name cannot be empty");
    }

    #[test]
    fn test_unknown_entry_error() {
        let err = RulesError::unknown_entry("class", "artificer");
        assert_eq!(err.to_string(), "Unknown class entry: artificer");
    }

    #[test]
    fn test_constraint_error() {
        let err = RulesError::constraint("subclass already chosen");
        assert_eq!(
            err.to_string(),
            "Constraint violation: subclass already chosen"
        );
    }

    #[test]
    fn test_from_dice_parse_error() {
        let dice_err = DiceParseError::Empty;
        let rules_err: RulesError = dice_err.into();
        assert!(matches!(rules_err, RulesError::Parse(_)));
        assert!(rules_err.to_string().contains("Empty dice formula"));
    }
}
