//! # Error Types
//!
//! Validation errors raised while building operation details.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kkm-core errors (this file)                                           │
//! │  └── ValidationError  - A field failed its domain rule                 │
//! │                                                                         │
//! │  kkm-client errors (separate crate)                                    │
//! │  └── ClientError      - Configuration, dispatch, idempotency           │
//! │                                                                         │
//! │  Flow: ValidationError → ClientError → caller                          │
//! │  (transport failures never become errors, they become envelopes)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every variant names the offending field
//! 3. Errors are enum variants, never String

use std::convert::Infallible;

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised synchronously by setters before anything is written into the
/// details mapping, so a malformed request never reaches the network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short (counted in Unicode scalar values).
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long (counted in Unicode scalar values).
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of the inclusive range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    /// Invalid format (e.g. a number where a string was expected).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed closed set.
    #[error("{field} '{value}' must be one of: {allowed:?}")]
    NotAllowed {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
}

impl ValidationError {
    /// Name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }

    pub(crate) fn invalid_format(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// Lets `TryInto<Tax>` accept an already-typed `Tax` (identity conversion).
impl From<Infallible> for ValidationError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "operator.name".to_string(),
        };
        assert_eq!(err.to_string(), "operator.name is required");

        let err = ValidationError::TooLong {
            field: "title".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "title must be at most 200 characters");

        let err = ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0.01,
            max: 999999.99,
            value: 1000000.0,
        };
        assert_eq!(
            err.to_string(),
            "price must be between 0.01 and 999999.99, got 1000000"
        );
    }

    #[test]
    fn test_field_accessor() {
        let err = ValidationError::NotAllowed {
            field: "tax".to_string(),
            value: "vat99".to_string(),
            allowed: vec!["no".to_string()],
        };
        assert_eq!(err.field(), "tax");
        assert!(err.to_string().contains("vat99"));
    }
}
