//! # Client Error Types
//!
//! Errors raised locally, before a request reaches the network.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Construction  │  │     Dispatch            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Validation     │  │  UnsupportedOperation   │ │
//! │  │  ConfigLoad     │  │  UnknownDetail  │  │  MissingIdempotencyKey  │ │
//! │  │  ConfigSave     │  │  Serialization  │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  NOT HERE: transport and remote failures. Those come back as the       │
//! │  normalized response envelope, never as Err.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use kkm_core::ValidationError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering every local failure.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Connection descriptor or config file rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Construction Errors
    // =========================================================================
    /// A detail failed its domain rule.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Bulk details contained a key the operation has no setter for.
    #[error("Unknown detail key '{key}' for {method}")]
    UnknownDetailKey { method: &'static str, key: String },

    /// JSON input could not be parsed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Dispatch Errors
    // =========================================================================
    /// Operation kind string does not name a known operation.
    #[error("Unsupported operation: '{0}'")]
    UnsupportedOperation(String),

    /// A Post operation was performed before any idempotency key was set.
    #[error("Idempotency key is required for {0}")]
    MissingIdempotencyKey(&'static str),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::SerializationFailed(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if a detail value was rejected.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ClientError::Validation(_)
                | ClientError::UnknownDetailKey { .. }
                | ClientError::SerializationFailed(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfiguration(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err: ClientError = ValidationError::Required {
            field: "operator.name".into(),
        }
        .into();
        assert!(err.is_validation_error());
        assert!(!err.is_config_error());

        assert!(ClientError::InvalidConfiguration("serial".into()).is_config_error());
        assert!(!ClientError::MissingIdempotencyKey("sell").is_validation_error());
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::UnknownDetailKey {
            method: "cash-in",
            key: "items".into(),
        };
        assert_eq!(err.to_string(), "Unknown detail key 'items' for cash-in");

        let err = ClientError::UnsupportedOperation("print-magic".into());
        assert_eq!(err.to_string(), "Unsupported operation: 'print-magic'");
    }
}
