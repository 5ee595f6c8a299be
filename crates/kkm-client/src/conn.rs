//! Connection descriptor: which gateway to talk to and how to authenticate.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Immutable `(host, secret, serial)` triple.
///
/// `host` may carry a port (`"127.0.0.1:5757"`). `serial` is only needed
/// for device-addressed operations.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnParams {
    host: String,
    #[serde(default)]
    secret: String,
    #[serde(default)]
    serial: String,
}

impl ConnParams {
    pub fn new(
        host: impl Into<String>,
        secret: impl Into<String>,
        serial: impl Into<String>,
    ) -> Self {
        ConnParams {
            host: host.into(),
            secret: secret.into(),
            serial: serial.into(),
        }
    }

    /// Builds the descriptor from a `{host, secret?, serial?}` record.
    pub fn from_value(value: &Value) -> ClientResult<Self> {
        ConnParams::deserialize(value)
            .map_err(|e| ClientError::InvalidConfiguration(format!("connection: {}", e)))
    }

    /// Same host and secret, another device.
    pub fn with_serial(&self, serial: impl Into<String>) -> Self {
        ConnParams {
            serial: serial.into(),
            ..self.clone()
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }
}

// Secret stays out of logs and panics.
impl fmt::Debug for ConnParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnParams")
            .field("host", &self.host)
            .field("secret", &"<redacted>")
            .field("serial", &self.serial)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_defaults() {
        let conn = ConnParams::from_value(&json!({"host": "127.11.22.33:5757"})).unwrap();
        assert_eq!(conn.host(), "127.11.22.33:5757");
        assert_eq!(conn.secret(), "");
        assert_eq!(conn.serial(), "");
    }

    #[test]
    fn test_from_value_requires_host() {
        let err = ConnParams::from_value(&json!({"secret": "s"})).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let conn = ConnParams::new("h", "lorem.ipsum", "1");
        let debug = format!("{:?}", conn);
        assert!(!debug.contains("lorem.ipsum"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_with_serial() {
        let conn = ConnParams::new("h", "s", "1").with_serial("2");
        assert_eq!(conn, ConnParams::new("h", "s", "2"));
    }
}
