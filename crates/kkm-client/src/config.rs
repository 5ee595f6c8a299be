//! # Client Configuration
//!
//! Connection profile and per-operation defaults for the gateway client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KKM_HOST=127.11.22.33:5757                                         │
//! │     KKM_SECRET=...  KKM_SERIAL=...  KKM_VERIFY_TLS=false               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/kkm-client/kkm.toml (Linux)                              │
//! │     ~/Library/Application Support/ru.kkm.kkm-client/kkm.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     empty host (rejected by validate), verify_tls = false              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # kkm.toml
//! [connection]
//! host = "127.11.22.33:5757"
//! secret = "lorem.ipsum.dolor.sit.amet"
//! serial = "11111111111111"
//!
//! [transport]
//! verify_tls = false  # gateways usually run on self-signed certificates
//!
//! [operator]
//! name = "Оператор"
//! inn = "770000000000"
//!
//! [customer]
//! account = "123456789"
//! contact = "+79876543210"
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use kkm_core::{details::keys, Customer, Operator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::conn::ConnParams;
use crate::device::Device;
use crate::error::{ClientError, ClientResult};
use crate::server::Server;
use crate::transport::{HttpTransport, ReqwestTransport};

// =============================================================================
// Connection Settings
// =============================================================================

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Gateway address, optionally with port.
    #[serde(default)]
    pub host: String,

    /// Shared secret sent as `X-Secret`.
    #[serde(default)]
    pub secret: String,

    /// Device serial number. Only needed for device operations.
    #[serde(default)]
    pub serial: String,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("secret", &"<redacted>")
            .field("serial", &self.serial)
            .finish()
    }
}

// =============================================================================
// Transport Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportSettings {
    /// Verify the gateway's TLS certificate. Off by default.
    #[serde(default)]
    pub verify_tls: bool,
}

// =============================================================================
// Operation Defaults
// =============================================================================

/// Cashier applied to operations that take an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSettings {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inn: Option<String>,
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KkmConfig {
    #[serde(default)]
    pub connection: ConnectionSettings,

    #[serde(default)]
    pub transport: TransportSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<OperatorSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
}

impl KkmConfig {
    /// Loads configuration from file, then applies environment overrides.
    ///
    /// A missing file is not an error, the defaults are used instead.
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let config = Self::read(config_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Same as [`load`](Self::load) without the final `validate()`, for
    /// callers that layer their own overrides on top.
    pub fn read(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading kkm config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration, falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load kkm config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document without touching environment or disk.
    pub fn from_toml_str(contents: &str) -> ClientResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Kkm config saved");
        Ok(())
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.connection.host.trim().is_empty() {
            return Err(ClientError::InvalidConfiguration(
                "connection.host must not be empty".into(),
            ));
        }

        if let Some(operator) = &self.operator {
            Operator::new(&operator.name, operator.inn.as_deref())?;
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("KKM_HOST") {
            debug!(host = %host, "Overriding host from environment");
            self.connection.host = host;
        }

        if let Ok(secret) = std::env::var("KKM_SECRET") {
            self.connection.secret = secret;
        }

        if let Ok(serial) = std::env::var("KKM_SERIAL") {
            debug!(serial = %serial, "Overriding serial from environment");
            self.connection.serial = serial;
        }

        if let Ok(verify) = std::env::var("KKM_VERIFY_TLS") {
            match verify.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.transport.verify_tls = true,
                "0" | "false" | "no" | "off" => self.transport.verify_tls = false,
                _ => warn!(value = %verify, "Unknown KKM_VERIFY_TLS value in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("ru", "kkm", "kkm-client")
            .map(|dirs| dirs.config_dir().join("kkm.toml"))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn conn_params(&self) -> ConnParams {
        ConnParams::new(
            self.connection.host.clone(),
            self.connection.secret.clone(),
            self.connection.serial.clone(),
        )
    }

    /// Configured cashier, validated.
    pub fn operator(&self) -> ClientResult<Option<Operator>> {
        self.operator
            .as_ref()
            .map(|op| Operator::new(&op.name, op.inn.as_deref()).map_err(ClientError::from))
            .transpose()
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref().filter(|c| !c.is_empty())
    }

    /// Operator and customer defaults as a bulk record.
    ///
    /// Intended for `set_details(_, true)` so operations without these
    /// setters drop them.
    pub fn operation_defaults(&self) -> ClientResult<Map<String, Value>> {
        let mut defaults = Map::new();
        if let Some(operator) = &self.operator {
            defaults.insert(keys::OPERATOR.to_string(), serde_json::to_value(operator)?);
        }
        if let Some(customer) = self.customer() {
            defaults.insert(keys::CUSTOMER.to_string(), serde_json::to_value(customer)?);
        }
        Ok(defaults)
    }

    // =========================================================================
    // Builders
    // =========================================================================

    pub fn transport(&self) -> ClientResult<Arc<dyn HttpTransport>> {
        Ok(Arc::new(ReqwestTransport::new(self.transport.verify_tls)?))
    }

    pub fn device(&self) -> ClientResult<Device> {
        Device::with_transport(self.conn_params(), self.transport()?)
    }

    pub fn server(&self) -> ClientResult<Server> {
        Ok(Server::with_transport(self.conn_params(), self.transport()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SAMPLE: &str = r#"
[connection]
host = "127.11.22.33:5757"
secret = "lorem.ipsum.dolor.sit.amet"
serial = "11111111111111"

[operator]
name = "Оператор"
inn = "770000000000"

[customer]
account = "123456789"
contact = "+79876543210"
"#;

    fn clear_env() {
        for var in ["KKM_HOST", "KKM_SECRET", "KKM_SERIAL", "KKM_VERIFY_TLS"] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_sample() {
        let config = KkmConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.connection.host, "127.11.22.33:5757");
        assert_eq!(config.connection.serial, "11111111111111");
        assert!(!config.transport.verify_tls);

        let conn = config.conn_params();
        assert_eq!(conn.secret(), "lorem.ipsum.dolor.sit.amet");

        let operator = config.operator().unwrap().unwrap();
        assert_eq!(operator.name(), "Оператор");
        assert_eq!(operator.inn(), Some("770000000000"));

        let customer = config.customer().unwrap();
        assert_eq!(customer.account.as_deref(), Some("123456789"));
        assert_eq!(customer.name, None);
    }

    #[test]
    fn test_validation() {
        let config = KkmConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ClientError::InvalidConfiguration(_))
        ));

        let mut config = KkmConfig::from_toml_str(SAMPLE).unwrap();
        assert!(config.validate().is_ok());

        config.operator = Some(OperatorSettings {
            name: "   ".into(),
            inn: None,
        });
        assert!(config.validate().unwrap_err().is_validation_error());
    }

    #[test]
    fn test_operation_defaults() {
        let config = KkmConfig::from_toml_str(SAMPLE).unwrap();
        let defaults = config.operation_defaults().unwrap();

        assert_eq!(
            defaults.get("operator"),
            Some(&serde_json::json!({"name": "Оператор", "inn": "770000000000"}))
        );
        assert_eq!(
            defaults.get("customer"),
            Some(&serde_json::json!({"account": "123456789", "contact": "+79876543210"}))
        );

        let bare = KkmConfig::from_toml_str("[connection]\nhost = \"h\"\n").unwrap();
        assert!(bare.operation_defaults().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let err = KkmConfig::from_toml_str("[connection\nhost = 1").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    #[serial]
    fn test_save_and_load_roundtrip() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kkm.toml");

        let config = KkmConfig::from_toml_str(SAMPLE).unwrap();
        config.save(Some(path.clone())).unwrap();

        let loaded = KkmConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.connection.host, config.connection.host);
        assert_eq!(loaded.operator, config.operator);
        assert_eq!(loaded.customer, config.customer);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kkm.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        std::env::set_var("KKM_HOST", "10.0.0.5:5757");
        std::env::set_var("KKM_SERIAL", "22222222222222");
        std::env::set_var("KKM_VERIFY_TLS", "yes");

        let config = KkmConfig::load(Some(path)).unwrap();
        clear_env();

        assert_eq!(config.connection.host, "10.0.0.5:5757");
        assert_eq!(config.connection.serial, "22222222222222");
        assert_eq!(config.connection.secret, "lorem.ipsum.dolor.sit.amet");
        assert!(config.transport.verify_tls);
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_env_only() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(KkmConfig::load(Some(path.clone())).is_err());
        assert!(KkmConfig::read(Some(path.clone())).is_ok());
        let fallback = KkmConfig::load_or_default(Some(path.clone()));
        assert!(fallback.connection.host.is_empty());

        std::env::set_var("KKM_HOST", "gw.local");
        let config = KkmConfig::load(Some(path)).unwrap();
        clear_env();
        assert_eq!(config.connection.host, "gw.local");
        assert!(config.operator.is_none());
    }

    #[test]
    fn test_secret_not_in_debug() {
        let config = KkmConfig::from_toml_str(SAMPLE).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("lorem.ipsum"));
    }
}
