//! # Response Envelope
//!
//! Every `perform()` returns an [`Envelope`]: the gateway's JSON object with
//! synthetic `!`-prefixed fields injected by the client.
//!
//! ```text
//! success   { ...server fields..., "!httpStatus": 200, "!origin": "kkm",
//!             "!elapsedTime": 41.7 }
//!
//! failure   { "!message": "...", "!success": false, "!httpStatus": 0,
//!             "!origin": "", "!elapsedTime": 0 }
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

// =============================================================================
// Synthetic Keys
// =============================================================================

pub const HTTP_STATUS: &str = "!httpStatus";
pub const ORIGIN: &str = "!origin";
pub const ELAPSED_TIME: &str = "!elapsedTime";
pub const MESSAGE: &str = "!message";
pub const SUCCESS: &str = "!success";

/// Message of the envelope returned when the body is not a JSON object.
pub const BAD_RESPONSE: &str = "Bad response";

// =============================================================================
// Envelope
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    /// A local failure: transport error or unparseable body.
    pub fn failure(message: impl Into<String>, origin: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(MESSAGE.to_string(), Value::String(message.into()));
        map.insert(SUCCESS.to_string(), Value::Bool(false));
        map.insert(HTTP_STATUS.to_string(), Value::from(0));
        map.insert(ORIGIN.to_string(), Value::String(origin.into()));
        map.insert(ELAPSED_TIME.to_string(), Value::from(0));
        Envelope(map)
    }

    /// Server payload with bookkeeping fields added.
    pub fn from_reply(mut body: Map<String, Value>, status: u16, origin: &str, elapsed_ms: f64) -> Self {
        body.insert(HTTP_STATUS.to_string(), Value::from(status));
        body.insert(ORIGIN.to_string(), Value::String(origin.to_string()));
        body.insert(ELAPSED_TIME.to_string(), Value::from(elapsed_ms));
        Envelope(body)
    }

    pub fn http_status(&self) -> u16 {
        self.0
            .get(HTTP_STATUS)
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(0)
    }

    pub fn origin(&self) -> &str {
        self.0.get(ORIGIN).and_then(Value::as_str).unwrap_or("")
    }

    pub fn elapsed_time(&self) -> f64 {
        self.0.get(ELAPSED_TIME).and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get(MESSAGE).and_then(Value::as_str)
    }

    /// True when `!success` is present and false.
    pub fn is_failure(&self) -> bool {
        matches!(self.0.get(SUCCESS), Some(Value::Bool(false)))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// One-line summary of the synthetic fields.
impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status={} origin={} elapsed={:.1}ms",
            self.http_status(),
            if self.origin().is_empty() { "-" } else { self.origin() },
            self.elapsed_time()
        )?;
        if let Some(message) = self.message() {
            write!(f, " message={:?}", message)?;
        }
        Ok(())
    }
}

/// Extracts the leading word (`[A-Za-z0-9_]+`) of an `X-Origin` header.
pub fn parse_origin(header: &str) -> String {
    header
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
