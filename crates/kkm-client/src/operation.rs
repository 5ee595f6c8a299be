//! # Operation Core
//!
//! Every request the client can send is an *operation*: a target (device or
//! server) plus a method name, in one of two shapes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Operation Shapes                                │
//! │                                                                         │
//! │  GetOperation                       PostOperation                       │
//! │  ────────────                       ─────────────                       │
//! │  • no body                          • JSON body from Details            │
//! │  • key generated per call           • key REQUIRED before perform()     │
//! │  • perform() → Envelope             • perform() → ClientResult<Envelope>│
//! │                                     • set_details(bulk, ignore_unknown) │
//! │                                                                         │
//! │  Target::method_path                                                    │
//! │  ───────────────────                                                    │
//! │  Device  →  kkm/{serial}/{method}                                       │
//! │  Server  →  {method}                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concrete operations embed an [`OperationState`] and add per-operation
//! setters through the capability traits in [`crate::capabilities`].

use std::fmt;

use kkm_core::{Details, ValidationError};
use serde_json::{Map, Value};
use tracing::debug;

use crate::envelope::Envelope;
use crate::error::{ClientError, ClientResult};
use crate::idempotency::generate_key;
use crate::performer::Performer;

// =============================================================================
// Target
// =============================================================================

/// Addressing base of an operation.
pub trait Target: Clone + fmt::Debug {
    fn performer(&self) -> &Performer;

    /// Wire path for `method` on this target.
    fn method_path(&self, method: &str) -> String;
}

// =============================================================================
// Operation State
// =============================================================================

/// Target, details and idempotency key shared by every operation.
#[derive(Debug, Clone)]
pub struct OperationState<T> {
    target: T,
    details: Details,
    idempotency_key: Option<String>,
}

impl<T: Target> OperationState<T> {
    pub fn new(target: T) -> Self {
        OperationState {
            target,
            details: Details::new(),
            idempotency_key: None,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn details_mut(&mut self) -> &mut Details {
        &mut self.details
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }
}

// =============================================================================
// Operation Traits
// =============================================================================

pub trait Operation: Sized {
    type Target: Target;

    /// Method name, as it appears in the path.
    const METHOD: &'static str;

    fn state(&self) -> &OperationState<Self::Target>;

    fn state_mut(&mut self) -> &mut OperationState<Self::Target>;

    fn method_path(&self) -> String {
        self.state().target.method_path(Self::METHOD)
    }

    fn details(&self) -> &Details {
        &self.state().details
    }

    fn idempotency_key(&self) -> Option<&str> {
        self.state().idempotency_key()
    }

    /// Pins `key`, or generates a fresh one when `None`.
    fn set_idempotency_key(&mut self, key: Option<&str>) -> &mut Self {
        let key = key.map_or_else(generate_key, str::to_string);
        self.state_mut().idempotency_key = Some(key);
        self
    }
}

/// Read-only operation.
pub trait GetOperation: Operation {
    fn perform(&self) -> Envelope {
        let state = self.state();
        state
            .target
            .performer()
            .perform_get_method(&self.method_path(), state.idempotency_key())
    }
}

/// Applies one bulk value to an operation.
pub type DetailSetter<Op> = fn(&mut Op, &Value) -> ClientResult<()>;

/// Mutating operation.
pub trait PostOperation: Operation {
    /// Resolves a lowercase bulk key to its setter.
    ///
    /// `details`, `idempotencykey` and `padding` are handled by
    /// [`set_details`](PostOperation::set_details) and never reach this.
    fn detail_setter(key: &str) -> Option<DetailSetter<Self>>;

    /// Stores an opaque filler string under `*padding*`.
    fn set_padding(&mut self, padding: &str) -> &mut Self {
        self.state_mut().details.set_padding(padding);
        self
    }

    /// Merges a bulk record key by key (case-insensitive).
    ///
    /// Unknown keys are rejected before anything is written. Entries are
    /// then applied in map iteration order (key order for `serde_json::Map`);
    /// when a value fails validation the entries before it stay applied.
    fn set_details(
        &mut self,
        details: &Map<String, Value>,
        ignore_unknown: bool,
    ) -> ClientResult<&mut Self> {
        if !ignore_unknown {
            if let Some(key) = details.keys().find(|key| !is_known_key::<Self>(key)) {
                return Err(ClientError::UnknownDetailKey {
                    method: Self::METHOD,
                    key: key.clone(),
                });
            }
        }

        for (key, value) in details {
            let lower = key.to_lowercase();
            match lower.as_str() {
                "details" => continue,
                "idempotencykey" => {
                    let pinned = optional_str(key, value)?;
                    self.set_idempotency_key(pinned);
                }
                "padding" => {
                    let padding = expect_str(key, value)?;
                    self.set_padding(padding);
                }
                other => match Self::detail_setter(other) {
                    Some(setter) => setter(self, value)?,
                    None => {
                        debug!(method = Self::METHOD, key = %key, "Dropping unknown detail key");
                    }
                },
            }
        }
        Ok(self)
    }

    fn perform(&self) -> ClientResult<Envelope> {
        let state = self.state();
        let key = state
            .idempotency_key()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClientError::MissingIdempotencyKey(Self::METHOD))?;
        Ok(state
            .target
            .performer()
            .perform_post_method(&self.method_path(), &state.details, key))
    }

    /// `set_details(config, false)` followed by `perform()`.
    fn perform_with(&mut self, config: &Map<String, Value>) -> ClientResult<Envelope> {
        self.set_details(config, false)?;
        self.perform()
    }
}

// =============================================================================
// Bulk Value Helpers
// =============================================================================

fn is_known_key<Op: PostOperation>(key: &str) -> bool {
    let lower = key.to_lowercase();
    matches!(lower.as_str(), "details" | "idempotencykey" | "padding")
        || Op::detail_setter(&lower).is_some()
}

fn wrong_type(field: &str, expected: &str) -> ClientError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("expected {}", expected),
    }
    .into()
}

pub(crate) fn expect_str<'a>(field: &str, value: &'a Value) -> ClientResult<&'a str> {
    value.as_str().ok_or_else(|| wrong_type(field, "a string"))
}

pub(crate) fn optional_str<'a>(field: &str, value: &'a Value) -> ClientResult<Option<&'a str>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(wrong_type(field, "a string or null")),
    }
}

pub(crate) fn expect_bool(field: &str, value: &Value) -> ClientResult<bool> {
    value.as_bool().ok_or_else(|| wrong_type(field, "a boolean"))
}

pub(crate) fn expect_f64(field: &str, value: &Value) -> ClientResult<f64> {
    value.as_f64().ok_or_else(|| wrong_type(field, "a number"))
}

pub(crate) fn expect_array<'a>(field: &str, value: &'a Value) -> ClientResult<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| wrong_type(field, "an array"))
}

// =============================================================================
// Definition Macro
// =============================================================================

/// Declares an operation struct with its state and `Operation` impl.
macro_rules! define_operation {
    ($(#[$meta:meta])* $name:ident, $target:ty, $method:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            state: $crate::operation::OperationState<$target>,
        }

        impl $name {
            pub fn new(target: $target) -> Self {
                $name {
                    state: $crate::operation::OperationState::new(target),
                }
            }
        }

        impl $crate::operation::Operation for $name {
            type Target = $target;
            const METHOD: &'static str = $method;

            fn state(&self) -> &$crate::operation::OperationState<$target> {
                &self.state
            }

            fn state_mut(&mut self) -> &mut $crate::operation::OperationState<$target> {
                &mut self.state
            }
        }
    };
}

pub(crate) use define_operation;
