//! # Value Types
//!
//! Closed enumerations carried on the wire as lowercase string tokens.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Value Types                                     │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Tax        │   │  PaymentType    │   │ MeasurementUnit │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  no             │   │  cash           │   │  piece          │       │
//! │  │  vat0 .. vat20  │   │  electronically │   │  kilogram       │       │
//! │  │  vat105 ..      │   │                 │   │  liter  ...     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Every type accepts: typed value │ wire string │ null (if nullable)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The shared [`WireValue`] trait supplies lookup by token and the permissive
//! [`WireValue::cast`] used when parsing bulk JSON records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};

// =============================================================================
// Wire Value Trait
// =============================================================================

/// A closed set of variants with a stable string token per variant.
pub trait WireValue: Sized + Copy + 'static {
    /// Field name reported in validation errors.
    const FIELD: &'static str;

    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// The wire token for this variant.
    fn as_str(&self) -> &'static str;

    /// Looks up a variant by its exact wire token.
    fn from_wire(token: &str) -> ValidationResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == token)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: Self::FIELD.to_string(),
                value: token.to_string(),
                allowed: Self::ALL.iter().map(|v| v.as_str().to_string()).collect(),
            })
    }

    /// Converts a JSON value into a variant.
    ///
    /// A string is looked up by token. `null` yields `None` when `nullable`
    /// is set and fails otherwise. Anything else fails.
    fn cast(value: &Value, nullable: bool) -> ValidationResult<Option<Self>> {
        match value {
            Value::String(token) => Self::from_wire(token).map(Some),
            Value::Null if nullable => Ok(None),
            Value::Null => Err(ValidationError::Required {
                field: Self::FIELD.to_string(),
            }),
            other => Err(ValidationError::invalid_format(
                Self::FIELD,
                format!("expected a string token, got {}", other),
            )),
        }
    }
}

/// Implements `Display`, `FromStr` and `TryFrom<&str>` on top of `WireValue`.
macro_rules! wire_conversions {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as WireValue>::from_wire(s)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = ValidationError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                <$ty as WireValue>::from_wire(s)
            }
        }

        impl TryFrom<&String> for $ty {
            type Error = ValidationError;

            fn try_from(s: &String) -> Result<Self, Self::Error> {
                <$ty as WireValue>::from_wire(s)
            }
        }
    };
}

// =============================================================================
// Tax
// =============================================================================

/// VAT code of an item or of a whole receipt.
///
/// `Vat105`, `Vat107`, `Vat110` and `Vat120` are the calculated rates
/// (5/105, 7/107, 10/110, 20/120).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tax {
    No,
    Vat0,
    Vat5,
    Vat105,
    Vat7,
    Vat107,
    Vat10,
    Vat110,
    Vat20,
    Vat120,
}

impl WireValue for Tax {
    const FIELD: &'static str = "tax";

    const ALL: &'static [Self] = &[
        Tax::No,
        Tax::Vat0,
        Tax::Vat5,
        Tax::Vat105,
        Tax::Vat7,
        Tax::Vat107,
        Tax::Vat10,
        Tax::Vat110,
        Tax::Vat20,
        Tax::Vat120,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Tax::No => "no",
            Tax::Vat0 => "vat0",
            Tax::Vat5 => "vat5",
            Tax::Vat105 => "vat105",
            Tax::Vat7 => "vat7",
            Tax::Vat107 => "vat107",
            Tax::Vat10 => "vat10",
            Tax::Vat110 => "vat110",
            Tax::Vat20 => "vat20",
            Tax::Vat120 => "vat120",
        }
    }
}

wire_conversions!(Tax);

// =============================================================================
// Payment Type
// =============================================================================

/// How the receipt is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Cash,
    Electronically,
}

impl Default for PaymentType {
    fn default() -> Self {
        PaymentType::Cash
    }
}

impl WireValue for PaymentType {
    const FIELD: &'static str = "payment.type";

    const ALL: &'static [Self] = &[PaymentType::Cash, PaymentType::Electronically];

    fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "cash",
            PaymentType::Electronically => "electronically",
        }
    }
}

wire_conversions!(PaymentType);

// =============================================================================
// Measurement Unit
// =============================================================================

/// Unit of measure printed next to an item quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementUnit {
    Piece,
    Gram,
    Kilogram,
    Ton,
    Centimeter,
    Decimeter,
    Meter,
    SquareCentimeter,
    SquareDecimeter,
    SquareMeter,
    Milliliter,
    Liter,
    CubicMeter,
    KilowattHour,
    Gkal,
    Day,
    Hour,
    Minute,
    Second,
    Kilobyte,
    Megabyte,
    Gigabyte,
    Terabyte,
    Other,
}

impl WireValue for MeasurementUnit {
    const FIELD: &'static str = "unit";

    const ALL: &'static [Self] = &[
        MeasurementUnit::Piece,
        MeasurementUnit::Gram,
        MeasurementUnit::Kilogram,
        MeasurementUnit::Ton,
        MeasurementUnit::Centimeter,
        MeasurementUnit::Decimeter,
        MeasurementUnit::Meter,
        MeasurementUnit::SquareCentimeter,
        MeasurementUnit::SquareDecimeter,
        MeasurementUnit::SquareMeter,
        MeasurementUnit::Milliliter,
        MeasurementUnit::Liter,
        MeasurementUnit::CubicMeter,
        MeasurementUnit::KilowattHour,
        MeasurementUnit::Gkal,
        MeasurementUnit::Day,
        MeasurementUnit::Hour,
        MeasurementUnit::Minute,
        MeasurementUnit::Second,
        MeasurementUnit::Kilobyte,
        MeasurementUnit::Megabyte,
        MeasurementUnit::Gigabyte,
        MeasurementUnit::Terabyte,
        MeasurementUnit::Other,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            MeasurementUnit::Piece => "piece",
            MeasurementUnit::Gram => "gram",
            MeasurementUnit::Kilogram => "kilogram",
            MeasurementUnit::Ton => "ton",
            MeasurementUnit::Centimeter => "centimeter",
            MeasurementUnit::Decimeter => "decimeter",
            MeasurementUnit::Meter => "meter",
            MeasurementUnit::SquareCentimeter => "square_centimeter",
            MeasurementUnit::SquareDecimeter => "square_decimeter",
            MeasurementUnit::SquareMeter => "square_meter",
            MeasurementUnit::Milliliter => "milliliter",
            MeasurementUnit::Liter => "liter",
            MeasurementUnit::CubicMeter => "cubic_meter",
            MeasurementUnit::KilowattHour => "kilowatt_hour",
            MeasurementUnit::Gkal => "gkal",
            MeasurementUnit::Day => "day",
            MeasurementUnit::Hour => "hour",
            MeasurementUnit::Minute => "minute",
            MeasurementUnit::Second => "second",
            MeasurementUnit::Kilobyte => "kilobyte",
            MeasurementUnit::Megabyte => "megabyte",
            MeasurementUnit::Gigabyte => "gigabyte",
            MeasurementUnit::Terabyte => "terabyte",
            MeasurementUnit::Other => "other",
        }
    }
}

wire_conversions!(MeasurementUnit);

// =============================================================================
// Unit Tests
// =============================================================================
