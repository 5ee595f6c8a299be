//! # Validation Module
//!
//! Field rules enforced before any value is written into [`Details`].
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field            Rule                                                  │
//! │  ───────────────  ──────────────────────────────────────────────────    │
//! │  item.title       1..=200 characters (Unicode scalar values)            │
//! │  item.price       0.01..=999999.99                                      │
//! │  item.quantity    0.001..=999999.999                                    │
//! │  cashSum          0.01..=999999.99                                      │
//! │  operator.name    non-empty after trimming                              │
//! │  payment.sum      finite number (or "auto")                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ranges are checked with `RangeInclusive::contains`, so `NaN` never passes.
//!
//! [`Details`]: crate::details::Details

use crate::error::{ValidationError, ValidationResult};
use crate::{
    MAX_CASH_SUM, MAX_ITEM_PRICE, MAX_ITEM_QUANTITY, MAX_TITLE_CHARS, MIN_CASH_SUM,
    MIN_ITEM_PRICE, MIN_ITEM_QUANTITY, MIN_TITLE_CHARS,
};

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item title by character count.
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let len = title.chars().count();

    if len < MIN_TITLE_CHARS {
        return Err(ValidationError::TooShort {
            field: "title".to_string(),
            min: MIN_TITLE_CHARS,
        });
    }

    if len > MAX_TITLE_CHARS {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_CHARS,
        });
    }

    Ok(())
}

/// Validates and normalizes an operator name.
///
/// ## Returns
/// The trimmed name.
pub fn validate_operator_name(name: &str) -> ValidationResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "operator.name".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Checks `value` against an inclusive range.
pub fn validate_range(field: &str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value,
        })
    }
}

pub fn validate_price(price: f64) -> ValidationResult<()> {
    validate_range("price", price, MIN_ITEM_PRICE, MAX_ITEM_PRICE)
}

pub fn validate_quantity(quantity: f64) -> ValidationResult<()> {
    validate_range("quantity", quantity, MIN_ITEM_QUANTITY, MAX_ITEM_QUANTITY)
}

pub fn validate_cash_sum(sum: f64) -> ValidationResult<()> {
    validate_range("cashSum", sum, MIN_CASH_SUM, MAX_CASH_SUM)
}

/// Explicit payment sums only need to be representable in JSON.
pub fn validate_payment_sum(sum: f64) -> ValidationResult<()> {
    if sum.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::invalid_format(
            "payment.sum",
            "must be a finite number",
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Товар").is_ok());
        assert!(validate_title(&"я".repeat(200)).is_ok());

        assert!(matches!(
            validate_title(""),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_title(&"я".repeat(201)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        // 200 Cyrillic letters are 400 bytes
        let title = "ж".repeat(200);
        assert_eq!(title.len(), 400);
        assert!(validate_title(&title).is_ok());
    }

    #[test]
    fn test_validate_price_bounds() {
        assert!(validate_price(0.01).is_ok());
        assert!(validate_price(999999.99).is_ok());

        assert!(validate_price(0.0).is_err());
        assert!(validate_price(1000000.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert!(validate_quantity(0.001).is_ok());
        assert!(validate_quantity(999999.999).is_ok());

        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-1.0).is_err());
        assert!(validate_quantity(1000000.0).is_err());
    }

    #[test]
    fn test_validate_cash_sum_bounds() {
        assert!(validate_cash_sum(100.0).is_ok());
        assert!(validate_cash_sum(0.0).is_err());
        assert!(validate_cash_sum(1000000.0).is_err());
    }

    #[test]
    fn test_validate_operator_name() {
        assert_eq!(validate_operator_name("  Иванов ").unwrap(), "Иванов");
        assert!(matches!(
            validate_operator_name("   "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_payment_sum() {
        assert!(validate_payment_sum(0.0).is_ok());
        assert!(validate_payment_sum(f64::INFINITY).is_err());
    }
}
