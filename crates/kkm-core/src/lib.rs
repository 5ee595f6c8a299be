//! # kkm-core: Pure Request Rules for the KKM Gateway Client
//!
//! This crate holds everything about a KKM request that can be decided
//! without touching the network: value types, field validation and the
//! details mapping that becomes the JSON body.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     KKM Gateway Client Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/kkm-cli                                 │   │
//! │  │    device status ──► server ping ──► learn ──► bulk sends       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kkm-client                                   │   │
//! │  │    Device / Server ──► Operations ──► Performer ──► HTTPS       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kkm-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  details  │  │ validation│  │   error   │  │   │
//! │  │   │    Tax    │  │  Details  │  │   ranges  │  │ Validation│  │   │
//! │  │   │  Payment  │  │   Item    │  │   titles  │  │   Error   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO RANDOMNESS • PURE FUNCTIONS         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Closed value sets (Tax, PaymentType, MeasurementUnit)
//! - [`details`] - The details mapping and its typed records
//! - [`validation`] - Field rules
//! - [`error`] - Validation error type
//!
//! ## Example Usage
//!
//! ```rust
//! use kkm_core::{Details, Item, Tax};
//!
//! let mut details = Details::new();
//! let item = Item::new("Молоко", 89.90, 2.0).unwrap().with_tax(Tax::Vat10);
//! details.push_item(&item).unwrap();
//!
//! assert_eq!(details.items().len(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod details;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use details::{
    keys, Customer, Details, DocumentBlock, ElectroPaymentInfo, Item, Operator, Payment,
    PaymentSum, Seller, TextBlock, TextSlot,
};
pub use error::{ValidationError, ValidationResult};
pub use types::{MeasurementUnit, PaymentType, Tax, WireValue};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Item title length bounds, in characters.
pub const MIN_TITLE_CHARS: usize = 1;
pub const MAX_TITLE_CHARS: usize = 200;

/// Item price bounds (inclusive).
pub const MIN_ITEM_PRICE: f64 = 0.01;
pub const MAX_ITEM_PRICE: f64 = 999999.99;

/// Item quantity bounds (inclusive).
pub const MIN_ITEM_QUANTITY: f64 = 0.001;
pub const MAX_ITEM_QUANTITY: f64 = 999999.999;

/// Cash-in / cash-out amount bounds (inclusive).
pub const MIN_CASH_SUM: f64 = 0.01;
pub const MAX_CASH_SUM: f64 = 999999.99;
