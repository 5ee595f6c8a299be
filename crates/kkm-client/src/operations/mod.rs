//! Concrete operations, one struct per gateway method.
//!
//! - [`device`] - `kkm/{serial}/...` methods
//! - [`server`] - gateway-level methods

pub mod device;
pub mod server;
