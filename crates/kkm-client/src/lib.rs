//! # kkm-client: HTTPS Client for the KKM Gateway
//!
//! Builds device and server operations, validates their details eagerly and
//! sends each one as a single HTTPS exchange with the gateway.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          One perform() Call                             │
//! │                                                                         │
//! │  Device / Server ──► Operation ──► Performer ──► HttpTransport          │
//! │  (factory or         (details,      (X-Secret,     (reqwest,           │
//! │   prepare(kind))      key)           key, timing)   blocking)          │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                                      Envelope                           │
//! │                      {!httpStatus, !origin, !elapsedTime, ...}          │
//! │                                                                         │
//! │  Local mistakes (validation, missing key, unknown kind) → ClientError  │
//! │  Network and gateway failures                           → Envelope     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`device`] / [`server`] - Addressing targets and kind dispatch
//! - [`operation`] - Get / Post operation contracts
//! - [`capabilities`] - Per-operation detail setters
//! - [`operations`] - Concrete operations
//! - [`performer`] - Request assembly and envelope normalization
//! - [`transport`] - HTTP seam and the reqwest implementation
//! - [`envelope`] - Normalized response record
//! - [`config`] - `kkm.toml` profile
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kkm_client::prelude::*;
//! use kkm_client::{ConnParams, Device};
//!
//! let device = Device::new(ConnParams::new("127.11.22.33:5757", "secret", "11111111111111"))?;
//!
//! let status = device.status().perform();
//! println!("{}", status);
//!
//! let mut sell = device.sell();
//! sell.set_operator("Оператор", None)?
//!     .add_taxed_item("Молоко", 89.90, 2.0, "vat10")?
//!     .set_payment("cash", None)?
//!     .set_idempotency_key(None);
//! let receipt = sell.perform()?;
//! println!("{}", receipt);
//! # Ok::<(), kkm_client::ClientError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod capabilities;
pub mod config;
pub mod conn;
pub mod device;
pub mod envelope;
pub mod error;
pub mod idempotency;
pub mod operation;
pub mod operations;
pub mod performer;
pub mod server;
pub mod transport;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::KkmConfig;
pub use conn::ConnParams;
pub use device::{DevOp, Device, DeviceOperation};
pub use envelope::Envelope;
pub use error::{ClientError, ClientResult};
pub use operation::{GetOperation, Operation, PostOperation};
pub use performer::Performer;
pub use server::{Server, ServerOperation, SrvOp};
pub use transport::{HttpTransport, ReqwestTransport};

pub use kkm_core;

/// Operation traits and capability setters in one import.
pub mod prelude {
    pub use crate::capabilities::{
        CashSumDetails, CloseDetails, DocumentDetails, ElectronicallyDetails, LearnDetails,
        OperatorDetails, ReceiptDetails, ReportDetails,
    };
    pub use crate::operation::{GetOperation, Operation, PostOperation};
}
