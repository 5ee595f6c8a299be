//! # Server Target
//!
//! A [`Server`] addresses the gateway itself. The serial number of the
//! connection descriptor is ignored.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::conn::ConnParams;
use crate::device::{fold_kind, reject_details};
use crate::envelope::Envelope;
use crate::error::{ClientError, ClientResult};
use crate::operation::{GetOperation, Operation, PostOperation, Target};
use crate::operations::server::{Learn, Ping, ResetRegistry};
use crate::performer::{normalize_path, Performer};
use crate::transport::HttpTransport;

// =============================================================================
// Server
// =============================================================================

#[derive(Debug, Clone)]
pub struct Server {
    performer: Performer,
}

impl Server {
    pub fn new(conn: ConnParams) -> ClientResult<Self> {
        Ok(Server {
            performer: Performer::new(conn)?,
        })
    }

    pub fn with_transport(conn: ConnParams, transport: Arc<dyn HttpTransport>) -> Self {
        Server {
            performer: Performer::with_transport(conn, transport),
        }
    }

    pub fn from_performer(performer: Performer) -> Self {
        Server { performer }
    }

    pub fn prepare(&self, kind: SrvOp) -> ServerOperation {
        match kind {
            SrvOp::Ping => ServerOperation::Ping(self.ping()),
            SrvOp::Learn => ServerOperation::Learn(self.learn()),
            SrvOp::ResetRegistry => ServerOperation::ResetRegistry(self.reset_registry()),
        }
    }

    pub fn ping(&self) -> Ping {
        Ping::new(self.clone())
    }

    pub fn learn(&self) -> Learn {
        Learn::new(self.clone())
    }

    pub fn reset_registry(&self) -> ResetRegistry {
        ResetRegistry::new(self.clone())
    }
}

impl Target for Server {
    fn performer(&self) -> &Performer {
        &self.performer
    }

    fn method_path(&self, method: &str) -> String {
        normalize_path(method)
    }
}

// =============================================================================
// Operation Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SrvOp {
    Ping,
    Learn,
    ResetRegistry,
}

impl SrvOp {
    pub const ALL: [SrvOp; 3] = [SrvOp::Ping, SrvOp::Learn, SrvOp::ResetRegistry];

    pub fn method(&self) -> &'static str {
        match self {
            SrvOp::Ping => Ping::METHOD,
            SrvOp::Learn => Learn::METHOD,
            SrvOp::ResetRegistry => ResetRegistry::METHOD,
        }
    }

    pub fn is_get(&self) -> bool {
        matches!(self, SrvOp::Ping)
    }
}

impl fmt::Display for SrvOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

impl FromStr for SrvOp {
    type Err = ClientError;

    /// Accepts `learn`, `kkm/learn`, `ResetRegistry`, `reset-registry`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = normalize_path(s.trim());
        let bare = trimmed.strip_prefix("kkm/").unwrap_or(&trimmed);
        let wanted = fold_kind(bare);
        SrvOp::ALL
            .into_iter()
            .find(|op| {
                let method = op.method();
                fold_kind(method.strip_prefix("kkm/").unwrap_or(method)) == wanted
            })
            .ok_or_else(|| ClientError::UnsupportedOperation(s.to_string()))
    }
}

// =============================================================================
// Prepared Operation
// =============================================================================

#[derive(Debug, Clone)]
pub enum ServerOperation {
    Ping(Ping),
    Learn(Learn),
    ResetRegistry(ResetRegistry),
}

impl ServerOperation {
    pub fn method(&self) -> &'static str {
        match self {
            ServerOperation::Ping(_) => Ping::METHOD,
            ServerOperation::Learn(_) => Learn::METHOD,
            ServerOperation::ResetRegistry(_) => ResetRegistry::METHOD,
        }
    }

    pub fn method_path(&self) -> String {
        match self {
            ServerOperation::Ping(op) => op.method_path(),
            ServerOperation::Learn(op) => op.method_path(),
            ServerOperation::ResetRegistry(op) => op.method_path(),
        }
    }

    pub fn is_get(&self) -> bool {
        matches!(self, ServerOperation::Ping(_))
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        match self {
            ServerOperation::Ping(op) => op.idempotency_key(),
            ServerOperation::Learn(op) => op.idempotency_key(),
            ServerOperation::ResetRegistry(op) => op.idempotency_key(),
        }
    }

    pub fn set_idempotency_key(&mut self, key: Option<&str>) -> &mut Self {
        match self {
            ServerOperation::Ping(op) => {
                op.set_idempotency_key(key);
            }
            ServerOperation::Learn(op) => {
                op.set_idempotency_key(key);
            }
            ServerOperation::ResetRegistry(op) => {
                op.set_idempotency_key(key);
            }
        }
        self
    }

    pub fn set_details(
        &mut self,
        details: &Map<String, Value>,
        ignore_unknown: bool,
    ) -> ClientResult<&mut Self> {
        match self {
            ServerOperation::Ping(_) => reject_details(Ping::METHOD, details, ignore_unknown)?,
            ServerOperation::Learn(op) => {
                op.set_details(details, ignore_unknown)?;
            }
            ServerOperation::ResetRegistry(op) => {
                op.set_details(details, ignore_unknown)?;
            }
        }
        Ok(self)
    }

    pub fn perform(&self) -> ClientResult<Envelope> {
        match self {
            ServerOperation::Ping(op) => Ok(op.perform()),
            ServerOperation::Learn(op) => op.perform(),
            ServerOperation::ResetRegistry(op) => op.perform(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srv_op_parsing() {
        assert_eq!("ping".parse::<SrvOp>().unwrap(), SrvOp::Ping);
        assert_eq!("kkm/learn".parse::<SrvOp>().unwrap(), SrvOp::Learn);
        assert_eq!("Learn".parse::<SrvOp>().unwrap(), SrvOp::Learn);
        assert_eq!("reset-registry".parse::<SrvOp>().unwrap(), SrvOp::ResetRegistry);
        assert_eq!("ResetRegistry".parse::<SrvOp>().unwrap(), SrvOp::ResetRegistry);
        assert!(matches!(
            "reboot".parse::<SrvOp>(),
            Err(ClientError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_from_performer_shares_transport() {
        let mock = Arc::new(crate::testing::MockTransport::ok());
        let conn = ConnParams::new("h:1", "s", "");
        let server = Server::from_performer(Performer::with_transport(conn, mock.clone()));
        server.ping().perform();
        assert_eq!(mock.last_request().unwrap().url, "https://h:1/ping");
    }

    #[test]
    fn test_prepare_matches_kind() {
        let server = Server::with_transport(
            ConnParams::new("h", "s", ""),
            Arc::new(crate::testing::MockTransport::ok()),
        );
        for kind in SrvOp::ALL {
            let op = server.prepare(kind);
            assert_eq!(op.method(), kind.method());
            assert_eq!(op.method_path(), kind.method());
            assert_eq!(op.is_get(), kind.is_get());
        }
    }
}
