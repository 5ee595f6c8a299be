//! # Device Target
//!
//! A [`Device`] addresses one cash register behind the gateway by serial
//! number. It hands out typed operations directly (`device.sell()`) or by
//! kind (`device.prepare(DevOp::Sell)`).
//!
//! ```text
//!  DevOp::from_str("full-status")  ──►  DevOp::FullStatus
//!  device.prepare(DevOp::FullStatus) ─►  DeviceOperation::FullStatus(FullStatus)
//!  op.perform()                    ──►  GET https://{host}/kkm/{serial}/full-status
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::conn::ConnParams;
use crate::envelope::Envelope;
use crate::error::{ClientError, ClientResult};
use crate::operation::{GetOperation, Operation, PostOperation, Target};
use crate::operations::device::*;
use crate::performer::{join_segments, Performer};
use crate::transport::HttpTransport;

// =============================================================================
// Device
// =============================================================================

#[derive(Debug, Clone)]
pub struct Device {
    performer: Performer,
}

impl Device {
    /// Fails with `InvalidConfiguration` when `conn` has no serial.
    pub fn new(conn: ConnParams) -> ClientResult<Self> {
        Self::check_serial(&conn)?;
        Ok(Device {
            performer: Performer::new(conn)?,
        })
    }

    pub fn with_transport(conn: ConnParams, transport: Arc<dyn HttpTransport>) -> ClientResult<Self> {
        Self::check_serial(&conn)?;
        Ok(Device {
            performer: Performer::with_transport(conn, transport),
        })
    }

    pub fn from_performer(performer: Performer) -> ClientResult<Self> {
        Self::check_serial(performer.conn_params())?;
        Ok(Device { performer })
    }

    fn check_serial(conn: &ConnParams) -> ClientResult<()> {
        if conn.serial().trim().is_empty() {
            return Err(ClientError::InvalidConfiguration(
                "device serial number is required".into(),
            ));
        }
        Ok(())
    }

    pub fn serial(&self) -> &str {
        self.performer.conn_params().serial()
    }

    /// Creates the operation named by `kind`.
    pub fn prepare(&self, kind: DevOp) -> DeviceOperation {
        let target = self.clone();
        match kind {
            DevOp::Status => DeviceOperation::Status(Status::new(target)),
            DevOp::FullStatus => DeviceOperation::FullStatus(FullStatus::new(target)),
            DevOp::BaseStatus => DeviceOperation::BaseStatus(BaseStatus::new(target)),
            DevOp::CashStat => DeviceOperation::CashStat(CashStat::new(target)),
            DevOp::PrintDemo => DeviceOperation::PrintDemo(PrintDemo::new(target)),
            DevOp::PrintNonFiscalDoc => {
                DeviceOperation::PrintNonFiscalDoc(PrintNonFiscalDoc::new(target))
            }
            DevOp::PrintInfo => DeviceOperation::PrintInfo(PrintInfo::new(target)),
            DevOp::PrintFnRegistrations => {
                DeviceOperation::PrintFnRegistrations(PrintFnRegistrations::new(target))
            }
            DevOp::PrintOfdExchangeStatus => {
                DeviceOperation::PrintOfdExchangeStatus(PrintOfdExchangeStatus::new(target))
            }
            DevOp::PrintOfdTest => DeviceOperation::PrintOfdTest(PrintOfdTest::new(target)),
            DevOp::PrintCloseShiftReports => {
                DeviceOperation::PrintCloseShiftReports(PrintCloseShiftReports::new(target))
            }
            DevOp::PrintLastDocument => {
                DeviceOperation::PrintLastDocument(PrintLastDocument::new(target))
            }
            DevOp::CashIn => DeviceOperation::CashIn(CashIn::new(target)),
            DevOp::CashOut => DeviceOperation::CashOut(CashOut::new(target)),
            DevOp::CloseShift => DeviceOperation::CloseShift(CloseShift::new(target)),
            DevOp::Sell => DeviceOperation::Sell(Sell::new(target)),
            DevOp::SellReturn => DeviceOperation::SellReturn(SellReturn::new(target)),
            DevOp::ReportX => DeviceOperation::ReportX(ReportX::new(target)),
            DevOp::ResetState => DeviceOperation::ResetState(ResetState::new(target)),
        }
    }

    // =========================================================================
    // Typed Factories
    // =========================================================================

    pub fn status(&self) -> Status {
        Status::new(self.clone())
    }

    pub fn full_status(&self) -> FullStatus {
        FullStatus::new(self.clone())
    }

    pub fn base_status(&self) -> BaseStatus {
        BaseStatus::new(self.clone())
    }

    pub fn cash_stat(&self) -> CashStat {
        CashStat::new(self.clone())
    }

    pub fn print_demo(&self) -> PrintDemo {
        PrintDemo::new(self.clone())
    }

    pub fn print_non_fiscal_doc(&self) -> PrintNonFiscalDoc {
        PrintNonFiscalDoc::new(self.clone())
    }

    pub fn print_info(&self) -> PrintInfo {
        PrintInfo::new(self.clone())
    }

    pub fn print_fn_registrations(&self) -> PrintFnRegistrations {
        PrintFnRegistrations::new(self.clone())
    }

    pub fn print_ofd_exchange_status(&self) -> PrintOfdExchangeStatus {
        PrintOfdExchangeStatus::new(self.clone())
    }

    pub fn print_ofd_test(&self) -> PrintOfdTest {
        PrintOfdTest::new(self.clone())
    }

    pub fn print_close_shift_reports(&self) -> PrintCloseShiftReports {
        PrintCloseShiftReports::new(self.clone())
    }

    pub fn print_last_document(&self) -> PrintLastDocument {
        PrintLastDocument::new(self.clone())
    }

    pub fn cash_in(&self) -> CashIn {
        CashIn::new(self.clone())
    }

    pub fn cash_out(&self) -> CashOut {
        CashOut::new(self.clone())
    }

    pub fn close_shift(&self) -> CloseShift {
        CloseShift::new(self.clone())
    }

    pub fn sell(&self) -> Sell {
        Sell::new(self.clone())
    }

    pub fn sell_return(&self) -> SellReturn {
        SellReturn::new(self.clone())
    }

    pub fn report_x(&self) -> ReportX {
        ReportX::new(self.clone())
    }

    pub fn reset_state(&self) -> ResetState {
        ResetState::new(self.clone())
    }
}

impl Target for Device {
    fn performer(&self) -> &Performer {
        &self.performer
    }

    fn method_path(&self, method: &str) -> String {
        join_segments(&["kkm", self.serial(), method])
    }
}

// =============================================================================
// Operation Kind
// =============================================================================

/// Every device operation, by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevOp {
    Status,
    FullStatus,
    BaseStatus,
    CashStat,
    PrintDemo,
    PrintNonFiscalDoc,
    PrintInfo,
    PrintFnRegistrations,
    PrintOfdExchangeStatus,
    PrintOfdTest,
    PrintCloseShiftReports,
    PrintLastDocument,
    CashIn,
    CashOut,
    CloseShift,
    Sell,
    SellReturn,
    ReportX,
    ResetState,
}

impl DevOp {
    pub const ALL: [DevOp; 19] = [
        DevOp::Status,
        DevOp::FullStatus,
        DevOp::BaseStatus,
        DevOp::CashStat,
        DevOp::PrintDemo,
        DevOp::PrintNonFiscalDoc,
        DevOp::PrintInfo,
        DevOp::PrintFnRegistrations,
        DevOp::PrintOfdExchangeStatus,
        DevOp::PrintOfdTest,
        DevOp::PrintCloseShiftReports,
        DevOp::PrintLastDocument,
        DevOp::CashIn,
        DevOp::CashOut,
        DevOp::CloseShift,
        DevOp::Sell,
        DevOp::SellReturn,
        DevOp::ReportX,
        DevOp::ResetState,
    ];

    /// Method name on the wire.
    pub fn method(&self) -> &'static str {
        match self {
            DevOp::Status => Status::METHOD,
            DevOp::FullStatus => FullStatus::METHOD,
            DevOp::BaseStatus => BaseStatus::METHOD,
            DevOp::CashStat => CashStat::METHOD,
            DevOp::PrintDemo => PrintDemo::METHOD,
            DevOp::PrintNonFiscalDoc => PrintNonFiscalDoc::METHOD,
            DevOp::PrintInfo => PrintInfo::METHOD,
            DevOp::PrintFnRegistrations => PrintFnRegistrations::METHOD,
            DevOp::PrintOfdExchangeStatus => PrintOfdExchangeStatus::METHOD,
            DevOp::PrintOfdTest => PrintOfdTest::METHOD,
            DevOp::PrintCloseShiftReports => PrintCloseShiftReports::METHOD,
            DevOp::PrintLastDocument => PrintLastDocument::METHOD,
            DevOp::CashIn => CashIn::METHOD,
            DevOp::CashOut => CashOut::METHOD,
            DevOp::CloseShift => CloseShift::METHOD,
            DevOp::Sell => Sell::METHOD,
            DevOp::SellReturn => SellReturn::METHOD,
            DevOp::ReportX => ReportX::METHOD,
            DevOp::ResetState => ResetState::METHOD,
        }
    }

    /// True for read-only (GET) operations.
    pub fn is_get(&self) -> bool {
        matches!(
            self,
            DevOp::Status | DevOp::FullStatus | DevOp::BaseStatus | DevOp::CashStat
        )
    }
}

impl fmt::Display for DevOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// Folds `full-status`, `full_status` and `FullStatus` to one spelling.
pub(crate) fn fold_kind(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for DevOp {
    type Err = ClientError;

    /// Accepts the wire method name or the variant name, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold_kind(s.trim());
        DevOp::ALL
            .into_iter()
            .find(|op| fold_kind(op.method()) == wanted)
            .ok_or_else(|| ClientError::UnsupportedOperation(s.to_string()))
    }
}

// =============================================================================
// Prepared Operation
// =============================================================================

/// Any device operation, as returned by [`Device::prepare`].
#[derive(Debug, Clone)]
pub enum DeviceOperation {
    Status(Status),
    FullStatus(FullStatus),
    BaseStatus(BaseStatus),
    CashStat(CashStat),
    PrintDemo(PrintDemo),
    PrintNonFiscalDoc(PrintNonFiscalDoc),
    PrintInfo(PrintInfo),
    PrintFnRegistrations(PrintFnRegistrations),
    PrintOfdExchangeStatus(PrintOfdExchangeStatus),
    PrintOfdTest(PrintOfdTest),
    PrintCloseShiftReports(PrintCloseShiftReports),
    PrintLastDocument(PrintLastDocument),
    CashIn(CashIn),
    CashOut(CashOut),
    CloseShift(CloseShift),
    Sell(Sell),
    SellReturn(SellReturn),
    ReportX(ReportX),
    ResetState(ResetState),
}

/// Runs `$get` for read-only variants and `$post` for mutating ones.
macro_rules! dispatch {
    ($value:expr, get |$g:ident| $get:expr, post |$p:ident| $post:expr) => {
        match $value {
            DeviceOperation::Status($g) => $get,
            DeviceOperation::FullStatus($g) => $get,
            DeviceOperation::BaseStatus($g) => $get,
            DeviceOperation::CashStat($g) => $get,
            DeviceOperation::PrintDemo($p) => $post,
            DeviceOperation::PrintNonFiscalDoc($p) => $post,
            DeviceOperation::PrintInfo($p) => $post,
            DeviceOperation::PrintFnRegistrations($p) => $post,
            DeviceOperation::PrintOfdExchangeStatus($p) => $post,
            DeviceOperation::PrintOfdTest($p) => $post,
            DeviceOperation::PrintCloseShiftReports($p) => $post,
            DeviceOperation::PrintLastDocument($p) => $post,
            DeviceOperation::CashIn($p) => $post,
            DeviceOperation::CashOut($p) => $post,
            DeviceOperation::CloseShift($p) => $post,
            DeviceOperation::Sell($p) => $post,
            DeviceOperation::SellReturn($p) => $post,
            DeviceOperation::ReportX($p) => $post,
            DeviceOperation::ResetState($p) => $post,
        }
    };
}

impl DeviceOperation {
    pub fn method(&self) -> &'static str {
        dispatch!(self, get |op| method_of(op), post |op| method_of(op))
    }

    pub fn method_path(&self) -> String {
        dispatch!(self, get |op| op.method_path(), post |op| op.method_path())
    }

    pub fn is_get(&self) -> bool {
        dispatch!(self, get |_op| true, post |_op| false)
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        dispatch!(self, get |op| op.idempotency_key(), post |op| op.idempotency_key())
    }

    pub fn set_idempotency_key(&mut self, key: Option<&str>) -> &mut Self {
        dispatch!(
            self,
            get |op| {
                op.set_idempotency_key(key);
            },
            post |op| {
                op.set_idempotency_key(key);
            }
        );
        self
    }

    /// Bulk merge. Read-only operations accept no keys.
    pub fn set_details(
        &mut self,
        details: &Map<String, Value>,
        ignore_unknown: bool,
    ) -> ClientResult<&mut Self> {
        let method = self.method();
        dispatch!(
            self,
            get |_op| reject_details(method, details, ignore_unknown)?,
            post |op| {
                op.set_details(details, ignore_unknown)?;
            }
        );
        Ok(self)
    }

    /// Read-only operations never fail locally.
    pub fn perform(&self) -> ClientResult<Envelope> {
        dispatch!(self, get |op| Ok(op.perform()), post |op| op.perform())
    }
}

fn method_of<Op: Operation>(_op: &Op) -> &'static str {
    Op::METHOD
}

/// Get operations have no details; any key is unknown to them.
pub(crate) fn reject_details(
    method: &'static str,
    details: &Map<String, Value>,
    ignore_unknown: bool,
) -> ClientResult<()> {
    if ignore_unknown {
        return Ok(());
    }
    match details
        .keys()
        .find(|key| !key.eq_ignore_ascii_case("details"))
    {
        Some(key) => Err(ClientError::UnknownDetailKey {
            method,
            key: key.clone(),
        }),
        None => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use serde_json::json;

    fn device(mock: &Arc<MockTransport>) -> Device {
        Device::with_transport(ConnParams::new("h:1", "s", "42"), mock.clone()).unwrap()
    }

    #[test]
    fn test_device_requires_serial() {
        let err = Device::with_transport(
            ConnParams::new("h", "s", ""),
            Arc::new(MockTransport::ok()),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfiguration(_)));
        assert!(Device::new(ConnParams::new("h", "s", "  ")).is_err());
    }

    #[test]
    fn test_from_performer_shares_transport() {
        let mock = Arc::new(MockTransport::ok());
        let performer = Performer::with_transport(ConnParams::new("h:1", "s", "42"), mock.clone());
        let device = Device::from_performer(performer).unwrap();
        device.status().perform();
        assert_eq!(mock.last_request().unwrap().url, "https://h:1/kkm/42/status");

        let no_serial = Performer::with_transport(ConnParams::new("h:1", "s", " "), mock.clone());
        assert!(matches!(
            Device::from_performer(no_serial),
            Err(ClientError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_dev_op_parsing() {
        assert_eq!("full-status".parse::<DevOp>().unwrap(), DevOp::FullStatus);
        assert_eq!("FullStatus".parse::<DevOp>().unwrap(), DevOp::FullStatus);
        assert_eq!("print_ofd_test".parse::<DevOp>().unwrap(), DevOp::PrintOfdTest);
        assert_eq!("Report-X".parse::<DevOp>().unwrap(), DevOp::ReportX);

        let err = "print-magic".parse::<DevOp>().unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedOperation(ref s) if s == "print-magic"));
    }

    #[test]
    fn test_every_kind_prepares_matching_method() {
        let mock = Arc::new(MockTransport::ok());
        let device = device(&mock);
        for kind in DevOp::ALL {
            let op = device.prepare(kind);
            assert_eq!(op.method(), kind.method());
            assert_eq!(op.is_get(), kind.is_get());
            assert_eq!(op.method_path(), format!("kkm/42/{}", kind));
        }
    }

    #[test]
    fn test_prepared_get_performs_without_key() {
        let mock = Arc::new(MockTransport::ok());
        let envelope = device(&mock).prepare(DevOp::CashStat).perform().unwrap();
        assert_eq!(envelope.http_status(), 200);
        assert_eq!(mock.last_request().unwrap().url, "https://h:1/kkm/42/cash-stat");
    }

    #[test]
    fn test_prepared_post_requires_key() {
        let mock = Arc::new(MockTransport::ok());
        let mut op = device(&mock).prepare(DevOp::CashIn);
        let bulk = json!({"cashSum": 10.0});
        let Value::Object(bulk) = bulk else { unreachable!() };

        op.set_details(&bulk, false).unwrap();
        assert!(matches!(
            op.perform(),
            Err(ClientError::MissingIdempotencyKey("cash-in"))
        ));

        op.set_idempotency_key(None);
        assert!(op.perform().is_ok());
        assert_eq!(mock.last_body(), json!({"cashSum": 10.0}));
    }

    #[test]
    fn test_prepared_get_rejects_details() {
        let mock = Arc::new(MockTransport::ok());
        let mut op = device(&mock).prepare(DevOp::Status);
        let Value::Object(bulk) = json!({"cashSum": 10.0}) else { unreachable!() };

        assert!(op.set_details(&bulk, false).is_err());
        assert!(op.set_details(&bulk, true).is_ok());
    }
}
