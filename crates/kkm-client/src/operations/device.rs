//! # Device Operations
//!
//! ```text
//! ┌──────────────────────────────┬──────┬────────────────────────────────┐
//! │ Method                       │ Verb │ Details                        │
//! ├──────────────────────────────┼──────┼────────────────────────────────┤
//! │ status, full-status,         │ GET  │ -                              │
//! │ base-status, cash-stat       │      │                                │
//! │ print-demo, print-info,      │ POST │ electronically                 │
//! │ print-fn-registrations, ...  │      │                                │
//! │ print-non-fiscal-doc         │ POST │ document, cliche/footer/margin │
//! │ cash-in, cash-out            │ POST │ operator, cashSum              │
//! │ sell, sell-return            │ POST │ operator, receipt              │
//! │ close-shift                  │ POST │ operator, cashOut              │
//! │ report-x, reset-state        │ POST │ operator, cashOut, closeShift  │
//! └──────────────────────────────┴──────┴────────────────────────────────┘
//! ```

use crate::capabilities::{
    cash_sum_setter, close_setter, document_setter, electronically_setter, operator_setter,
    receipt_setter, report_setter, CashSumDetails, CloseDetails, DocumentDetails,
    ElectronicallyDetails, OperatorDetails, ReceiptDetails, ReportDetails,
};
use crate::device::Device;
use crate::operation::{define_operation, DetailSetter, GetOperation, PostOperation};

// =============================================================================
// Status Queries (GET)
// =============================================================================

define_operation!(
    /// Short device status.
    Status, Device, "status"
);
define_operation!(
    /// Extended device status, including FN and OFD state.
    FullStatus, Device, "full-status"
);
define_operation!(
    /// Minimal status, answered without querying the fiscal storage.
    BaseStatus, Device, "base-status"
);
define_operation!(
    /// Drawer balance and shift counters.
    CashStat, Device, "cash-stat"
);

impl GetOperation for Status {}
impl GetOperation for FullStatus {}
impl GetOperation for BaseStatus {}
impl GetOperation for CashStat {}

// =============================================================================
// Print Jobs (POST)
// =============================================================================

define_operation!(PrintDemo, Device, "print-demo");
define_operation!(PrintInfo, Device, "print-info");
define_operation!(PrintFnRegistrations, Device, "print-fn-registrations");
define_operation!(PrintOfdExchangeStatus, Device, "print-ofd-exchange-status");
define_operation!(PrintOfdTest, Device, "print-ofd-test");
define_operation!(PrintCloseShiftReports, Device, "print-close-shift-reports");
define_operation!(PrintLastDocument, Device, "print-last-document");

/// Post operations whose only operation-specific key is `electronically`.
macro_rules! plain_post {
    ($($name:ident),+ $(,)?) => {
        $(
            impl ElectronicallyDetails for $name {}

            impl PostOperation for $name {
                fn detail_setter(key: &str) -> Option<DetailSetter<Self>> {
                    electronically_setter(key)
                }
            }
        )+
    };
}

plain_post!(
    PrintDemo,
    PrintInfo,
    PrintFnRegistrations,
    PrintOfdExchangeStatus,
    PrintOfdTest,
    PrintCloseShiftReports,
    PrintLastDocument,
);

define_operation!(
    /// Free-form text document printed outside the fiscal flow.
    PrintNonFiscalDoc, Device, "print-non-fiscal-doc"
);

impl DocumentDetails for PrintNonFiscalDoc {}
impl ElectronicallyDetails for PrintNonFiscalDoc {}

impl PostOperation for PrintNonFiscalDoc {
    fn detail_setter(key: &str) -> Option<DetailSetter<Self>> {
        document_setter(key).or_else(|| electronically_setter(key))
    }
}

// =============================================================================
// Cash Movements (POST)
// =============================================================================

define_operation!(CashIn, Device, "cash-in");
define_operation!(CashOut, Device, "cash-out");

macro_rules! cash_movement {
    ($($name:ident),+) => {
        $(
            impl OperatorDetails for $name {}
            impl CashSumDetails for $name {}
            impl ElectronicallyDetails for $name {}

            impl PostOperation for $name {
                fn detail_setter(key: &str) -> Option<DetailSetter<Self>> {
                    operator_setter(key)
                        .or_else(|| cash_sum_setter(key))
                        .or_else(|| electronically_setter(key))
                }
            }
        )+
    };
}

cash_movement!(CashIn, CashOut);

// =============================================================================
// Receipts (POST)
// =============================================================================

define_operation!(Sell, Device, "sell");
define_operation!(SellReturn, Device, "sell-return");

macro_rules! receipt {
    ($($name:ident),+) => {
        $(
            impl OperatorDetails for $name {}
            impl ReceiptDetails for $name {}
            impl ElectronicallyDetails for $name {}

            impl PostOperation for $name {
                fn detail_setter(key: &str) -> Option<DetailSetter<Self>> {
                    operator_setter(key)
                        .or_else(|| receipt_setter(key))
                        .or_else(|| electronically_setter(key))
                }
            }
        )+
    };
}

receipt!(Sell, SellReturn);

// =============================================================================
// Shift Closing & Reports (POST)
// =============================================================================

define_operation!(CloseShift, Device, "close-shift");

impl OperatorDetails for CloseShift {}
impl CloseDetails for CloseShift {}
impl ElectronicallyDetails for CloseShift {}

impl PostOperation for CloseShift {
    fn detail_setter(key: &str) -> Option<DetailSetter<Self>> {
        operator_setter(key)
            .or_else(|| close_setter(key))
            .or_else(|| electronically_setter(key))
    }
}

define_operation!(ReportX, Device, "report-x");
define_operation!(ResetState, Device, "reset-state");

macro_rules! report {
    ($($name:ident),+) => {
        $(
            impl OperatorDetails for $name {}
            impl CloseDetails for $name {}
            impl ReportDetails for $name {}
            impl ElectronicallyDetails for $name {}

            impl PostOperation for $name {
                fn detail_setter(key: &str) -> Option<DetailSetter<Self>> {
                    operator_setter(key)
                        .or_else(|| report_setter(key))
                        .or_else(|| electronically_setter(key))
                }
            }
        )+
    };
}

report!(ReportX, ResetState);

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kkm_core::{Customer, Item, Operator, PaymentType, Tax, TextBlock, ValidationError};
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::conn::ConnParams;
    use crate::error::ClientError;
    use crate::operation::Operation;
    use crate::performer::IDEMPOTENCY_KEY_HEADER;
    use crate::testing::MockTransport;

    fn device(mock: &Arc<MockTransport>) -> Device {
        Device::with_transport(
            ConnParams::new("127.11.22.33:5757", "lorem.ipsum", "11111111111111"),
            mock.clone(),
        )
        .unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    // -------------------------------------------------------------------------
    // Paths and verbs
    // -------------------------------------------------------------------------

    #[test]
    fn test_device_method_paths() {
        let mock = Arc::new(MockTransport::ok());
        let device = device(&mock);
        assert_eq!(device.status().method_path(), "kkm/11111111111111/status");
        assert_eq!(
            device.print_non_fiscal_doc().method_path(),
            "kkm/11111111111111/print-non-fiscal-doc"
        );
    }

    #[test]
    fn test_get_generates_key_per_call() {
        let mock = Arc::new(MockTransport::ok());
        let status = device(&mock).full_status();
        status.perform();
        status.perform();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        let first = requests[0].header(IDEMPOTENCY_KEY_HEADER).unwrap();
        let second = requests[1].header(IDEMPOTENCY_KEY_HEADER).unwrap();
        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
        assert!(requests[0].body.is_none());
    }

    // -------------------------------------------------------------------------
    // Idempotency
    // -------------------------------------------------------------------------

    #[test]
    fn test_post_without_key_fails() {
        let mock = Arc::new(MockTransport::ok());
        let err = device(&mock).print_demo().perform().unwrap_err();
        assert!(matches!(err, ClientError::MissingIdempotencyKey("print-demo")));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_generated_key_is_reused_across_performs() {
        let mock = Arc::new(MockTransport::ok());
        let mut op = device(&mock).print_info();
        op.set_idempotency_key(None);
        let key = op.idempotency_key().unwrap().to_string();
        assert_eq!(key.len(), 64);

        op.perform().unwrap();
        op.perform().unwrap();
        for request in mock.requests() {
            assert_eq!(request.header(IDEMPOTENCY_KEY_HEADER), Some(key.as_str()));
        }
    }

    #[test]
    fn test_pinned_key_is_sent_until_changed() {
        let mock = Arc::new(MockTransport::ok());
        let mut op = device(&mock).print_last_document();
        op.set_idempotency_key(Some("replay-1"));

        let envelope = op.perform().unwrap();
        op.perform().unwrap();
        assert_eq!(envelope.http_status(), 200);
        assert!(envelope.get("!success").is_none());

        op.set_idempotency_key(Some("replay-2"));
        op.perform().unwrap();

        let keys: Vec<_> = mock
            .requests()
            .iter()
            .map(|r| r.header(IDEMPOTENCY_KEY_HEADER).map(str::to_string))
            .collect();
        assert_eq!(
            keys,
            vec![
                Some("replay-1".to_string()),
                Some("replay-1".to_string()),
                Some("replay-2".to_string())
            ]
        );
    }

    #[test]
    fn test_blank_pinned_key_is_missing() {
        let mock = Arc::new(MockTransport::ok());
        let mut cash_in = device(&mock).cash_in();
        cash_in.set_cash_sum(10.0).unwrap();

        for blank in ["", "   "] {
            cash_in.set_idempotency_key(Some(blank));
            assert!(matches!(
                cash_in.perform(),
                Err(ClientError::MissingIdempotencyKey("cash-in"))
            ));
        }
        assert!(mock.requests().is_empty());
    }

    // -------------------------------------------------------------------------
    // Receipt setters
    // -------------------------------------------------------------------------

    #[test]
    fn test_failed_item_leaves_items_unchanged() {
        let mock = Arc::new(MockTransport::ok());
        let mut sell = device(&mock).sell();
        sell.add_item("Товар", 10.0, 1.0).unwrap();

        assert!(sell.add_item("Товар", 0.0, 1.0).is_err());
        assert!(sell.add_item("Товар", 10.0, 1000000.0).is_err());
        assert!(sell.add_item(&"x".repeat(201), 10.0, 1.0).is_err());

        assert_eq!(sell.details().items().len(), 1);
    }

    #[test]
    fn test_set_items_appends() {
        let mock = Arc::new(MockTransport::ok());
        let mut sell = device(&mock).sell();
        sell.add_item("A", 1.0, 1.0).unwrap();
        sell.set_items(&[
            Item::new("B", 2.0, 1.0).unwrap(),
            Item::new("C", 3.0, 1.0).unwrap(),
        ])
        .unwrap();

        let titles: Vec<&str> = sell
            .details()
            .items()
            .iter()
            .map(|item| item["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_bulk_items_with_bad_entry_append_nothing() {
        let mock = Arc::new(MockTransport::ok());
        let mut sell = device(&mock).sell();
        let bulk = object(json!({
            "items": [
                {"title": "A", "price": 1.0},
                {"title": "B", "price": 0.0}
            ]
        }));
        assert!(sell.set_details(&bulk, false).is_err());
        assert!(sell.details().items().is_empty());
    }

    #[test]
    fn test_operator_discrete_and_record_are_identical() {
        let mock = Arc::new(MockTransport::ok());
        let device = device(&mock);

        let mut discrete = device.sell();
        discrete.set_operator("Иванов", Some("770000000000")).unwrap();

        let mut record = device.sell();
        record
            .set_operator_record(&Operator::new("Иванов", Some("770000000000")).unwrap())
            .unwrap();

        assert_eq!(discrete.details(), record.details());
        assert!(discrete.set_operator("  ", None).is_err());
    }

    #[test]
    fn test_tax_typed_and_string_are_identical() {
        let mock = Arc::new(MockTransport::ok());
        let device = device(&mock);

        let mut typed = device.sell();
        typed.set_tax(Tax::Vat20).unwrap();
        let mut wire = device.sell();
        wire.set_tax("vat20").unwrap();

        assert_eq!(typed.details(), wire.details());

        let err = wire.set_tax("vat21").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_payment_and_customer() {
        let mock = Arc::new(MockTransport::ok());
        let mut sell = device(&mock).sell();
        sell.set_payment("electronically", None)
            .unwrap()
            .set_customer(None, Some("+79876543210"), None)
            .unwrap();

        assert_eq!(
            sell.details().get("payment"),
            Some(&json!({"type": "electronically", "sum": "auto"}))
        );
        assert_eq!(
            sell.details().get("customer"),
            Some(&json!({"contact": "+79876543210"}))
        );
        assert!(sell.set_payment("card", Some(10.0)).is_err());
    }

    #[test]
    fn test_text_slots() {
        let mock = Arc::new(MockTransport::ok());
        let mut sell = device(&mock).sell_return();
        sell.set_header_text(TextBlock::new("Возврат").with_magnified(true))
            .unwrap()
            .set_footer_text("  Спасибо  ")
            .unwrap();

        assert_eq!(sell.details().get("headerText").unwrap()["magnified"], json!(true));
        assert_eq!(sell.details().get("footerText").unwrap()["content"], json!("Спасибо"));

        sell.set_footer_text("").unwrap();
        assert!(sell.details().get("footerText").is_none());
    }

    // -------------------------------------------------------------------------
    // Bulk configuration
    // -------------------------------------------------------------------------

    #[test]
    fn test_bulk_config_matches_discrete_setters_on_the_wire() {
        let discrete_mock = Arc::new(MockTransport::ok());
        let mut discrete = device(&discrete_mock).sell();
        discrete
            .set_idempotency_key(Some("k-1"))
            .set_operator("Иванов", None)
            .unwrap()
            .add_taxed_item("Молоко", 89.9, 2.0, Tax::Vat10)
            .unwrap()
            .set_payment(PaymentType::Cash, Some(200.0))
            .unwrap()
            .set_customer_record(&Customer::new(Some("123"), None, None))
            .unwrap();
        discrete.perform().unwrap();

        let bulk_mock = Arc::new(MockTransport::ok());
        let mut bulk = device(&bulk_mock).sell();
        bulk.perform_with(&object(json!({
            "IdempotencyKey": "k-1",
            "operator": {"name": "Иванов"},
            "items": [{"title": "Молоко", "price": 89.9, "quantity": 2.0, "tax": "vat10"}],
            "payment": {"type": "cash", "sum": 200.0},
            "customer": {"account": "123"}
        })))
        .unwrap();

        assert_eq!(discrete_mock.last_body(), bulk_mock.last_body());
        assert_eq!(
            bulk_mock.last_request().unwrap().header(IDEMPOTENCY_KEY_HEADER),
            Some("k-1")
        );
    }

    #[test]
    fn test_unknown_detail_key() {
        let mock = Arc::new(MockTransport::ok());
        let mut cash_in = device(&mock).cash_in();
        let bulk = object(json!({"cashSum": 100.0, "items": []}));

        let err = cash_in.set_details(&bulk, false).unwrap_err();
        assert!(matches!(
            err,
            ClientError::UnknownDetailKey { method: "cash-in", ref key } if key == "items"
        ));
        assert!(cash_in.details().is_empty());

        cash_in.set_details(&bulk, true).unwrap();
        assert_eq!(cash_in.details().get("cashSum"), Some(&json!(100.0)));
        assert!(cash_in.details().get("items").is_none());
    }

    #[test]
    fn test_bulk_keys_are_case_insensitive_and_details_is_skipped() {
        let mock = Arc::new(MockTransport::ok());
        let mut close = device(&mock).report_x();
        close
            .set_details(
                &object(json!({
                    "CASHOUT": true,
                    "closeshift": false,
                    "Details": {"anything": 1},
                    "Padding": "xxxx"
                })),
                false,
            )
            .unwrap();

        assert_eq!(close.details().get("cashOut"), Some(&json!(true)));
        assert_eq!(close.details().get("closeShift"), Some(&json!(false)));
        assert_eq!(close.details().get("*padding*"), Some(&json!("xxxx")));
        assert!(close.details().get("Details").is_none());
    }

    #[test]
    fn test_close_shift_rejects_close_shift_flag() {
        let mock = Arc::new(MockTransport::ok());
        let mut close = device(&mock).close_shift();
        close.set_cash_out(true).set_electronically(true);
        assert!(close
            .set_details(&object(json!({"closeShift": true})), false)
            .is_err());
    }

    #[test]
    fn test_bulk_merge_is_applied_in_order() {
        let mock = Arc::new(MockTransport::ok());
        let mut cash_out = device(&mock).cash_out();
        let bulk = object(json!({"cashSum": 150.0, "operator": {"name": "  "}}));

        let err = cash_out.set_details(&bulk, false).unwrap_err();
        assert!(err.is_validation_error());
        // Entries before the failing one stay applied
        assert_eq!(cash_out.details().get("cashSum"), Some(&json!(150.0)));
        assert!(cash_out.details().get("operator").is_none());
    }

    #[test]
    fn test_non_fiscal_document() {
        let mock = Arc::new(MockTransport::ok());
        let mut doc = device(&mock).print_non_fiscal_doc();
        doc.add_document_text(TextBlock::new("Заголовок").with_center(true))
            .unwrap()
            .add_separator()
            .unwrap()
            .set_cliche(true)
            .set_margin(false);
        doc.set_details(
            &object(json!({"document": [{"content": "Строка"}], "footer": true})),
            false,
        )
        .unwrap();
        doc.set_idempotency_key(None).perform().unwrap();

        let body = mock.last_body();
        assert_eq!(body["document"].as_array().unwrap().len(), 3);
        assert_eq!(body["document"][1], json!({"separator": true}));
        assert_eq!(body["cliche"], json!(true));
        assert_eq!(body["footer"], json!(true));
    }
}
