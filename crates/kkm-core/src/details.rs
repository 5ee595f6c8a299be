//! # Details Mapping
//!
//! The JSON object sent as the body of every Post operation, plus the typed
//! records that are validated before being written into it.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Details (JSON object)                           │
//! │                                                                         │
//! │   items ──────────► [ Item { title, price, quantity, tax?, unit? } ]    │
//! │   operator ───────► Operator { name, inn? }                             │
//! │   customer ───────► Customer { account?, contact?, name?, ... }         │
//! │   seller ─────────► Seller { email? }                                   │
//! │   payment ────────► Payment { type, sum | "auto", electroPaymentInfo? } │
//! │   tax ────────────► "vat20"                                             │
//! │   text/headerText/footerText ─► TextBlock                               │
//! │   document ───────► [ TextBlock | {separator: true} ]                   │
//! │   cashSum, cashOut, closeShift, electronically, connParams, ...         │
//! │   *padding* ──────► opaque filler                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are built through constructors that validate, so a record that
//! exists is always writable. Bulk JSON input goes through the `from_value`
//! parsers, which apply the same rules.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationResult};
use crate::types::{MeasurementUnit, PaymentType, Tax, WireValue};
use crate::validation::{
    validate_cash_sum, validate_operator_name, validate_payment_sum, validate_price,
    validate_quantity, validate_title,
};

// =============================================================================
// Wire Keys
// =============================================================================

/// Top-level keys of the details object.
pub mod keys {
    pub const ITEMS: &str = "items";
    pub const OPERATOR: &str = "operator";
    pub const CUSTOMER: &str = "customer";
    pub const SELLER: &str = "seller";
    pub const PAYMENT: &str = "payment";
    pub const TAX: &str = "tax";
    pub const TEXT: &str = "text";
    pub const HEADER_TEXT: &str = "headerText";
    pub const FOOTER_TEXT: &str = "footerText";
    pub const CASH_SUM: &str = "cashSum";
    pub const CASH_OUT: &str = "cashOut";
    pub const CLOSE_SHIFT: &str = "closeShift";
    pub const ELECTRONICALLY: &str = "electronically";
    pub const DOCUMENT: &str = "document";
    pub const CLICHE: &str = "cliche";
    pub const FOOTER: &str = "footer";
    pub const MARGIN: &str = "margin";
    pub const CONN_PARAMS: &str = "connParams";
    pub const PADDING: &str = "*padding*";
}

// =============================================================================
// JSON Helpers
// =============================================================================

fn record_value<T: Serialize>(field: &str, record: &T) -> ValidationResult<Value> {
    serde_json::to_value(record).map_err(|e| ValidationError::invalid_format(field, e.to_string()))
}

fn as_object<'a>(value: &'a Value, field: &str) -> ValidationResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::invalid_format(field, "expected an object"))
}

fn required_string(obj: &Map<String, Value>, key: &str, field: &str) -> ValidationResult<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        None | Some(Value::Null) => Err(ValidationError::Required {
            field: field.to_string(),
        }),
        Some(_) => Err(ValidationError::invalid_format(field, "expected a string")),
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> ValidationResult<Option<String>> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        None | Some(Value::Null) => Ok(None),
        Some(_) => Err(ValidationError::invalid_format(field, "expected a string")),
    }
}

fn number_or(obj: &Map<String, Value>, key: &str, default: f64) -> ValidationResult<f64> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ValidationError::invalid_format(key, "not representable as f64")),
        Some(_) => Err(ValidationError::invalid_format(key, "expected a number")),
    }
}

fn bool_or_false(obj: &Map<String, Value>, key: &str) -> ValidationResult<bool> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ValidationError::invalid_format(key, "expected a boolean")),
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

// =============================================================================
// Item
// =============================================================================

/// One receipt line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    title: String,
    price: f64,
    quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tax: Option<Tax>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<MeasurementUnit>,
}

impl Item {
    /// Creates a validated item without tax or unit.
    pub fn new(title: impl Into<String>, price: f64, quantity: f64) -> ValidationResult<Self> {
        let title = title.into();
        validate_title(&title)?;
        validate_price(price)?;
        validate_quantity(quantity)?;

        Ok(Item {
            title,
            price,
            quantity,
            tax: None,
            unit: None,
        })
    }

    pub fn with_tax(mut self, tax: Tax) -> Self {
        self.tax = Some(tax);
        self
    }

    pub fn with_unit(mut self, unit: MeasurementUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Parses `{title, price?, quantity?, tax?, unit?}`.
    ///
    /// Missing `price` defaults to 0 (and therefore fails the range check),
    /// missing `quantity` defaults to 1.
    pub fn from_value(value: &Value) -> ValidationResult<Self> {
        let obj = as_object(value, "item")?;
        let title = required_string(obj, "title", "title")?;
        let price = number_or(obj, "price", 0.0)?;
        let quantity = number_or(obj, "quantity", 1.0)?;

        let mut item = Item::new(title, price, quantity)?;
        if let Some(tax) = obj.get("tax") {
            item.tax = Tax::cast(tax, true)?;
        }
        if let Some(unit) = obj.get("unit") {
            item.unit = MeasurementUnit::cast(unit, true)?;
        }
        Ok(item)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn tax(&self) -> Option<Tax> {
        self.tax
    }

    pub fn unit(&self) -> Option<MeasurementUnit> {
        self.unit
    }
}

// =============================================================================
// Operator
// =============================================================================

/// Cashier identity printed on fiscal documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    inn: Option<String>,
}

impl Operator {
    /// Name is trimmed and must not be empty. An empty `inn` counts as absent.
    pub fn new(name: &str, inn: Option<&str>) -> ValidationResult<Self> {
        let name = validate_operator_name(name)?;
        let inn = inn
            .map(str::trim)
            .filter(|inn| !inn.is_empty())
            .map(str::to_string);
        Ok(Operator { name, inn })
    }

    /// Parses `{name, inn?}`.
    pub fn from_value(value: &Value) -> ValidationResult<Self> {
        let obj = as_object(value, "operator")?;
        let name = required_string(obj, "name", "operator.name")?;
        let inn = optional_string(obj, "inn", "operator.inn")?;
        Operator::new(&name, inn.as_deref())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inn(&self) -> Option<&str> {
        self.inn.as_deref()
    }
}

// =============================================================================
// Customer / Seller
// =============================================================================

/// Receipt recipient. Every field is independent, empty strings are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    #[serde(skip_serializing_if = "is_blank")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub inn: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub citizenship: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub document_code: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub document_data: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub address: Option<String>,
}

impl Customer {
    pub fn new(account: Option<&str>, contact: Option<&str>, name: Option<&str>) -> Self {
        Customer {
            account: account.map(str::to_string),
            contact: contact.map(str::to_string),
            name: name.map(str::to_string),
            ..Customer::default()
        }
    }

    pub fn from_value(value: &Value) -> ValidationResult<Self> {
        as_object(value, "customer")?;
        Customer::deserialize(value)
            .map_err(|e| ValidationError::invalid_format("customer", e.to_string()))
    }

    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        [
            &self.account,
            &self.contact,
            &self.name,
            &self.inn,
            &self.birthdate,
            &self.citizenship,
            &self.document_code,
            &self.document_data,
            &self.address,
        ]
        .into_iter()
        .all(is_blank)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seller {
    #[serde(skip_serializing_if = "is_blank")]
    pub email: Option<String>,
}

impl Seller {
    pub fn new(email: &str) -> Self {
        Seller {
            email: Some(email.to_string()),
        }
    }

    pub fn from_value(value: &Value) -> ValidationResult<Self> {
        as_object(value, "seller")?;
        Seller::deserialize(value)
            .map_err(|e| ValidationError::invalid_format("seller", e.to_string()))
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Payment amount, or `"auto"` to let the device use the receipt total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaymentSum {
    Auto,
    Amount(f64),
}

impl Serialize for PaymentSum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PaymentSum::Auto => serializer.serialize_str("auto"),
            PaymentSum::Amount(sum) => serializer.serialize_f64(*sum),
        }
    }
}

/// Electronic payment attributes (method code, transaction id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectroPaymentInfo {
    pub method: u32,
    pub id: String,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub add_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "type")]
    payment_type: PaymentType,
    sum: PaymentSum,
    #[serde(skip_serializing_if = "Option::is_none")]
    electro_payment_info: Option<ElectroPaymentInfo>,
}

impl Payment {
    /// `sum: None` means `"auto"`.
    pub fn new(payment_type: PaymentType, sum: Option<f64>) -> ValidationResult<Self> {
        let sum = match sum {
            Some(amount) => {
                validate_payment_sum(amount)?;
                PaymentSum::Amount(amount)
            }
            None => PaymentSum::Auto,
        };
        Ok(Payment {
            payment_type,
            sum,
            electro_payment_info: None,
        })
    }

    pub fn with_electro_payment_info(mut self, info: ElectroPaymentInfo) -> Self {
        self.electro_payment_info = Some(info);
        self
    }

    /// Parses `{type, sum?, electroPaymentInfo?}`.
    pub fn from_value(value: &Value) -> ValidationResult<Self> {
        let obj = as_object(value, "payment")?;

        let payment_type = PaymentType::cast(obj.get("type").unwrap_or(&Value::Null), false)?
            .ok_or_else(|| ValidationError::Required {
                field: PaymentType::FIELD.to_string(),
            })?;

        let sum = match obj.get("sum") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s == "auto" => None,
            Some(Value::Number(n)) => Some(n.as_f64().ok_or_else(|| {
                ValidationError::invalid_format("payment.sum", "not representable as f64")
            })?),
            Some(_) => {
                return Err(ValidationError::invalid_format(
                    "payment.sum",
                    "expected a number or \"auto\"",
                ))
            }
        };

        let mut payment = Payment::new(payment_type, sum)?;
        if let Some(info) = obj.get("electroPaymentInfo").filter(|v| !v.is_null()) {
            let info = ElectroPaymentInfo::deserialize(info).map_err(|e| {
                ValidationError::invalid_format("payment.electroPaymentInfo", e.to_string())
            })?;
            payment.electro_payment_info = Some(info);
        }
        Ok(payment)
    }

    pub fn payment_type(&self) -> PaymentType {
        self.payment_type
    }

    pub fn sum(&self) -> PaymentSum {
        self.sum
    }
}

// =============================================================================
// Text Blocks
// =============================================================================

/// Which free-text slot of a receipt is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSlot {
    Text,
    Header,
    Footer,
}

impl TextSlot {
    pub const fn key(&self) -> &'static str {
        match self {
            TextSlot::Text => keys::TEXT,
            TextSlot::Header => keys::HEADER_TEXT,
            TextSlot::Footer => keys::FOOTER_TEXT,
        }
    }
}

/// A formatted run of text. Content is stored trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    content: String,
    center: bool,
    magnified: bool,
    separated: bool,
}

impl TextBlock {
    pub fn new(content: &str) -> Self {
        TextBlock {
            content: content.trim().to_string(),
            ..TextBlock::default()
        }
    }

    pub fn with_center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn with_magnified(mut self, magnified: bool) -> Self {
        self.magnified = magnified;
        self
    }

    pub fn with_separated(mut self, separated: bool) -> Self {
        self.separated = separated;
        self
    }

    /// Accepts a bare string, `null`, or `{content?, center?, magnified?, separated?}`.
    pub fn from_value(value: &Value, field: &str) -> ValidationResult<Self> {
        match value {
            Value::String(s) => Ok(TextBlock::new(s)),
            Value::Null => Ok(TextBlock::default()),
            Value::Object(obj) => {
                let content = optional_string(obj, "content", field)?.unwrap_or_default();
                Ok(TextBlock::new(&content)
                    .with_center(bool_or_false(obj, "center")?)
                    .with_magnified(bool_or_false(obj, "magnified")?)
                    .with_separated(bool_or_false(obj, "separated")?))
            }
            _ => Err(ValidationError::invalid_format(
                field,
                "expected a string or an object",
            )),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl From<&str> for TextBlock {
    fn from(content: &str) -> Self {
        TextBlock::new(content)
    }
}

/// One entry of a non-fiscal document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBlock {
    Text(TextBlock),
    Separator,
}

impl Serialize for DocumentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DocumentBlock::Text(block) => block.serialize(serializer),
            DocumentBlock::Separator => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("separator", &true)?;
                map.end()
            }
        }
    }
}

impl DocumentBlock {
    pub fn from_value(value: &Value) -> ValidationResult<Self> {
        if let Some(Value::Bool(true)) = value.as_object().and_then(|obj| obj.get("separator")) {
            return Ok(DocumentBlock::Separator);
        }
        TextBlock::from_value(value, keys::DOCUMENT).map(DocumentBlock::Text)
    }
}

impl From<TextBlock> for DocumentBlock {
    fn from(block: TextBlock) -> Self {
        DocumentBlock::Text(block)
    }
}

// =============================================================================
// Details
// =============================================================================

/// String-keyed JSON object carried by a Post operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Details(Map<String, Value>);

impl Details {
    pub fn new() -> Self {
        Details(Map::new())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// The request body. An empty mapping serializes as `{}`.
    pub fn to_body(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Writes a raw value, bypassing validation.
    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Stored items, empty when none were added.
    pub fn items(&self) -> &[Value] {
        match self.0.get(keys::ITEMS) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    pub fn push_item(&mut self, item: &Item) -> ValidationResult<()> {
        let value = record_value(keys::ITEMS, item)?;
        self.push_to_list(keys::ITEMS, value);
        Ok(())
    }

    pub fn set_operator(&mut self, operator: &Operator) -> ValidationResult<()> {
        let value = record_value(keys::OPERATOR, operator)?;
        self.0.insert(keys::OPERATOR.to_string(), value);
        Ok(())
    }

    /// Merges the non-empty customer fields over whatever is already stored.
    pub fn merge_customer(&mut self, customer: &Customer) -> ValidationResult<()> {
        let Value::Object(fields) = record_value(keys::CUSTOMER, customer)? else {
            return Err(ValidationError::invalid_format(
                keys::CUSTOMER,
                "expected an object",
            ));
        };
        if fields.is_empty() {
            return Ok(());
        }

        let slot = self
            .0
            .entry(keys::CUSTOMER)
            .or_insert_with(|| Value::Object(Map::new()));
        match slot {
            Value::Object(existing) => existing.extend(fields),
            other => *other = Value::Object(fields),
        }
        Ok(())
    }

    pub fn set_seller(&mut self, seller: &Seller) -> ValidationResult<()> {
        let value = record_value(keys::SELLER, seller)?;
        self.0.insert(keys::SELLER.to_string(), value);
        Ok(())
    }

    pub fn set_payment(&mut self, payment: &Payment) -> ValidationResult<()> {
        let value = record_value(keys::PAYMENT, payment)?;
        self.0.insert(keys::PAYMENT.to_string(), value);
        Ok(())
    }

    pub fn set_tax(&mut self, tax: Tax) {
        self.0
            .insert(keys::TAX.to_string(), Value::String(tax.as_str().to_string()));
    }

    /// Writes a text slot. A block with empty content removes the slot.
    pub fn set_text(&mut self, slot: TextSlot, block: &TextBlock) -> ValidationResult<()> {
        if block.is_empty() {
            self.0.remove(slot.key());
            return Ok(());
        }
        let value = record_value(slot.key(), block)?;
        self.0.insert(slot.key().to_string(), value);
        Ok(())
    }

    pub fn set_cash_sum(&mut self, sum: f64) -> ValidationResult<()> {
        validate_cash_sum(sum)?;
        self.0.insert(keys::CASH_SUM.to_string(), Value::from(sum));
        Ok(())
    }

    /// Writes one of the boolean switches (`cashOut`, `electronically`, ...).
    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.0.insert(key.to_string(), Value::Bool(value));
    }

    pub fn push_document_block(&mut self, block: &DocumentBlock) -> ValidationResult<()> {
        let value = record_value(keys::DOCUMENT, block)?;
        self.push_to_list(keys::DOCUMENT, value);
        Ok(())
    }

    pub fn set_conn_params(&mut self, conn_params: &str) {
        self.0.insert(
            keys::CONN_PARAMS.to_string(),
            Value::String(conn_params.to_string()),
        );
    }

    pub fn set_padding(&mut self, padding: &str) {
        self.0
            .insert(keys::PADDING.to_string(), Value::String(padding.to_string()));
    }

    fn push_to_list(&mut self, key: &str, value: Value) {
        let slot = self
            .0
            .entry(key)
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(list) => list.push(value),
            other => *other = Value::Array(vec![value]),
        }
    }
}

impl From<Map<String, Value>> for Details {
    fn from(map: Map<String, Value>) -> Self {
        Details(map)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
