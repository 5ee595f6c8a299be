//! # Detail Capabilities
//!
//! Setter groups shared between operations. Each trait owns one slice of the
//! details mapping and validates before writing.
//!
//! ```text
//! ┌──────────────────────┬───────────────────────────────────────────────┐
//! │ Trait                │ Operations                                    │
//! ├──────────────────────┼───────────────────────────────────────────────┤
//! │ OperatorDetails      │ cash-in/out, sell, sell-return, close-shift,  │
//! │                      │ report-x, reset-state                         │
//! │ CashSumDetails       │ cash-in, cash-out                             │
//! │ ReceiptDetails       │ sell, sell-return                             │
//! │ CloseDetails         │ close-shift, report-x, reset-state            │
//! │ ReportDetails        │ report-x, reset-state                         │
//! │ DocumentDetails      │ print-non-fiscal-doc                          │
//! │ ElectronicallyDetails│ every device Post operation                   │
//! │ LearnDetails         │ kkm/learn                                     │
//! └──────────────────────┴───────────────────────────────────────────────┘
//! ```
//!
//! The `apply_*_value` methods are the bulk entry points referenced from
//! each operation's [`detail_setter`](crate::PostOperation::detail_setter)
//! table.

use kkm_core::details::keys;
use kkm_core::{
    Customer, DocumentBlock, Item, Operator, Payment, PaymentType, Seller, Tax, TextBlock,
    TextSlot, ValidationError, WireValue,
};
use serde_json::Value;

use crate::error::ClientResult;
use crate::operation::{
    expect_array, expect_bool, expect_f64, expect_str, DetailSetter, PostOperation,
};

// =============================================================================
// Operator
// =============================================================================

pub trait OperatorDetails: PostOperation {
    fn set_operator(&mut self, name: &str, inn: Option<&str>) -> ClientResult<&mut Self> {
        let operator = Operator::new(name, inn)?;
        self.set_operator_record(&operator)
    }

    fn set_operator_record(&mut self, operator: &Operator) -> ClientResult<&mut Self> {
        self.state_mut().details_mut().set_operator(operator)?;
        Ok(self)
    }

    fn apply_operator_value(&mut self, value: &Value) -> ClientResult<()> {
        let operator = Operator::from_value(value)?;
        self.set_operator_record(&operator)?;
        Ok(())
    }
}

pub(crate) fn operator_setter<Op: OperatorDetails>(key: &str) -> Option<DetailSetter<Op>> {
    match key {
        "operator" => Some(Op::apply_operator_value),
        _ => None,
    }
}

// =============================================================================
// Cash Sum
// =============================================================================

pub trait CashSumDetails: PostOperation {
    fn set_cash_sum(&mut self, sum: f64) -> ClientResult<&mut Self> {
        self.state_mut().details_mut().set_cash_sum(sum)?;
        Ok(self)
    }

    fn apply_cash_sum_value(&mut self, value: &Value) -> ClientResult<()> {
        let sum = expect_f64(keys::CASH_SUM, value)?;
        self.set_cash_sum(sum)?;
        Ok(())
    }
}

pub(crate) fn cash_sum_setter<Op: CashSumDetails>(key: &str) -> Option<DetailSetter<Op>> {
    match key {
        "cashsum" => Some(Op::apply_cash_sum_value),
        _ => None,
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Items, taxes, payment, parties and free text of a receipt.
pub trait ReceiptDetails: PostOperation {
    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Appends one item. A rejected item leaves `items` untouched.
    fn add_item(&mut self, title: &str, price: f64, quantity: f64) -> ClientResult<&mut Self> {
        let item = Item::new(title, price, quantity)?;
        self.push_item(&item)
    }

    fn add_taxed_item<T>(
        &mut self,
        title: &str,
        price: f64,
        quantity: f64,
        tax: T,
    ) -> ClientResult<&mut Self>
    where
        T: TryInto<Tax>,
        ValidationError: From<T::Error>,
    {
        let tax = tax.try_into().map_err(ValidationError::from)?;
        let item = Item::new(title, price, quantity)?.with_tax(tax);
        self.push_item(&item)
    }

    fn push_item(&mut self, item: &Item) -> ClientResult<&mut Self> {
        self.state_mut().details_mut().push_item(item)?;
        Ok(self)
    }

    /// Appends every item. Existing items are kept.
    fn set_items(&mut self, items: &[Item]) -> ClientResult<&mut Self> {
        for item in items {
            self.push_item(item)?;
        }
        Ok(self)
    }

    /// Parses the whole list first, so a bad entry appends nothing.
    fn apply_items_value(&mut self, value: &Value) -> ClientResult<()> {
        let items = expect_array(keys::ITEMS, value)?
            .iter()
            .map(Item::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.set_items(&items)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Tax
    // -------------------------------------------------------------------------

    /// Receipt-wide default tax. Accepts `Tax` or its wire string.
    fn set_tax<T>(&mut self, tax: T) -> ClientResult<&mut Self>
    where
        T: TryInto<Tax>,
        ValidationError: From<T::Error>,
    {
        let tax = tax.try_into().map_err(ValidationError::from)?;
        self.state_mut().details_mut().set_tax(tax);
        Ok(self)
    }

    fn apply_tax_value(&mut self, value: &Value) -> ClientResult<()> {
        match Tax::cast(value, true)? {
            Some(tax) => {
                self.set_tax(tax)?;
            }
            None => {
                self.state_mut().details_mut().remove(keys::TAX);
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Payment
    // -------------------------------------------------------------------------

    /// `sum: None` lets the device pay the receipt total (`"auto"`).
    fn set_payment<T>(&mut self, payment_type: T, sum: Option<f64>) -> ClientResult<&mut Self>
    where
        T: TryInto<PaymentType>,
        ValidationError: From<T::Error>,
    {
        let payment_type = payment_type.try_into().map_err(ValidationError::from)?;
        let payment = Payment::new(payment_type, sum)?;
        self.set_payment_record(&payment)
    }

    fn set_payment_record(&mut self, payment: &Payment) -> ClientResult<&mut Self> {
        self.state_mut().details_mut().set_payment(payment)?;
        Ok(self)
    }

    fn apply_payment_value(&mut self, value: &Value) -> ClientResult<()> {
        let payment = Payment::from_value(value)?;
        self.set_payment_record(&payment)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customer / Seller
    // -------------------------------------------------------------------------

    /// Each present field is written on its own.
    fn set_customer(
        &mut self,
        account: Option<&str>,
        contact: Option<&str>,
        name: Option<&str>,
    ) -> ClientResult<&mut Self> {
        self.set_customer_record(&Customer::new(account, contact, name))
    }

    fn set_customer_record(&mut self, customer: &Customer) -> ClientResult<&mut Self> {
        self.state_mut().details_mut().merge_customer(customer)?;
        Ok(self)
    }

    fn apply_customer_value(&mut self, value: &Value) -> ClientResult<()> {
        let customer = Customer::from_value(value)?;
        self.set_customer_record(&customer)?;
        Ok(())
    }

    fn set_seller_email(&mut self, email: &str) -> ClientResult<&mut Self> {
        self.state_mut()
            .details_mut()
            .set_seller(&Seller::new(email))?;
        Ok(self)
    }

    fn apply_seller_value(&mut self, value: &Value) -> ClientResult<()> {
        let seller = Seller::from_value(value)?;
        self.state_mut().details_mut().set_seller(&seller)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Text
    // -------------------------------------------------------------------------

    /// Writes a text slot. Empty content clears it.
    fn set_text_block(
        &mut self,
        slot: TextSlot,
        block: impl Into<TextBlock>,
    ) -> ClientResult<&mut Self> {
        self.state_mut()
            .details_mut()
            .set_text(slot, &block.into())?;
        Ok(self)
    }

    fn set_text(&mut self, block: impl Into<TextBlock>) -> ClientResult<&mut Self> {
        self.set_text_block(TextSlot::Text, block)
    }

    fn set_header_text(&mut self, block: impl Into<TextBlock>) -> ClientResult<&mut Self> {
        self.set_text_block(TextSlot::Header, block)
    }

    fn set_footer_text(&mut self, block: impl Into<TextBlock>) -> ClientResult<&mut Self> {
        self.set_text_block(TextSlot::Footer, block)
    }

    fn apply_text_value(&mut self, value: &Value) -> ClientResult<()> {
        let block = TextBlock::from_value(value, keys::TEXT)?;
        self.set_text_block(TextSlot::Text, block)?;
        Ok(())
    }

    fn apply_header_text_value(&mut self, value: &Value) -> ClientResult<()> {
        let block = TextBlock::from_value(value, keys::HEADER_TEXT)?;
        self.set_text_block(TextSlot::Header, block)?;
        Ok(())
    }

    fn apply_footer_text_value(&mut self, value: &Value) -> ClientResult<()> {
        let block = TextBlock::from_value(value, keys::FOOTER_TEXT)?;
        self.set_text_block(TextSlot::Footer, block)?;
        Ok(())
    }
}

pub(crate) fn receipt_setter<Op: ReceiptDetails>(key: &str) -> Option<DetailSetter<Op>> {
    match key {
        "items" => Some(Op::apply_items_value),
        "tax" => Some(Op::apply_tax_value),
        "payment" => Some(Op::apply_payment_value),
        "customer" => Some(Op::apply_customer_value),
        "seller" => Some(Op::apply_seller_value),
        "text" => Some(Op::apply_text_value),
        "headertext" => Some(Op::apply_header_text_value),
        "footertext" => Some(Op::apply_footer_text_value),
        _ => None,
    }
}

// =============================================================================
// Shift Closing
// =============================================================================

pub trait CloseDetails: PostOperation {
    /// Withdraw the drawer balance before closing.
    fn set_cash_out(&mut self, cash_out: bool) -> &mut Self {
        self.state_mut()
            .details_mut()
            .set_flag(keys::CASH_OUT, cash_out);
        self
    }

    fn apply_cash_out_value(&mut self, value: &Value) -> ClientResult<()> {
        let cash_out = expect_bool(keys::CASH_OUT, value)?;
        self.set_cash_out(cash_out);
        Ok(())
    }
}

/// Reports that can also close the shift.
pub trait ReportDetails: CloseDetails {
    fn set_close_shift(&mut self, close_shift: bool) -> &mut Self {
        self.state_mut()
            .details_mut()
            .set_flag(keys::CLOSE_SHIFT, close_shift);
        self
    }

    fn apply_close_shift_value(&mut self, value: &Value) -> ClientResult<()> {
        let close_shift = expect_bool(keys::CLOSE_SHIFT, value)?;
        self.set_close_shift(close_shift);
        Ok(())
    }
}

pub(crate) fn close_setter<Op: CloseDetails>(key: &str) -> Option<DetailSetter<Op>> {
    match key {
        "cashout" => Some(Op::apply_cash_out_value),
        _ => None,
    }
}

pub(crate) fn report_setter<Op: ReportDetails>(key: &str) -> Option<DetailSetter<Op>> {
    match key {
        "closeshift" => Some(Op::apply_close_shift_value),
        _ => close_setter(key),
    }
}

// =============================================================================
// Electronic Delivery
// =============================================================================

pub trait ElectronicallyDetails: PostOperation {
    /// Send the document to the OFD without printing it.
    fn set_electronically(&mut self, electronically: bool) -> &mut Self {
        self.state_mut()
            .details_mut()
            .set_flag(keys::ELECTRONICALLY, electronically);
        self
    }

    fn apply_electronically_value(&mut self, value: &Value) -> ClientResult<()> {
        let electronically = expect_bool(keys::ELECTRONICALLY, value)?;
        self.set_electronically(electronically);
        Ok(())
    }
}

pub(crate) fn electronically_setter<Op: ElectronicallyDetails>(
    key: &str,
) -> Option<DetailSetter<Op>> {
    match key {
        "electronically" => Some(Op::apply_electronically_value),
        _ => None,
    }
}

// =============================================================================
// Non-Fiscal Document
// =============================================================================

pub trait DocumentDetails: PostOperation {
    fn add_document_text(&mut self, block: impl Into<TextBlock>) -> ClientResult<&mut Self> {
        self.push_document_block(&DocumentBlock::Text(block.into()))
    }

    fn add_separator(&mut self) -> ClientResult<&mut Self> {
        self.push_document_block(&DocumentBlock::Separator)
    }

    fn push_document_block(&mut self, block: &DocumentBlock) -> ClientResult<&mut Self> {
        self.state_mut().details_mut().push_document_block(block)?;
        Ok(self)
    }

    /// Print the header cliche.
    fn set_cliche(&mut self, cliche: bool) -> &mut Self {
        self.state_mut().details_mut().set_flag(keys::CLICHE, cliche);
        self
    }

    /// Print the footer block.
    fn set_footer(&mut self, footer: bool) -> &mut Self {
        self.state_mut().details_mut().set_flag(keys::FOOTER, footer);
        self
    }

    /// Feed the trailing margin.
    fn set_margin(&mut self, margin: bool) -> &mut Self {
        self.state_mut().details_mut().set_flag(keys::MARGIN, margin);
        self
    }

    fn apply_document_value(&mut self, value: &Value) -> ClientResult<()> {
        let blocks = expect_array(keys::DOCUMENT, value)?
            .iter()
            .map(DocumentBlock::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        for block in &blocks {
            self.push_document_block(block)?;
        }
        Ok(())
    }

    fn apply_cliche_value(&mut self, value: &Value) -> ClientResult<()> {
        let cliche = expect_bool(keys::CLICHE, value)?;
        self.set_cliche(cliche);
        Ok(())
    }

    fn apply_footer_value(&mut self, value: &Value) -> ClientResult<()> {
        let footer = expect_bool(keys::FOOTER, value)?;
        self.set_footer(footer);
        Ok(())
    }

    fn apply_margin_value(&mut self, value: &Value) -> ClientResult<()> {
        let margin = expect_bool(keys::MARGIN, value)?;
        self.set_margin(margin);
        Ok(())
    }
}

pub(crate) fn document_setter<Op: DocumentDetails>(key: &str) -> Option<DetailSetter<Op>> {
    match key {
        "document" => Some(Op::apply_document_value),
        "cliche" => Some(Op::apply_cliche_value),
        "footer" => Some(Op::apply_footer_value),
        "margin" => Some(Op::apply_margin_value),
        _ => None,
    }
}

// =============================================================================
// Device Registration
// =============================================================================

pub trait LearnDetails: PostOperation {
    /// Compact `transport,param` string (`"com,4"`, `"tcpip,10.0.0.5"`).
    /// Passed to the gateway unchecked.
    fn set_conn_params(&mut self, conn_params: &str) -> &mut Self {
        self.state_mut().details_mut().set_conn_params(conn_params);
        self
    }

    fn apply_conn_params_value(&mut self, value: &Value) -> ClientResult<()> {
        let conn_params = expect_str(keys::CONN_PARAMS, value)?;
        self.set_conn_params(conn_params);
        Ok(())
    }
}

pub(crate) fn learn_setter<Op: LearnDetails>(key: &str) -> Option<DetailSetter<Op>> {
    match key {
        "connparams" => Some(Op::apply_conn_params_value),
        _ => None,
    }
}
