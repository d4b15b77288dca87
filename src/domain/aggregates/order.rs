//! Order Aggregate

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::aggregates::Product;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Money, Utr};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    user_id: String,
    user_email: String,
    items: Vec<LineItem>,
    total_amount: Money,
    customer_info: CustomerInfo,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utr_number: Option<Utr>,
    created_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Product snapshot taken when the order is placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem { pub product_id: String, pub product_name: String, pub product_price: Money, pub product_weight: String, pub product_image: String, pub quantity: u32 }

impl LineItem {
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id().to_string(), product_name: product.name().to_string(), product_price: product.price(),
            product_weight: product.weight().to_string(), product_image: product.image_url().to_string(), quantity,
        }
    }
    pub fn line_total(&self) -> Money { self.product_price.multiply(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Completed, Failed }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Processing, Shipped, Delivered, Cancelled }

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Self::Pending => "pending", Self::Completed => "completed", Self::Failed => "failed" })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Self::Processing => "processing", Self::Shipped => "shipped", Self::Delivered => "delivered", Self::Cancelled => "cancelled" })
    }
}

/// How a payment method gets confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    /// The customer is handed to an external UPI app and the order is polled.
    Polling,
    /// The customer types the bank reference (UTR) of a transfer.
    ManualReference,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "PhonePe")]
    PhonePe,
    #[serde(rename = "Google Pay")]
    GooglePay,
    #[serde(rename = "Paytm")]
    Paytm,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self { Self::PhonePe => "PhonePe", Self::GooglePay => "Google Pay", Self::Paytm => "Paytm", Self::BankTransfer => "Bank Transfer" }
    }
    pub fn confirmation(&self) -> Confirmation {
        match self { Self::BankTransfer => Confirmation::ManualReference, _ => Confirmation::Polling }
    }
}

// =============================================================================
// Customer info
// =============================================================================

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("Invalid regex"));

/// Contact and shipping snapshot; `address` is free text, split into lines only for the address book.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[validate(custom = "validate_name")]
    pub name: String,
    #[validate(regex(path = "EMAIL_RE", message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(regex(path = "PHONE_RE", message = "Please enter a valid 10-digit phone number"))]
    pub phone: String,
    #[validate(custom = "validate_address")]
    pub address: String,
    #[validate(custom = "validate_city")]
    pub city: String,
    #[validate(custom = "validate_state")]
    pub state: String,
    pub zip_code: String,
}

/// Country-specific rules the derive can't express.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CustomerRules { pub zip_digits: usize }

impl Default for CustomerRules {
    fn default() -> Self { Self { zip_digits: 6 } }
}

impl CustomerInfo {
    /// Every field rule, including the configurable ZIP length.
    pub fn check(&self, rules: &CustomerRules) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() { Ok(()) => ValidationErrors::new(), Err(e) => e };
        let zip = self.zip_code.as_str();
        if zip.len() != rules.zip_digits || !zip.bytes().all(|b| b.is_ascii_digit()) {
            let mut err = ValidationError::new("zip_code");
            err.message = Some(Cow::Owned(format!("Please enter a valid {}-digit ZIP code", rules.zip_digits)));
            errors.add("zip_code", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn trimmed_at_least(value: &str, min: usize, code: &'static str, message: &'static str) -> Result<(), ValidationError> {
    if value.trim().chars().count() >= min { return Ok(()); }
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    Err(err)
}

fn validate_name(v: &str) -> Result<(), ValidationError> { trimmed_at_least(v, 2, "name", "Name must be at least 2 characters long") }
fn validate_address(v: &str) -> Result<(), ValidationError> { trimmed_at_least(v, 5, "address", "Please enter a valid address (at least 5 characters)") }
fn validate_city(v: &str) -> Result<(), ValidationError> { trimmed_at_least(v, 2, "city", "Please enter a valid city name") }
fn validate_state(v: &str) -> Result<(), ValidationError> { trimmed_at_least(v, 2, "state", "Please enter a valid state name") }

// =============================================================================
// Placement and transitions
// =============================================================================

/// Order payload as sent by the checkout.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: String,
    pub user_email: String,
    pub items: Vec<LineItem>,
    pub total_amount: Money,
    pub customer_info: CustomerInfo,
    pub payment_method: PaymentMethod,
}

/// Sum of `price × quantity`, rounded to the minor unit.
pub fn items_total(items: &[LineItem]) -> Money { items.iter().map(LineItem::line_total).sum::<Money>().rounded() }

impl Order {
    /// New orders always start `pending` / `processing`, whatever the client sent.
    pub fn place(new: NewOrder) -> Result<Self, OrderError> {
        if new.items.is_empty() { return Err(OrderError::NoItems); }
        if let Some(item) = new.items.iter().find(|i| i.quantity == 0) { return Err(OrderError::InvalidQuantity(item.product_id.clone())); }
        let computed = items_total(&new.items);
        if new.total_amount.rounded() != computed { return Err(OrderError::TotalMismatch { claimed: new.total_amount, computed }); }
        let mut order = Self {
            id: Uuid::now_v7(), user_id: new.user_id, user_email: new.user_email, items: new.items, total_amount: computed,
            customer_info: new.customer_info, payment_method: new.payment_method, payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Processing, utr_number: None, created_at: Utc::now(), events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: order.id, user_id: order.user_id.clone(), total: computed }));
        Ok(order)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn user_email(&self) -> &str { &self.user_email }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn total_amount(&self) -> Money { self.total_amount }
    pub fn customer_info(&self) -> &CustomerInfo { &self.customer_info }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn order_status(&self) -> OrderStatus { self.order_status }
    pub fn utr_number(&self) -> Option<&Utr> { self.utr_number.as_ref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Payment may settle at any time before cancellation; a completed payment is final.
    /// A cancelled order keeps whatever payment status it had.
    pub fn update_payment(&mut self, status: PaymentStatus, utr: Option<Utr>) -> Result<(), OrderError> {
        use PaymentStatus::*;
        let transition = OrderError::PaymentTransition { order: self.order_status, from: self.payment_status, to: status };
        if self.order_status == OrderStatus::Cancelled {
            return if status == self.payment_status { Ok(()) } else { Err(transition) };
        }
        let allowed = match (self.payment_status, status) {
            (Completed, Completed) => true,
            (Completed, _) => false,
            _ => true,
        };
        if !allowed { return Err(transition); }
        self.payment_status = status;
        if utr.is_some() { self.utr_number = utr; }
        self.raise_event(DomainEvent::Order(OrderEvent::PaymentUpdated {
            order_id: self.id, status, utr: self.utr_number.as_ref().map(|u| u.to_string()),
        }));
        Ok(())
    }

    /// Fulfilment moves forward only; shipping and delivery need a completed payment.
    pub fn update_status(&mut self, status: OrderStatus) -> Result<(), OrderError> {
        use OrderStatus::*;
        let from = self.order_status;
        if from == status { return Ok(()); }
        let allowed = matches!((from, status), (Processing, Shipped) | (Shipped, Delivered) | (Processing, Cancelled) | (Shipped, Cancelled));
        if !allowed { return Err(OrderError::StatusTransition { from, to: status }); }
        if matches!(status, Shipped | Delivered) && self.payment_status != PaymentStatus::Completed {
            return Err(OrderError::PaymentOutstanding);
        }
        self.order_status = status;
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, from, to: status }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Quantity for {0} must be at least 1")]
    InvalidQuantity(String),
    #[error("Total {claimed} does not match items total {computed}")]
    TotalMismatch { claimed: Money, computed: Money },
    #[error("Cannot move payment from {from} to {to} on a {order} order")]
    PaymentTransition { order: OrderStatus, from: PaymentStatus, to: PaymentStatus },
    #[error("Cannot move order from {from} to {to}")]
    StatusTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order cannot ship before payment is completed")]
    PaymentOutstanding,
}

#[cfg(test)]
pub(crate) fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Asha Rao".into(), email: "asha@example.com".into(), phone: "9876543210".into(),
        address: "12 MG Road, Near Metro".into(), city: "Bengaluru".into(), state: "Karnataka".into(), zip_code: "560001".into(),
    }
}
