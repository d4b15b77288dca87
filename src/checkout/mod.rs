//! Checkout workflow.
//!
//! A `CheckoutSession` takes a cart selection through three stages:
//! collecting customer details, waiting for payment on a placed order, and
//! paid. Field validation never leaves the session; order placement and
//! payment writes surface as blocking `CheckoutError`s; side effects that must
//! not hold up the order (address book sync) become notices.

pub mod address_sync;
pub mod payment;
pub mod selection;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

pub use address_sync::{is_address_new, split_address_line, sync_address_book, AddressSyncOutcome, NormalizedAddress};
pub use payment::{poll_until_settled, upi_link, PollOutcome};
pub use selection::Selection;

use crate::api::orders::PaymentUpdate;
use crate::client::{ClientError, StorefrontApi};
use crate::config::CheckoutSettings;
use crate::domain::aggregates::{Address, Cart, Confirmation, CustomerInfo, NewOrder, Order, PaymentMethod, PaymentStatus, User};
use crate::domain::value_objects::{Utr, UtrError};
use crate::session::{AuthSession, CartSession};

// =============================================================================
// Form fields and notices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field { Name, Email, Phone, Address, City, State, ZipCode }

impl Field {
    pub const ALL: [Field; 7] = [Field::Name, Field::Email, Field::Phone, Field::Address, Field::City, Field::State, Field::ZipCode];

    /// Field name as reported by `CustomerInfo` validation.
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name", Field::Email => "email", Field::Phone => "phone", Field::Address => "address",
            Field::City => "city", Field::State => "state", Field::ZipCode => "zip_code",
        }
    }

    fn slot(self, info: &mut CustomerInfo) -> &mut String {
        match self {
            Field::Name => &mut info.name, Field::Email => &mut info.email, Field::Phone => &mut info.phone,
            Field::Address => &mut info.address, Field::City => &mut info.city, Field::State => &mut info.state,
            Field::ZipCode => &mut info.zip_code,
        }
    }
}

pub type FieldErrors = BTreeMap<Field, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel { Success, Info, Warning, Error }

/// Toast-style message for the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, title: &str, message: impl Into<String>) -> Self {
        Self { level, title: title.to_string(), message: message.into() }
    }
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    CollectingInfo,
    AwaitingPayment { order_id: Uuid },
    Paid { order_id: Uuid },
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("No items selected for checkout")]
    NothingSelected,
    #[error("Please fix the validation errors below")]
    Invalid(FieldErrors),
    #[error("Please log in to place an order")]
    NotSignedIn,
    #[error("Failed to place order. Please try again.")]
    OrderFailed(#[source] ClientError),
    #[error("Order not found")]
    NoOrder,
    #[error("Order has already been placed")]
    AlreadyPlaced,
    #[error("No UPI id configured for {0}")]
    PayeeNotConfigured(&'static str),
    #[error("{0} payments are confirmed with the transfer reference")]
    NotPollable(&'static str),
    #[error(transparent)]
    Reference(#[from] UtrError),
    #[error("Failed to confirm payment. Please try again.")]
    PaymentUpdateFailed(#[source] ClientError),
}

pub struct CheckoutSession {
    api: Arc<dyn StorefrontApi>,
    settings: CheckoutSettings,
    selection: Selection,
    info: CustomerInfo,
    errors: FieldErrors,
    method: PaymentMethod,
    saved_addresses: Vec<Address>,
    selected_address: Option<String>,
    stage: CheckoutStage,
    notices: Vec<Notice>,
}

impl CheckoutSession {
    /// Start checkout for the selected cart lines (all lines when `selected` is empty).
    /// A signed-in user's name and email prefill the form.
    pub fn begin(api: Arc<dyn StorefrontApi>, settings: CheckoutSettings, cart: &Cart, selected: &[String], user: Option<&User>) -> Result<Self, CheckoutError> {
        let selection = Selection::from_cart(cart, selected);
        if selection.is_empty() {
            return Err(CheckoutError::NothingSelected);
        }
        let mut info = CustomerInfo::default();
        if let Some(user) = user {
            info.name = user.display_name().to_string();
            info.email = user.email().to_string();
        }
        Ok(Self {
            api, settings, selection, info, errors: FieldErrors::new(), method: PaymentMethod::default(),
            saved_addresses: user.map(|u| u.addresses().to_vec()).unwrap_or_default(), selected_address: None,
            stage: CheckoutStage::CollectingInfo, notices: vec![],
        })
    }

    pub fn selection(&self) -> &Selection { &self.selection }
    pub fn customer_info(&self) -> &CustomerInfo { &self.info }
    pub fn errors(&self) -> &FieldErrors { &self.errors }
    pub fn error(&self, field: Field) -> Option<&str> { self.errors.get(&field).map(String::as_str) }
    pub fn payment_method(&self) -> PaymentMethod { self.method }
    pub fn saved_addresses(&self) -> &[Address] { &self.saved_addresses }
    pub fn selected_address(&self) -> Option<&str> { self.selected_address.as_deref() }
    pub fn stage(&self) -> CheckoutStage { self.stage }
    pub fn take_notices(&mut self) -> Vec<Notice> { std::mem::take(&mut self.notices) }

    pub fn order_id(&self) -> Option<Uuid> {
        match self.stage {
            CheckoutStage::CollectingInfo => None,
            CheckoutStage::AwaitingPayment { order_id } | CheckoutStage::Paid { order_id } => Some(order_id),
        }
    }

    /// Editing a field clears its error.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        *field.slot(&mut self.info) = value.into();
        self.errors.remove(&field);
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        if self.stage != CheckoutStage::CollectingInfo {
            return Err(CheckoutError::AlreadyPlaced);
        }
        self.method = method;
        Ok(())
    }

    /// Fill the form from a saved address. Email is left as entered.
    pub fn select_saved_address(&mut self, address_id: &str) -> bool {
        let Some(address) = self.saved_addresses.iter().find(|a| a.id == address_id) else { return false };
        let mut address_line = address.address_line1.clone();
        if let Some(line2) = address.address_line2.as_deref().filter(|l| !l.is_empty()) {
            address_line = format!("{address_line}, {line2}");
        }
        let values = [
            (Field::Name, address.full_name.clone()), (Field::Phone, address.phone.clone()), (Field::Address, address_line),
            (Field::City, address.city.clone()), (Field::State, address.state.clone()), (Field::ZipCode, address.zip_code.clone()),
        ];
        self.selected_address = Some(address.id.clone());
        for (field, value) in values {
            self.set_field(field, value);
        }
        true
    }

    /// Run every field rule, replacing the current errors.
    pub fn validate(&mut self) -> bool {
        self.errors = match self.info.check(&self.settings.customer_rules) {
            Ok(()) => FieldErrors::new(),
            Err(errors) => {
                let by_key = errors.field_errors();
                Field::ALL.into_iter()
                    .filter_map(|field| {
                        let message = by_key.get(field.key())?.first()?.message.as_ref()?.to_string();
                        Some((field, message))
                    })
                    .collect()
            }
        };
        self.errors.is_empty()
    }

    /// Validate, save the address to the account when it is new, then create the order.
    ///
    /// On failure the session stays in `CollectingInfo` and may be retried.
    pub async fn place_order(&mut self, auth: &mut AuthSession) -> Result<Order, CheckoutError> {
        if self.stage != CheckoutStage::CollectingInfo {
            return Err(CheckoutError::AlreadyPlaced);
        }
        if !self.validate() {
            return Err(CheckoutError::Invalid(self.errors.clone()));
        }
        if auth.user().is_none() {
            return Err(CheckoutError::NotSignedIn);
        }
        let user = self.refresh_address_book(auth).await.ok_or(CheckoutError::NotSignedIn)?;

        self.save_address(&user, auth).await;

        let new = NewOrder {
            user_id: user.uid().to_string(),
            user_email: user.email().to_string(),
            items: self.selection.line_items(),
            total_amount: self.selection.total(),
            customer_info: self.info.clone(),
            payment_method: self.method,
        };
        let order = self.api.create_order(&new).await.map_err(|e| {
            tracing::error!(uid = user.uid(), error = %e, "order placement failed");
            CheckoutError::OrderFailed(e)
        })?;
        tracing::info!(order_id = %order.id(), total = %order.total_amount(), method = self.method.label(), "order placed");
        self.stage = CheckoutStage::AwaitingPayment { order_id: order.id() };
        self.notices.push(Notice::new(NoticeLevel::Success, "Order Placed", "Your order has been placed successfully."));
        Ok(order)
    }

    /// Re-read the signed-in account so saved addresses reflect changes made elsewhere.
    /// Falls back to the locally remembered account when the read fails.
    pub async fn refresh_address_book(&mut self, auth: &mut AuthSession) -> Option<User> {
        let refreshed = auth.refresh(self.api.as_ref()).await.map(|user| user.cloned());
        let user = match refreshed {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "could not load address book, using the remembered copy");
                auth.user().cloned()
            }
        }?;
        self.saved_addresses = user.addresses().to_vec();
        Some(user)
    }

    async fn save_address(&mut self, user: &User, auth: &mut AuthSession) {
        match sync_address_book(self.api.as_ref(), user, &self.info).await {
            AddressSyncOutcome::Saved(updated) => {
                self.saved_addresses = updated.addresses().to_vec();
                if let Err(e) = auth.refresh(self.api.as_ref()).await {
                    tracing::warn!(error = %e, "could not refresh account after saving address");
                }
                self.notices.push(Notice::new(NoticeLevel::Success, "Address Saved", "This address has been added to your address book for future use."));
            }
            AddressSyncOutcome::AlreadySaved => {}
            AddressSyncOutcome::BookFull => self.notices.push(Notice::new(
                NoticeLevel::Info, "Address Book Full", "You already have 4 saved addresses, so this one was not added.",
            )),
            AddressSyncOutcome::Failed(_) => self.notices.push(Notice::new(
                NoticeLevel::Warning, "Note", "Order placed successfully. Address could not be saved to your address book.",
            )),
        }
    }

    /// Deep link for the chosen UPI app. Polling should start once the customer has been handed over.
    pub fn start_upi_payment(&mut self) -> Result<String, CheckoutError> {
        let order_id = self.awaiting_payment()?;
        self.ensure_pollable()?;
        let payee = self.settings.payees.for_method(self.method).ok_or(CheckoutError::PayeeNotConfigured(self.method.label()))?;
        let link = upi_link(payee, &self.settings.merchant_name, self.selection.total(), order_id);
        self.notices.push(Notice::new(
            NoticeLevel::Info, "Payment Initiated",
            format!("Please complete the payment in the {} app. You will be redirected automatically after payment.", self.method.label()),
        ));
        Ok(link)
    }

    /// Poll the order until it is paid, polling gives up, or `cancel` resolves.
    pub async fn await_payment(&mut self, cart: &mut CartSession, cancel: impl Future<Output = ()>) -> Result<PollOutcome, CheckoutError> {
        let order_id = self.awaiting_payment()?;
        self.ensure_pollable()?;
        let outcome = tokio::select! {
            outcome = poll_until_settled(self.api.as_ref(), order_id, &self.settings) => outcome,
            () = cancel => PollOutcome::Cancelled,
        };
        match outcome {
            PollOutcome::Confirmed { .. } => self.mark_paid(order_id, cart),
            PollOutcome::Failed => self.notices.push(Notice::new(
                NoticeLevel::Error, "Payment Failed", "Your payment could not be completed. Please try again or enter the UTR number manually.",
            )),
            PollOutcome::Exhausted { .. } => self.notices.push(Notice::new(
                NoticeLevel::Warning, "Payment Verification Timeout", "We couldn't automatically verify your payment. Please enter the UTR number manually.",
            )),
            PollOutcome::Cancelled => tracing::debug!(%order_id, "payment polling cancelled"),
        }
        Ok(outcome)
    }

    /// Confirm payment with the customer's bank reference. A malformed reference changes nothing.
    pub async fn submit_reference(&mut self, reference: &str, cart: &mut CartSession) -> Result<Order, CheckoutError> {
        let order_id = self.awaiting_payment()?;
        let utr = Utr::parse(reference)?;
        let update = PaymentUpdate { payment_status: PaymentStatus::Completed, utr_number: Some(utr.as_str().to_string()) };
        let order = self.api.update_payment(order_id, &update).await.map_err(|e| {
            tracing::error!(%order_id, error = %e, "payment confirmation failed");
            CheckoutError::PaymentUpdateFailed(e)
        })?;
        self.mark_paid(order_id, cart);
        Ok(order)
    }

    fn mark_paid(&mut self, order_id: Uuid, cart: &mut CartSession) {
        cart.clear();
        self.stage = CheckoutStage::Paid { order_id };
        self.notices.push(Notice::new(NoticeLevel::Success, "Payment Successful", "Your payment has been verified successfully!"));
    }

    fn awaiting_payment(&self) -> Result<Uuid, CheckoutError> {
        match self.stage {
            CheckoutStage::AwaitingPayment { order_id } => Ok(order_id),
            _ => Err(CheckoutError::NoOrder),
        }
    }

    fn ensure_pollable(&self) -> Result<(), CheckoutError> {
        match self.method.confirmation() {
            Confirmation::Polling => Ok(()),
            Confirmation::ManualReference => Err(CheckoutError::NotPollable(self.method.label())),
        }
    }
}
