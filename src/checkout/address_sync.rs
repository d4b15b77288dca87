//! Saving the checkout address into the account's address book.
//!
//! Checkout collects one free-text address line; the book stores two. The
//! line is split on its first comma. Two addresses are the same when all
//! seven fields agree after trimming, ignoring case except for phone and ZIP.

use crate::client::{ClientError, StorefrontApi};
use crate::domain::aggregates::{Address, AddressInput, CustomerInfo, User, MAX_ADDRESSES};

/// `"12 MG Road, Near Metro, Block B"` → `("12 MG Road", "Near Metro, Block B")`.
pub fn split_address_line(address: &str) -> (String, String) {
    match address.split_once(',') {
        Some((line1, rest)) => (line1.trim().to_string(), rest.trim().to_string()),
        None => (address.trim().to_string(), String::new()),
    }
}

/// Comparison form of an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

fn text(s: &str) -> String { s.trim().to_lowercase() }

impl NormalizedAddress {
    pub fn from_customer(info: &CustomerInfo) -> Self {
        let (line1, line2) = split_address_line(&info.address);
        Self {
            full_name: text(&info.name), phone: info.phone.trim().to_string(),
            address_line1: text(&line1), address_line2: text(&line2),
            city: text(&info.city), state: text(&info.state), zip_code: info.zip_code.trim().to_string(),
        }
    }

    pub fn from_saved(address: &Address) -> Self {
        Self {
            full_name: text(&address.full_name), phone: address.phone.trim().to_string(),
            address_line1: text(&address.address_line1), address_line2: text(address.address_line2.as_deref().unwrap_or_default()),
            city: text(&address.city), state: text(&address.state), zip_code: address.zip_code.trim().to_string(),
        }
    }
}

pub fn is_address_new(info: &CustomerInfo, saved: &[Address]) -> bool {
    let current = NormalizedAddress::from_customer(info);
    !saved.iter().any(|a| NormalizedAddress::from_saved(a) == current)
}

/// Book entry for the checkout address. The first saved address becomes the default.
pub fn address_input(info: &CustomerInfo, saved: &[Address]) -> AddressInput {
    let (address_line1, address_line2) = split_address_line(&info.address);
    AddressInput {
        full_name: info.name.clone(), phone: info.phone.clone(), address_line1,
        address_line2: Some(address_line2).filter(|l| !l.is_empty()),
        city: info.city.clone(), state: info.state.clone(), zip_code: info.zip_code.clone(),
        is_default: saved.is_empty(),
    }
}

#[derive(Debug)]
pub enum AddressSyncOutcome {
    /// The address was added; carries the account as the server returned it.
    Saved(User),
    AlreadySaved,
    BookFull,
    Failed(ClientError),
}

/// Add the checkout address to the account unless it is already there or the book is full.
/// Never fails; the caller decides how loudly to report the outcome.
pub async fn sync_address_book(api: &dyn StorefrontApi, user: &User, info: &CustomerInfo) -> AddressSyncOutcome {
    let saved = user.addresses();
    if !is_address_new(info, saved) {
        return AddressSyncOutcome::AlreadySaved;
    }
    if saved.len() >= MAX_ADDRESSES {
        tracing::info!(uid = user.uid(), "address book full, not saving checkout address");
        return AddressSyncOutcome::BookFull;
    }
    match api.add_address(user.uid(), &address_input(info, saved)).await {
        Ok(updated) => AddressSyncOutcome::Saved(updated),
        Err(e) => {
            tracing::warn!(uid = user.uid(), error = %e, "failed to save checkout address");
            AddressSyncOutcome::Failed(e)
        }
    }
}
