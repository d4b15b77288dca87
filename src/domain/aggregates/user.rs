//! User Aggregate: account, address book and wishlist

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Saved addresses per account.
pub const MAX_ADDRESSES: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    uid: String,
    email: String,
    display_name: String,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    addresses: Vec<Address>,
    #[serde(default)]
    wishlist: Vec<WishlistEntry>,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Address as submitted by a client, without server-assigned id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address line is required"))]
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "ZIP code is required"))]
    pub zip_code: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Partial address edit; absent fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub product_id: String,
    pub added_at: DateTime<Utc>,
}

/// Sign-in payload for the idempotent account upsert.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 1, message = "uid is required"))]
    pub uid: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl User {
    pub fn register(new: NewUser, role: Role) -> Self {
        let display_name = new.display_name.filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| new.email.split('@').next().unwrap_or_default().to_string());
        Self {
            uid: new.uid, email: new.email, display_name, photo_url: new.photo_url, role,
            addresses: vec![], wishlist: vec![], created_at: Utc::now(),
        }
    }

    pub fn uid(&self) -> &str { &self.uid }
    pub fn email(&self) -> &str { &self.email }
    pub fn display_name(&self) -> &str { &self.display_name }
    pub fn role(&self) -> Role { self.role }
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
    pub fn addresses(&self) -> &[Address] { &self.addresses }
    pub fn wishlist(&self) -> &[WishlistEntry] { &self.wishlist }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn default_address(&self) -> Option<&Address> { self.addresses.iter().find(|a| a.is_default) }

    pub fn set_role(&mut self, role: Role) { self.role = role; }

    // -------------------------------------------------------------------------
    // Address book
    // -------------------------------------------------------------------------

    /// Append an address. The first address is always default; a new default demotes the rest.
    pub fn add_address(&mut self, input: AddressInput) -> Result<&Address, UserError> {
        if self.addresses.len() >= MAX_ADDRESSES { return Err(UserError::AddressLimit); }
        let is_default = self.addresses.is_empty() || input.is_default;
        if is_default { self.clear_default(); }
        self.addresses.push(Address {
            id: Uuid::new_v4().to_string(), full_name: input.full_name, phone: input.phone,
            address_line1: input.address_line1, address_line2: input.address_line2.filter(|l| !l.trim().is_empty()),
            city: input.city, state: input.state, zip_code: input.zip_code, is_default,
        });
        self.ensure_default();
        Ok(&self.addresses[self.addresses.len() - 1])
    }

    pub fn update_address(&mut self, address_id: &str, patch: AddressPatch) -> Result<&Address, UserError> {
        let idx = self.address_index(address_id)?;
        if patch.is_default == Some(true) { self.clear_default(); }
        let addr = &mut self.addresses[idx];
        if let Some(v) = patch.full_name { addr.full_name = v; }
        if let Some(v) = patch.phone { addr.phone = v; }
        if let Some(v) = patch.address_line1 { addr.address_line1 = v; }
        if let Some(v) = patch.address_line2 { addr.address_line2 = Some(v).filter(|l| !l.trim().is_empty()); }
        if let Some(v) = patch.city { addr.city = v; }
        if let Some(v) = patch.state { addr.state = v; }
        if let Some(v) = patch.zip_code { addr.zip_code = v; }
        if let Some(v) = patch.is_default { addr.is_default = v; }
        self.ensure_default();
        Ok(&self.addresses[idx])
    }

    /// Remove an address; if it was the default the first remaining one is promoted.
    pub fn remove_address(&mut self, address_id: &str) -> Result<Address, UserError> {
        let idx = self.address_index(address_id)?;
        let removed = self.addresses.remove(idx);
        self.ensure_default();
        Ok(removed)
    }

    pub fn set_default_address(&mut self, address_id: &str) -> Result<&Address, UserError> {
        let idx = self.address_index(address_id)?;
        self.clear_default();
        self.addresses[idx].is_default = true;
        Ok(&self.addresses[idx])
    }

    fn address_index(&self, address_id: &str) -> Result<usize, UserError> {
        self.addresses.iter().position(|a| a.id == address_id).ok_or(UserError::AddressNotFound)
    }

    fn clear_default(&mut self) { self.addresses.iter_mut().for_each(|a| a.is_default = false); }

    // exactly one default whenever the book is non-empty
    fn ensure_default(&mut self) {
        let mut seen = false;
        for a in self.addresses.iter_mut() {
            if a.is_default && seen { a.is_default = false; }
            seen |= a.is_default;
        }
        if !seen {
            if let Some(first) = self.addresses.first_mut() { first.is_default = true; }
        }
    }

    // -------------------------------------------------------------------------
    // Wishlist
    // -------------------------------------------------------------------------

    pub fn add_to_wishlist(&mut self, product_id: &str) -> Result<(), UserError> {
        if self.wishlist.iter().any(|w| w.product_id == product_id) { return Err(UserError::AlreadyInWishlist); }
        self.wishlist.push(WishlistEntry { product_id: product_id.to_string(), added_at: Utc::now() });
        Ok(())
    }

    pub fn remove_from_wishlist(&mut self, product_id: &str) -> Result<(), UserError> {
        let idx = self.wishlist.iter().position(|w| w.product_id == product_id).ok_or(UserError::NotInWishlist)?;
        self.wishlist.remove(idx);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    #[error("Maximum 4 addresses allowed")]
    AddressLimit,
    #[error("Address not found")]
    AddressNotFound,
    #[error("Product already in wishlist")]
    AlreadyInWishlist,
    #[error("Product not found in wishlist")]
    NotInWishlist,
}

#[cfg(test)]
pub(crate) fn address_input(name: &str, line1: &str) -> AddressInput {
    AddressInput {
        full_name: name.into(), phone: "9876543210".into(), address_line1: line1.into(), address_line2: None,
        city: "Bengaluru".into(), state: "Karnataka".into(), zip_code: "560001".into(), is_default: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::register(NewUser { uid: "user-1".into(), email: "asha@example.com".into(), display_name: None, photo_url: None }, Role::Customer)
    }

    fn defaults(u: &User) -> usize { u.addresses().iter().filter(|a| a.is_default).count() }

    #[test]
    fn test_display_name_falls_back_to_email_local_part() {
        assert_eq!(user().display_name(), "asha");
    }

    #[test]
    fn test_first_address_becomes_default() {
        let mut u = user();
        assert!(u.add_address(address_input("Asha", "12 MG Road")).unwrap().is_default);
        assert!(!u.add_address(address_input("Asha", "14 MG Road")).unwrap().is_default);
        assert_eq!(defaults(&u), 1);
    }

    #[test]
    fn test_new_default_demotes_previous() {
        let mut u = user();
        u.add_address(address_input("Asha", "12 MG Road")).unwrap();
        let mut second = address_input("Ravi", "1 Park St");
        second.is_default = true;
        let id = u.add_address(second).unwrap().id.clone();
        assert_eq!(u.default_address().unwrap().id, id);
        assert_eq!(defaults(&u), 1);
    }

    #[test]
    fn test_address_limit() {
        let mut u = user();
        for i in 0..MAX_ADDRESSES { u.add_address(address_input("Asha", &format!("{i} MG Road"))).unwrap(); }
        assert_eq!(u.add_address(address_input("Asha", "5 MG Road")).unwrap_err(), UserError::AddressLimit);
        assert_eq!(u.addresses().len(), MAX_ADDRESSES);
    }

    #[test]
    fn test_deleting_default_promotes_first_remaining() {
        let mut u = user();
        let first = u.add_address(address_input("Asha", "12 MG Road")).unwrap().id.clone();
        let second = u.add_address(address_input("Asha", "14 MG Road")).unwrap().id.clone();
        u.add_address(address_input("Asha", "16 MG Road")).unwrap();
        u.remove_address(&first).unwrap();
        assert_eq!(u.default_address().unwrap().id, second);
        assert_eq!(defaults(&u), 1);
    }

    #[test]
    fn test_unsetting_only_default_keeps_one_default() {
        let mut u = user();
        let id = u.add_address(address_input("Asha", "12 MG Road")).unwrap().id.clone();
        u.update_address(&id, AddressPatch { is_default: Some(false), city: Some("Mysuru".into()), ..Default::default() }).unwrap();
        assert_eq!(defaults(&u), 1);
        assert_eq!(u.addresses()[0].city, "Mysuru");
    }

    #[test]
    fn test_set_default_and_unknown_address() {
        let mut u = user();
        u.add_address(address_input("Asha", "12 MG Road")).unwrap();
        let second = u.add_address(address_input("Asha", "14 MG Road")).unwrap().id.clone();
        u.set_default_address(&second).unwrap();
        assert_eq!(u.default_address().unwrap().id, second);
        assert_eq!(defaults(&u), 1);
        assert_eq!(u.set_default_address("nope").unwrap_err(), UserError::AddressNotFound);
        assert_eq!(u.remove_address("nope").unwrap_err(), UserError::AddressNotFound);
    }

    #[test]
    fn test_wishlist_uniqueness() {
        let mut u = user();
        u.add_to_wishlist("kaju-500g").unwrap();
        assert_eq!(u.add_to_wishlist("kaju-500g").unwrap_err(), UserError::AlreadyInWishlist);
        u.remove_from_wishlist("kaju-500g").unwrap();
        assert_eq!(u.remove_from_wishlist("kaju-500g").unwrap_err(), UserError::NotInWishlist);
    }
}
