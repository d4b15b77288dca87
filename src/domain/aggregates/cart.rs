//! Cart Aggregate
//!
//! The cart lives on the client only. `item_count` and `total` are derived and
//! recomputed after every mutation, so they are never trusted from storage.

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredCart")]
pub struct Cart {
    items: Vec<CartLine>,
    item_count: u32,
    total: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Money { self.product.price().multiply(self.quantity) }
}

#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<CartLine>,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        let mut cart = Cart { items: stored.items, ..Default::default() };
        cart.items.retain(|l| l.quantity > 0);
        cart.recalculate();
        cart
    }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartLine] { &self.items }
    pub fn item_count(&self) -> u32 { self.item_count }
    pub fn total(&self) -> Money { self.total }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn line(&self, product_id: &str) -> Option<&CartLine> { self.items.iter().find(|l| l.product_id == product_id) }

    /// Add `quantity` of a product, merging with an existing line.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 { return; }
        match self.items.iter_mut().find(|l| l.product_id == product.id()) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                line.product = product.clone();
            }
            None => self.items.push(CartLine { product_id: product.id().to_string(), product: product.clone(), quantity }),
        }
        self.recalculate();
    }

    /// Set a line's quantity; zero or below removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), CartError> {
        let pos = self.items.iter().position(|l| l.product_id == product_id).ok_or(CartError::ItemNotFound)?;
        if quantity <= 0 {
            self.items.remove(pos);
        } else {
            self.items[pos].quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        self.recalculate();
        Ok(())
    }

    pub fn remove(&mut self, product_id: &str) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|l| l.product_id != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); self.recalculate(); }

    fn recalculate(&mut self) {
        self.item_count = self.items.iter().fold(0u32, |n, l| n.saturating_add(l.quantity));
        self.total = self.items.iter().map(CartLine::line_total).sum::<Money>().rounded();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Item not found in cart")]
    ItemNotFound,
}
