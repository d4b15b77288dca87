//! Persisted cart.

use std::sync::Arc;

use super::{load_or_default, persist, KvStore, CART_KEY};
use crate::domain::aggregates::{Cart, CartError, Product};

pub struct CartSession {
    kv: Arc<dyn KvStore>,
    cart: Cart,
}

impl CartSession {
    pub fn load(kv: Arc<dyn KvStore>) -> Self {
        let cart: Cart = load_or_default(kv.as_ref(), CART_KEY);
        Self { kv, cart }
    }

    pub fn cart(&self) -> &Cart { &self.cart }

    pub fn add(&mut self, product: &Product, quantity: u32) {
        self.cart.add(product, quantity);
        self.save();
    }

    /// Zero or below removes the line. Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) {
        match self.cart.update_quantity(product_id, quantity) {
            Ok(()) => self.save(),
            Err(CartError::ItemNotFound) => tracing::debug!(product_id, "quantity update for product not in cart"),
        }
    }

    pub fn remove(&mut self, product_id: &str) {
        if self.cart.remove(product_id).is_ok() { self.save(); }
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.save();
    }

    fn save(&self) { persist(self.kv.as_ref(), CART_KEY, &self.cart); }
}
