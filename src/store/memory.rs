//! In-memory document store.
//!
//! Backed by DashMap; used when no database is configured and in tests.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{newest_first, CatalogStore, OrderStore, StoreError, StoreResult, UserStore};
use crate::domain::aggregates::{Order, Product, User};

#[derive(Clone, Default)]
pub struct MemoryStore {
    products: Arc<DashMap<String, Product>>,
    users: Arc<DashMap<String, User>>,
    /// lower-cased email -> uid
    emails: Arc<DashMap<String, String>>,
    orders: Arc<DashMap<Uuid, Order>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let mut all: Vec<Product> = self.products.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())));
        Ok(all)
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.get(id).map(|p| p.value().clone()))
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        match self.products.entry(product.id().to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("product {}", product.id()))),
            Entry::Vacant(slot) => { slot.insert(product.clone()); Ok(()) }
        }
    }

    async fn save_product(&self, product: &Product) -> StoreResult<()> {
        let mut slot = self.products.get_mut(product.id()).ok_or_else(|| StoreError::NotFound(format!("product {}", product.id())))?;
        *slot = product.clone();
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> StoreResult<bool> {
        Ok(self.products.remove(id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, uid: &str) -> StoreResult<Option<User>> {
        Ok(self.users.get(uid).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let Some(uid) = self.emails.get(&email.to_lowercase()).map(|e| e.value().clone()) else { return Ok(None) };
        self.find_user(&uid).await
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        if self.users.contains_key(user.uid()) {
            return Err(StoreError::Conflict(format!("user {}", user.uid())));
        }
        match self.emails.entry(user.email().to_lowercase()) {
            Entry::Occupied(_) => return Err(StoreError::Conflict(format!("email {}", user.email()))),
            Entry::Vacant(slot) => { slot.insert(user.uid().to_string()); }
        }
        match self.users.entry(user.uid().to_string()) {
            Entry::Occupied(_) => {
                self.emails.remove(&user.email().to_lowercase());
                Err(StoreError::Conflict(format!("user {}", user.uid())))
            }
            Entry::Vacant(slot) => { slot.insert(user.clone()); Ok(()) }
        }
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut slot = self.users.get_mut(user.uid()).ok_or_else(|| StoreError::NotFound(format!("user {}", user.uid())))?;
        *slot = user.clone();
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        match self.orders.entry(order.id()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("order {}", order.id()))),
            Entry::Vacant(slot) => { slot.insert(order.clone()); Ok(()) }
        }
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(&id).map(|o| o.value().clone()))
    }

    async fn save_order(&self, order: &Order) -> StoreResult<()> {
        let mut slot = self.orders.get_mut(&order.id()).ok_or_else(|| StoreError::NotFound(format!("order {}", order.id())))?;
        *slot = order.clone();
        Ok(())
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let mut all: Vec<Order> = self.orders.iter().map(|e| e.value().clone()).collect();
        newest_first(&mut all);
        Ok(all)
    }

    async fn orders_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        let mut mine: Vec<Order> = self.orders.iter().filter(|e| e.user_id() == user_id).map(|e| e.value().clone()).collect();
        newest_first(&mut mine);
        Ok(mine)
    }
}
