//! Document stores for the catalog, accounts and orders.
//!
//! Every record is one self-contained document. Handlers load a document,
//! mutate the aggregate and write it back; concurrent writers are
//! last-write-wins.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::aggregates::{Order, Product, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products, oldest first.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>>;
    /// Insert a new product. Fails with `Conflict` when the id is taken.
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    /// Replace an existing product. Fails with `NotFound` when absent.
    async fn save_product(&self, product: &Product) -> StoreResult<()>;
    /// Returns true if a product was deleted.
    async fn delete_product(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, uid: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Insert a new account. Fails with `Conflict` when uid or email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn save_user(&self, user: &User) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn save_order(&self, order: &Order) -> StoreResult<()>;
    /// Every order, newest first.
    async fn list_orders(&self) -> StoreResult<Vec<Order>>;
    /// One customer's orders, newest first.
    async fn orders_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>>;
}

/// Newest first; uuid v7 ids break ties in creation order.
pub(crate) fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| b.id().cmp(&a.id())));
}
