//! Postgres document store: one JSONB document per record.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CatalogStore, OrderStore, StoreError, StoreResult, UserStore};
use crate::domain::aggregates::{Order, Product, User};

#[derive(Clone)]
pub struct PgStore { db: PgPool }

impl PgStore {
    pub fn new(db: PgPool) -> Self { Self { db } }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db).await
    }
}

fn conflict_or(err: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(what()),
        _ => StoreError::Database(err),
    }
}

fn not_found_unless(rows: u64, what: impl FnOnce() -> String) -> StoreResult<()> {
    if rows == 0 { Err(StoreError::NotFound(what())) } else { Ok(()) }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, (Json<Product>,)>("SELECT doc FROM products ORDER BY created_at, id").fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(|(Json(p),)| p).collect())
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, (Json<Product>,)>("SELECT doc FROM products WHERE id = $1").bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(p),)| p))
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query("INSERT INTO products (id, created_at, doc) VALUES ($1, $2, $3)")
            .bind(product.id()).bind(product.created_at()).bind(Json(product))
            .execute(&self.db).await.map_err(|e| conflict_or(e, || format!("product {}", product.id())))?;
        Ok(())
    }

    async fn save_product(&self, product: &Product) -> StoreResult<()> {
        let done = sqlx::query("UPDATE products SET doc = $2, updated_at = NOW() WHERE id = $1")
            .bind(product.id()).bind(Json(product)).execute(&self.db).await?;
        not_found_unless(done.rows_affected(), || format!("product {}", product.id()))
    }

    async fn delete_product(&self, id: &str) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, uid: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, (Json<User>,)>("SELECT doc FROM users WHERE uid = $1").bind(uid).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(u),)| u))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, (Json<User>,)>("SELECT doc FROM users WHERE email = LOWER($1)").bind(email).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(u),)| u))
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query("INSERT INTO users (uid, email, created_at, doc) VALUES ($1, LOWER($2), $3, $4)")
            .bind(user.uid()).bind(user.email()).bind(user.created_at()).bind(Json(user))
            .execute(&self.db).await.map_err(|e| conflict_or(e, || format!("user {}", user.uid())))?;
        Ok(())
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let done = sqlx::query("UPDATE users SET doc = $2, updated_at = NOW() WHERE uid = $1")
            .bind(user.uid()).bind(Json(user)).execute(&self.db).await?;
        not_found_unless(done.rows_affected(), || format!("user {}", user.uid()))
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        sqlx::query("INSERT INTO orders (id, user_id, created_at, doc) VALUES ($1, $2, $3, $4)")
            .bind(order.id()).bind(order.user_id()).bind(order.created_at()).bind(Json(order))
            .execute(&self.db).await.map_err(|e| conflict_or(e, || format!("order {}", order.id())))?;
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, (Json<Order>,)>("SELECT doc FROM orders WHERE id = $1").bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(o),)| o))
    }

    async fn save_order(&self, order: &Order) -> StoreResult<()> {
        let done = sqlx::query("UPDATE orders SET doc = $2, updated_at = NOW() WHERE id = $1")
            .bind(order.id()).bind(Json(order)).execute(&self.db).await?;
        not_found_unless(done.rows_affected(), || format!("order {}", order.id()))
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, (Json<Order>,)>("SELECT doc FROM orders ORDER BY created_at DESC, id DESC").fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(|(Json(o),)| o).collect())
    }

    async fn orders_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, (Json<Order>,)>("SELECT doc FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(user_id).fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(|(Json(o),)| o).collect())
    }
}
