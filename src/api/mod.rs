//! HTTP API
//!
//! Stateless JSON handlers over the document stores.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::events::EventPublisher;
use crate::store::{CatalogStore, MemoryStore, OrderStore, UserStore};

pub mod error;
pub mod extract;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

pub use error::{ApiError, ApiResult};
pub use extract::{AdminUser, USER_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub users: Arc<dyn UserStore>,
    pub orders: Arc<dyn OrderStore>,
    pub events: EventPublisher,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// All three stores served by one backend.
    pub fn new<S>(store: S, events: EventPublisher, config: AppConfig) -> Self
    where
        S: CatalogStore + UserStore + OrderStore + Clone + 'static,
    {
        Self {
            catalog: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            orders: Arc::new(store),
            events,
            config: Arc::new(config),
        }
    }

    pub fn in_memory(config: AppConfig) -> Self { Self::new(MemoryStore::new(), EventPublisher::default(), config) }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "herambha-storefront"})) }))
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/featured", get(products::featured))
        .route("/api/products/categories", get(products::categories))
        .route("/api/products/category/:category", get(products::by_category))
        .route("/api/products/:id", get(products::get).put(products::update).delete(products::delete))
        .route("/api/users", post(users::upsert))
        .route("/api/users/:uid", get(users::get))
        .route("/api/users/:uid/addresses", post(users::add_address))
        .route("/api/users/:uid/addresses/:address_id", put(users::update_address).delete(users::delete_address))
        .route("/api/users/:uid/addresses/:address_id/default", put(users::set_default_address))
        .route("/api/users/:uid/wishlist", get(users::wishlist).post(users::add_to_wishlist))
        .route("/api/users/:uid/wishlist/:product_id", axum::routing::delete(users::remove_from_wishlist))
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/user/:user_id", get(orders::for_user))
        .route("/api/orders/:id", get(orders::get))
        .route("/api/orders/:id/payment", put(orders::update_payment))
        .route("/api/orders/:id/status", put(orders::update_status))
        .route("/api/payments/webhook", post(payments::webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
