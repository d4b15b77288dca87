//! Herambha Storefront
//!
//! Dry-fruit storefront: catalog, accounts with address book and wishlist,
//! orders, and the checkout that takes a cart through UPI or bank-transfer
//! payment.
//!
//! ## Layout
//! - `domain`: aggregates, value objects and domain events
//! - `store`: document stores (Postgres JSONB, in-memory)
//! - `api`: axum HTTP API over the stores
//! - `client`, `session`, `checkout`: the customer-side workflow over the API

pub mod api;
pub mod checkout;
pub mod client;
pub mod config;
pub mod domain;
pub mod events;
pub mod seed;
pub mod session;
pub mod store;
pub mod telemetry;

pub use domain::aggregates::{Cart, Order, Product, User};
pub use domain::value_objects::Money;
