//! Storefront API client.
//!
//! `StorefrontApi` is the seam the session and checkout code talk through;
//! `ApiClient` implements it over HTTP with reqwest.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::api::orders::{PaymentUpdate, StatusUpdate};
use crate::api::users::{WishlistRequest, WishlistResponse};
use crate::api::USER_ID_HEADER;
use crate::domain::aggregates::{AddressInput, NewOrder, NewUser, Order, OrderStatus, Product, User, WishlistEntry};

#[cfg(test)]
pub(crate) mod fake;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message} ({status})")]
    Status { status: StatusCode, message: String },
    #[error("invalid API base URL: {0}")]
    BaseUrl(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            Self::BaseUrl(_) => None,
        }
    }
    pub fn is_not_found(&self) -> bool { self.status() == Some(StatusCode::NOT_FOUND) }
    pub fn is_conflict(&self) -> bool { self.status() == Some(StatusCode::CONFLICT) }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn create_user(&self, new: &NewUser) -> ClientResult<User>;
    /// `None` when the account does not exist yet.
    async fn get_user(&self, uid: &str) -> ClientResult<Option<User>>;
    async fn add_address(&self, uid: &str, address: &AddressInput) -> ClientResult<User>;
    async fn get_wishlist(&self, uid: &str) -> ClientResult<Vec<WishlistEntry>>;
    async fn add_to_wishlist(&self, uid: &str, product_id: &str) -> ClientResult<Vec<WishlistEntry>>;
    async fn remove_from_wishlist(&self, uid: &str, product_id: &str) -> ClientResult<Vec<WishlistEntry>>;
    async fn get_product(&self, id: &str) -> ClientResult<Option<Product>>;
    async fn create_order(&self, order: &NewOrder) -> ClientResult<Order>;
    async fn get_order(&self, id: Uuid) -> ClientResult<Order>;
    async fn update_payment(&self, id: Uuid, update: &PaymentUpdate) -> ClientResult<Order>;
    async fn orders_for_user(&self, user_id: &str) -> ClientResult<Vec<Order>>;
}

#[derive(Deserialize)]
struct ErrorBody { error: String }

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    user_id: Option<String>,
}

impl ApiClient {
    pub fn new(base: Url) -> Self { Self::with_http(reqwest::Client::new(), base) }

    pub fn with_http(http: reqwest::Client, base: Url) -> Self { Self { http, base, user_id: None } }

    /// Identify every request as this account (used for admin routes).
    pub fn as_user(mut self, uid: impl Into<String>) -> Self {
        self.user_id = Some(uid.into());
        self
    }

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ClientResult<RequestBuilder> {
        let builder = self.http.request(method, self.endpoint(segments)?);
        Ok(match &self.user_id {
            Some(uid) => builder.header(USER_ID_HEADER, uid),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> ClientResult<T> {
        decode(builder.send().await?).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(builder: RequestBuilder, body: &B) -> ClientResult<T> {
        decode(builder.json(body).send().await?).await
    }

    pub async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> ClientResult<Order> {
        let id = id.to_string();
        Self::send_json(self.request(Method::PUT, &["api", "orders", &id, "status"])?, &StatusUpdate { order_status: status }).await
    }

    pub async fn list_orders(&self) -> ClientResult<Vec<Order>> {
        Self::send(self.request(Method::GET, &["api", "orders"])?).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    Err(ClientError::Status { status, message })
}

fn none_if_missing<T>(result: ClientResult<T>) -> ClientResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl StorefrontApi for ApiClient {
    async fn create_user(&self, new: &NewUser) -> ClientResult<User> {
        Self::send_json(self.request(Method::POST, &["api", "users"])?, new).await
    }

    async fn get_user(&self, uid: &str) -> ClientResult<Option<User>> {
        none_if_missing(Self::send(self.request(Method::GET, &["api", "users", uid])?).await)
    }

    async fn add_address(&self, uid: &str, address: &AddressInput) -> ClientResult<User> {
        Self::send_json(self.request(Method::POST, &["api", "users", uid, "addresses"])?, address).await
    }

    async fn get_wishlist(&self, uid: &str) -> ClientResult<Vec<WishlistEntry>> {
        let res: WishlistResponse = Self::send(self.request(Method::GET, &["api", "users", uid, "wishlist"])?).await?;
        Ok(res.wishlist)
    }

    async fn add_to_wishlist(&self, uid: &str, product_id: &str) -> ClientResult<Vec<WishlistEntry>> {
        let body = WishlistRequest { product_id: product_id.to_string() };
        let res: WishlistResponse = Self::send_json(self.request(Method::POST, &["api", "users", uid, "wishlist"])?, &body).await?;
        Ok(res.wishlist)
    }

    async fn remove_from_wishlist(&self, uid: &str, product_id: &str) -> ClientResult<Vec<WishlistEntry>> {
        let res: WishlistResponse = Self::send(self.request(Method::DELETE, &["api", "users", uid, "wishlist", product_id])?).await?;
        Ok(res.wishlist)
    }

    async fn get_product(&self, id: &str) -> ClientResult<Option<Product>> {
        none_if_missing(Self::send(self.request(Method::GET, &["api", "products", id])?).await)
    }

    async fn create_order(&self, order: &NewOrder) -> ClientResult<Order> {
        Self::send_json(self.request(Method::POST, &["api", "orders"])?, order).await
    }

    async fn get_order(&self, id: Uuid) -> ClientResult<Order> {
        let id = id.to_string();
        Self::send(self.request(Method::GET, &["api", "orders", &id])?).await
    }

    async fn update_payment(&self, id: Uuid, update: &PaymentUpdate) -> ClientResult<Order> {
        let id = id.to_string();
        Self::send_json(self.request(Method::PUT, &["api", "orders", &id, "payment"])?, update).await
    }

    async fn orders_for_user(&self, user_id: &str) -> ClientResult<Vec<Order>> {
        Self::send(self.request(Method::GET, &["api", "orders", "user", user_id])?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = ApiClient::new(Url::parse("http://127.0.0.1:3001/shop/").unwrap());
        let url = client.endpoint(&["api", "products", "category", "Dried Fruits"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3001/shop/api/products/category/Dried%20Fruits");
    }

    #[test]
    fn test_cannot_be_a_base() {
        let client = ApiClient::new(Url::parse("mailto:ops@herambha.in").unwrap());
        assert!(matches!(client.endpoint(&["api"]), Err(ClientError::BaseUrl(_))));
    }

    #[test]
    fn test_error_classification() {
        let err = ClientError::Status { status: StatusCode::NOT_FOUND, message: "Order not found".into() };
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert_eq!(err.to_string(), "Order not found (404 Not Found)");
    }
}
