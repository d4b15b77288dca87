//! In-process `StorefrontApi` for unit tests, with switchable failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use uuid::Uuid;

use super::{ClientError, ClientResult, StorefrontApi};
use crate::api::orders::PaymentUpdate;
use crate::domain::aggregates::{AddressInput, NewOrder, NewUser, Order, PaymentStatus, Product, Role, User, UserError, WishlistEntry};
use crate::domain::value_objects::Utr;

fn status(status: StatusCode, message: &str) -> ClientError {
    ClientError::Status { status, message: message.to_string() }
}

fn from_user_error(e: UserError) -> ClientError {
    let code = match e {
        UserError::AddressLimit => StatusCode::BAD_REQUEST,
        UserError::AlreadyInWishlist => StatusCode::CONFLICT,
        UserError::AddressNotFound | UserError::NotInWishlist => StatusCode::NOT_FOUND,
    };
    status(code, &e.to_string())
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub users: Mutex<HashMap<String, User>>,
    pub orders: Mutex<HashMap<Uuid, Order>>,
    pub products: Mutex<HashMap<String, Product>>,
    /// Forced failure for account-read, address, wishlist, order-create and order-read calls
    pub fail_user_reads: Mutex<Option<StatusCode>>,
    pub fail_addresses: Mutex<Option<StatusCode>>,
    pub fail_wishlist: Mutex<Option<StatusCode>>,
    pub fail_create_order: Mutex<Option<StatusCode>>,
    pub fail_polls: Mutex<Option<StatusCode>>,
    /// Mark the order paid on this poll (1-based)
    pub complete_on_poll: Mutex<Option<u32>>,
    pub fail_on_poll: Mutex<Option<u32>>,
    pub polls: AtomicU32,
    pub address_posts: AtomicU32,
}

impl FakeApi {
    pub fn with_user(uid: &str, email: &str) -> Self {
        let api = Self::default();
        let user = User::register(NewUser { uid: uid.into(), email: email.into(), display_name: None, photo_url: None }, Role::Customer);
        api.users.lock().unwrap().insert(uid.to_string(), user);
        api
    }

    pub fn user(&self, uid: &str) -> Option<User> { self.users.lock().unwrap().get(uid).cloned() }
    pub fn order(&self, id: Uuid) -> Option<Order> { self.orders.lock().unwrap().get(&id).cloned() }
    pub fn set(slot: &Mutex<Option<StatusCode>>, code: Option<StatusCode>) { *slot.lock().unwrap() = code; }

    fn forced(slot: &Mutex<Option<StatusCode>>) -> ClientResult<()> {
        match *slot.lock().unwrap() {
            Some(code) => Err(status(code, "forced failure")),
            None => Ok(()),
        }
    }

    fn with_user_mut<T>(&self, uid: &str, f: impl FnOnce(&mut User) -> Result<T, UserError>) -> ClientResult<T> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(uid).ok_or_else(|| status(StatusCode::NOT_FOUND, "User not found"))?;
        f(user).map_err(from_user_error)
    }
}

#[async_trait]
impl StorefrontApi for FakeApi {
    async fn create_user(&self, new: &NewUser) -> ClientResult<User> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.values().find(|u| u.uid() == new.uid || u.email() == new.email) {
            return Ok(existing.clone());
        }
        let user = User::register(new.clone(), Role::Customer);
        users.insert(user.uid().to_string(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, uid: &str) -> ClientResult<Option<User>> {
        Self::forced(&self.fail_user_reads)?;
        Ok(self.user(uid))
    }

    async fn add_address(&self, uid: &str, address: &AddressInput) -> ClientResult<User> {
        self.address_posts.fetch_add(1, Ordering::SeqCst);
        Self::forced(&self.fail_addresses)?;
        self.with_user_mut(uid, |u| { u.add_address(address.clone())?; Ok(u.clone()) })
    }

    async fn get_wishlist(&self, uid: &str) -> ClientResult<Vec<WishlistEntry>> {
        self.user(uid).map(|u| u.wishlist().to_vec()).ok_or_else(|| status(StatusCode::NOT_FOUND, "User not found"))
    }

    async fn add_to_wishlist(&self, uid: &str, product_id: &str) -> ClientResult<Vec<WishlistEntry>> {
        Self::forced(&self.fail_wishlist)?;
        self.with_user_mut(uid, |u| { u.add_to_wishlist(product_id)?; Ok(u.wishlist().to_vec()) })
    }

    async fn remove_from_wishlist(&self, uid: &str, product_id: &str) -> ClientResult<Vec<WishlistEntry>> {
        Self::forced(&self.fail_wishlist)?;
        self.with_user_mut(uid, |u| { u.remove_from_wishlist(product_id)?; Ok(u.wishlist().to_vec()) })
    }

    async fn get_product(&self, id: &str) -> ClientResult<Option<Product>> { Ok(self.products.lock().unwrap().get(id).cloned()) }

    async fn create_order(&self, order: &NewOrder) -> ClientResult<Order> {
        Self::forced(&self.fail_create_order)?;
        let order = Order::place(order.clone()).map_err(|e| status(StatusCode::BAD_REQUEST, &e.to_string()))?;
        self.orders.lock().unwrap().insert(order.id(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> ClientResult<Order> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        Self::forced(&self.fail_polls)?;
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&id).ok_or_else(|| status(StatusCode::NOT_FOUND, "Order not found"))?;
        if *self.complete_on_poll.lock().unwrap() == Some(poll) {
            let _ = order.update_payment(PaymentStatus::Completed, None);
        }
        if *self.fail_on_poll.lock().unwrap() == Some(poll) {
            let _ = order.update_payment(PaymentStatus::Failed, None);
        }
        Ok(order.clone())
    }

    async fn update_payment(&self, id: Uuid, update: &PaymentUpdate) -> ClientResult<Order> {
        let utr = update.utr_number.as_deref().map(Utr::parse).transpose().map_err(|e| status(StatusCode::BAD_REQUEST, &e.to_string()))?;
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&id).ok_or_else(|| status(StatusCode::NOT_FOUND, "Order not found"))?;
        order.update_payment(update.payment_status, utr).map_err(|e| status(StatusCode::CONFLICT, &e.to_string()))?;
        Ok(order.clone())
    }

    async fn orders_for_user(&self, user_id: &str) -> ClientResult<Vec<Order>> {
        Ok(self.orders.lock().unwrap().values().filter(|o| o.user_id() == user_id).cloned().collect())
    }
}
