//! Persisted wishlist with optimistic server sync.
//!
//! Local changes apply immediately. When signed in the change is mirrored to
//! the account; if the server refuses it the local change is rolled back.
//! The server already holding the item (on add) or already missing it (on
//! remove) counts as success.

use std::sync::Arc;

use chrono::Utc;

use super::{load_or_default, persist, KvStore, WISHLIST_KEY};
use crate::client::{ClientError, StorefrontApi};
use crate::domain::aggregates::WishlistEntry;

pub struct WishlistSession {
    kv: Arc<dyn KvStore>,
    api: Arc<dyn StorefrontApi>,
    items: Vec<WishlistEntry>,
}

impl WishlistSession {
    pub fn load(kv: Arc<dyn KvStore>, api: Arc<dyn StorefrontApi>) -> Self {
        let items: Vec<WishlistEntry> = load_or_default(kv.as_ref(), WISHLIST_KEY);
        Self { kv, api, items }
    }

    pub fn items(&self) -> &[WishlistEntry] { &self.items }
    pub fn contains(&self, product_id: &str) -> bool { self.items.iter().any(|w| w.product_id == product_id) }

    /// Returns `Ok(false)` when already present. An `Err` means the server refused and the add was undone.
    pub async fn add(&mut self, product_id: &str, uid: Option<&str>) -> Result<bool, ClientError> {
        if self.contains(product_id) { return Ok(false); }
        self.items.push(WishlistEntry { product_id: product_id.to_string(), added_at: Utc::now() });
        self.save();
        let Some(uid) = uid else { return Ok(true) };
        match self.api.add_to_wishlist(uid, product_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_conflict() => Ok(true),
            Err(e) => {
                tracing::warn!(product_id, error = %e, "wishlist add failed, rolling back");
                self.items.retain(|w| w.product_id != product_id);
                self.save();
                Err(e)
            }
        }
    }

    /// An `Err` means the server refused and the item was restored.
    pub async fn remove(&mut self, product_id: &str, uid: Option<&str>) -> Result<(), ClientError> {
        let Some(pos) = self.items.iter().position(|w| w.product_id == product_id) else { return Ok(()) };
        let removed = self.items.remove(pos);
        self.save();
        let Some(uid) = uid else { return Ok(()) };
        match self.api.remove_from_wishlist(uid, product_id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::debug!(product_id, "wishlist item already removed on server");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(product_id, error = %e, "wishlist remove failed, restoring item");
                self.items.insert(pos.min(self.items.len()), removed);
                self.save();
                Err(e)
            }
        }
    }

    /// Replace local state with the account's wishlist. Failures keep local state.
    pub async fn load_from_account(&mut self, uid: &str) {
        match self.api.get_wishlist(uid).await {
            Ok(items) => {
                self.items = items;
                self.save();
            }
            Err(e) => tracing::warn!(uid, error = %e, "could not load wishlist from account"),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.save();
    }

    fn save(&self) { persist(self.kv.as_ref(), WISHLIST_KEY, &self.items); }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::client::fake::FakeApi;
    use crate::session::MemoryKvStore;

    fn session(api: &Arc<FakeApi>) -> (Arc<dyn KvStore>, WishlistSession) {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let session = WishlistSession::load(kv.clone(), api.clone());
        (kv, session)
    }

    #[tokio::test]
    async fn test_add_syncs_to_account() {
        let api = Arc::new(FakeApi::with_user("u1", "asha@example.com"));
        let (kv, mut wishlist) = session(&api);
        assert!(wishlist.add("badam-500g", Some("u1")).await.unwrap());
        assert!(!wishlist.add("badam-500g", Some("u1")).await.unwrap());
        assert_eq!(api.user("u1").unwrap().wishlist().len(), 1);
        assert!(WishlistSession::load(kv, api.clone()).contains("badam-500g"));
    }

    #[tokio::test]
    async fn test_add_rolls_back_on_server_error() {
        let api = Arc::new(FakeApi::with_user("u1", "asha@example.com"));
        FakeApi::set(&api.fail_wishlist, Some(StatusCode::INTERNAL_SERVER_ERROR));
        let (kv, mut wishlist) = session(&api);
        assert!(wishlist.add("badam-500g", Some("u1")).await.is_err());
        assert!(!wishlist.contains("badam-500g"));
        assert!(WishlistSession::load(kv, api.clone()).items().is_empty());
    }

    #[tokio::test]
    async fn test_add_treats_existing_server_item_as_success() {
        let api = Arc::new(FakeApi::with_user("u1", "asha@example.com"));
        api.users.lock().unwrap().get_mut("u1").unwrap().add_to_wishlist("badam-500g").unwrap();
        let (_, mut wishlist) = session(&api);
        assert!(wishlist.add("badam-500g", Some("u1")).await.unwrap());
        assert!(wishlist.contains("badam-500g"));
    }

    #[tokio::test]
    async fn test_anonymous_add_stays_local() {
        let api = Arc::new(FakeApi::default());
        FakeApi::set(&api.fail_wishlist, Some(StatusCode::INTERNAL_SERVER_ERROR));
        let (_, mut wishlist) = session(&api);
        assert!(wishlist.add("kaju-250g", None).await.unwrap());
        assert!(wishlist.contains("kaju-250g"));
    }

    #[tokio::test]
    async fn test_remove_missing_on_server_is_fine() {
        let api = Arc::new(FakeApi::with_user("u1", "asha@example.com"));
        let (_, mut wishlist) = session(&api);
        wishlist.add("kaju-250g", None).await.unwrap();
        wishlist.remove("kaju-250g", Some("u1")).await.unwrap();
        assert!(wishlist.items().is_empty());
    }

    #[tokio::test]
    async fn test_remove_restores_position_on_error() {
        let api = Arc::new(FakeApi::with_user("u1", "asha@example.com"));
        let (_, mut wishlist) = session(&api);
        for id in ["a", "b", "c"] {
            wishlist.add(id, None).await.unwrap();
        }
        FakeApi::set(&api.fail_wishlist, Some(StatusCode::BAD_GATEWAY));
        assert!(wishlist.remove("b", Some("u1")).await.is_err());
        let ids: Vec<_> = wishlist.items().iter().map(|w| w.product_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_load_from_account_replaces_local_items() {
        let api = Arc::new(FakeApi::with_user("u1", "asha@example.com"));
        api.users.lock().unwrap().get_mut("u1").unwrap().add_to_wishlist("pista-1kg").unwrap();
        let (_, mut wishlist) = session(&api);
        wishlist.add("local-only", None).await.unwrap();
        wishlist.load_from_account("u1").await;
        let ids: Vec<_> = wishlist.items().iter().map(|w| w.product_id.as_str()).collect();
        assert_eq!(ids, ["pista-1kg"]);

        wishlist.load_from_account("nobody").await;
        assert_eq!(wishlist.items().len(), 1);
    }
}
