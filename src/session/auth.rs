//! Signed-in account.

use std::sync::Arc;

use uuid::Uuid;

use super::{load, persist, KvStore, USER_KEY};
use crate::client::{ClientResult, StorefrontApi};
use crate::domain::aggregates::{NewUser, User};

pub struct AuthSession {
    kv: Arc<dyn KvStore>,
    user: Option<User>,
}

impl AuthSession {
    pub fn load(kv: Arc<dyn KvStore>) -> Self {
        let user = load::<User>(kv.as_ref(), USER_KEY);
        Self { kv, user }
    }

    pub fn user(&self) -> Option<&User> { self.user.as_ref() }
    pub fn uid(&self) -> Option<&str> { self.user.as_ref().map(User::uid) }
    pub fn is_signed_in(&self) -> bool { self.user.is_some() }

    /// Upsert the account and remember it. An existing account with the same email is reused.
    pub async fn sign_in(&mut self, api: &dyn StorefrontApi, email: &str) -> ClientResult<&User> {
        self.register(api, email, None).await
    }

    pub async fn sign_up(&mut self, api: &dyn StorefrontApi, email: &str, display_name: &str) -> ClientResult<&User> {
        self.register(api, email, Some(display_name.to_string())).await
    }

    async fn register(&mut self, api: &dyn StorefrontApi, email: &str, display_name: Option<String>) -> ClientResult<&User> {
        let new = NewUser { uid: format!("user-{}", Uuid::new_v4().simple()), email: email.trim().to_string(), display_name, photo_url: None };
        let user = api.create_user(&new).await?;
        tracing::info!(uid = user.uid(), "signed in");
        Ok(self.remember(user))
    }

    /// Re-read the account, e.g. after its address book changed.
    pub async fn refresh(&mut self, api: &dyn StorefrontApi) -> ClientResult<Option<&User>> {
        let Some(uid) = self.uid().map(str::to_string) else { return Ok(None) };
        match api.get_user(&uid).await? {
            Some(user) => Ok(Some(self.remember(user))),
            None => Ok(self.user.as_ref()),
        }
    }

    pub fn sign_out(&mut self) {
        self.user = None;
        if let Err(e) = self.kv.remove(USER_KEY) {
            tracing::warn!(error = %e, "failed to clear stored session");
        }
    }

    fn remember(&mut self, user: User) -> &User {
        persist(self.kv.as_ref(), USER_KEY, &user);
        self.user.insert(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeApi;
    use crate::domain::aggregates::user::address_input;
    use crate::session::MemoryKvStore;

    #[tokio::test]
    async fn test_sign_in_is_remembered() {
        let api = FakeApi::default();
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let mut auth = AuthSession::load(kv.clone());
        assert!(!auth.is_signed_in());

        let uid = auth.sign_up(&api, " asha@example.com ", "Asha").await.unwrap().uid().to_string();
        assert!(uid.starts_with("user-"));
        assert_eq!(auth.user().unwrap().display_name(), "Asha");

        let reloaded = AuthSession::load(kv.clone());
        assert_eq!(reloaded.uid(), Some(uid.as_str()));
    }

    #[tokio::test]
    async fn test_sign_in_reuses_existing_account() {
        let api = FakeApi::with_user("u1", "asha@example.com");
        let mut auth = AuthSession::load(Arc::new(MemoryKvStore::new()));
        let user = auth.sign_in(&api, "asha@example.com").await.unwrap();
        assert_eq!(user.uid(), "u1");
    }

    #[tokio::test]
    async fn test_refresh_picks_up_new_addresses() {
        let api = FakeApi::with_user("u1", "asha@example.com");
        let mut auth = AuthSession::load(Arc::new(MemoryKvStore::new()));
        auth.sign_in(&api, "asha@example.com").await.unwrap();
        api.add_address("u1", &address_input("Asha Rao", "12 MG Road")).await.unwrap();

        let user = auth.refresh(&api).await.unwrap().unwrap();
        assert_eq!(user.addresses().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_forgets_user() {
        let api = FakeApi::default();
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let mut auth = AuthSession::load(kv.clone());
        auth.sign_in(&api, "asha@example.com").await.unwrap();
        auth.sign_out();
        assert!(!auth.is_signed_in());
        assert!(AuthSession::load(kv).user().is_none());
        assert!(auth.refresh(&api).await.unwrap().is_none());
    }
}
