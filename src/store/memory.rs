//! In-process user store backed by a mutex-guarded map.
//!
//! Every operation holds the map lock for its whole read-modify-write, which
//! serializes slot consumption the same way the Postgres store's conditional
//! UPDATE does. Used by the test suite and for local development.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CreateOutcome, Role, User, UserStore};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|user| user.id == id).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<CreateOutcome> {
        let mut users = self.users.lock().await;
        if users.contains_key(email) {
            return Ok(CreateOutcome::Conflict);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            role: Role::User,
            is_verified: false,
            refresh_token: None,
            reset_token: None,
            email_verification_token: None,
        };
        users.insert(email.to_string(), user.clone());

        Ok(CreateOutcome::Created(user))
    }

    async fn set_verification_token(&self, id: Uuid, token: &str) -> Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.values_mut().find(|user| user.id == id) {
            user.email_verification_token = Some(token.to_string());
        }
        Ok(())
    }

    async fn consume_verification_token(&self, email: &str, presented: &str) -> Result<bool> {
        let mut users = self.users.lock().await;
        match users.get_mut(email) {
            Some(user) if user.email_verification_token.as_deref() == Some(presented) => {
                user.is_verified = true;
                user.email_verification_token = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_reset_token(&self, id: Uuid, token: &str) -> Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.values_mut().find(|user| user.id == id) {
            user.reset_token = Some(token.to_string());
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        email: &str,
        presented: &str,
        new_password_hash: &str,
    ) -> Result<bool> {
        let mut users = self.users.lock().await;
        match users.get_mut(email) {
            Some(user) if user.reset_token.as_deref() == Some(presented) => {
                user.password_hash = new_password_hash.to_string();
                user.reset_token = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_refresh_token(&self, id: Uuid, token: &str) -> Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.values_mut().find(|user| user.id == id) {
            user.refresh_token = Some(token.to_string());
        }
        Ok(())
    }

    async fn refresh_token_matches(&self, email: &str, presented: &str) -> Result<bool> {
        let users = self.users.lock().await;
        Ok(users
            .get(email)
            .is_some_and(|user| user.refresh_token.as_deref() == Some(presented)))
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.values_mut().find(|user| user.id == id) {
            user.refresh_token = None;
        }
        Ok(())
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<bool> {
        let mut users = self.users.lock().await;
        match users.get_mut(email) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_active(&self, email: &str, is_active: bool) -> Result<bool> {
        let mut users = self.users.lock().await;
        match users.get_mut(email) {
            Some(user) => {
                user.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user(email: &str) -> (MemoryUserStore, User) {
        let store = MemoryUserStore::new();
        let user = match store.create(email, "hash").await.unwrap() {
            CreateOutcome::Created(user) => user,
            CreateOutcome::Conflict => panic!("fresh store reported conflict"),
        };
        (store, user)
    }

    #[tokio::test]
    async fn create_reports_conflict_on_duplicate() {
        let (store, _user) = store_with_user("a@x.com").await;
        assert!(matches!(
            store.create("a@x.com", "other").await.unwrap(),
            CreateOutcome::Conflict
        ));
    }

    #[tokio::test]
    async fn new_accounts_start_unverified() {
        let (_store, user) = store_with_user("a@x.com").await;
        assert!(!user.is_verified);
        assert!(user.is_active);
        assert_eq!(user.role, Role::User);
        assert!(user.refresh_token.is_none());
    }

    #[tokio::test]
    async fn verification_consumption_is_single_use() {
        let (store, user) = store_with_user("a@x.com").await;
        store.set_verification_token(user.id, "tok").await.unwrap();

        assert!(store.consume_verification_token("a@x.com", "tok").await.unwrap());
        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(user.is_verified);
        assert!(user.email_verification_token.is_none());

        // Slot is empty now, replay fails.
        assert!(!store.consume_verification_token("a@x.com", "tok").await.unwrap());
    }

    #[tokio::test]
    async fn mismatched_token_does_not_mutate() {
        let (store, user) = store_with_user("a@x.com").await;
        store.set_verification_token(user.id, "tok").await.unwrap();

        assert!(!store.consume_verification_token("a@x.com", "other").await.unwrap());
        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(!user.is_verified);
        assert_eq!(user.email_verification_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn reset_consumption_replaces_password_hash() {
        let (store, user) = store_with_user("a@x.com").await;
        store.set_reset_token(user.id, "tok").await.unwrap();

        assert!(store
            .consume_reset_token("a@x.com", "tok", "new-hash")
            .await
            .unwrap());
        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.password_hash, "new-hash");
        assert!(user.reset_token.is_none());

        assert!(!store
            .consume_reset_token("a@x.com", "tok", "another-hash")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn refresh_comparison_does_not_clear() {
        let (store, user) = store_with_user("a@x.com").await;
        store.set_refresh_token(user.id, "tok").await.unwrap();

        assert!(store.refresh_token_matches("a@x.com", "tok").await.unwrap());
        assert!(store.refresh_token_matches("a@x.com", "tok").await.unwrap());

        // Overwrite invalidates the previous value.
        store.set_refresh_token(user.id, "tok2").await.unwrap();
        assert!(!store.refresh_token_matches("a@x.com", "tok").await.unwrap());
        assert!(store.refresh_token_matches("a@x.com", "tok2").await.unwrap());

        store.clear_refresh_token(user.id).await.unwrap();
        assert!(!store.refresh_token_matches("a@x.com", "tok2").await.unwrap());
    }

    #[tokio::test]
    async fn set_active_toggles_flag_and_keeps_slots() {
        let (store, user) = store_with_user("a@x.com").await;
        store.set_refresh_token(user.id, "tok").await.unwrap();

        assert!(store.set_active("a@x.com", false).await.unwrap());
        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(!user.is_active);
        // The slot survives deactivation.
        assert_eq!(user.refresh_token.as_deref(), Some("tok"));

        assert!(store.set_active("a@x.com", true).await.unwrap());
        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(user.is_active);

        assert!(!store.set_active("missing@x.com", false).await.unwrap());
    }

    #[tokio::test]
    async fn set_role_promotes_existing_user() {
        let (store, _user) = store_with_user("a@x.com").await;
        assert!(store.set_role("a@x.com", Role::Admin).await.unwrap());
        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);

        assert!(!store.set_role("missing@x.com", Role::Admin).await.unwrap());
    }
}
