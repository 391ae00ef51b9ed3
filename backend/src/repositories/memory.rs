//! In-memory user store
//!
//! Used by tests and for running the server without PostgreSQL.
//! Records live for the lifetime of the process.

use super::user::{UserRecord, UserStore};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// User store backed by a map keyed on email
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Insert or replace a record as-is
    pub async fn insert(&self, record: UserRecord) {
        self.users.write().await.insert(record.email.clone(), record);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<Option<UserRecord>> {
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Ok(None);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.insert(record.email.clone(), record.clone());

        Ok(Some(record))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
