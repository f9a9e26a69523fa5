// src/infrastructure/store/memory.rs
// In-process account store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::Account;
use crate::domain::repository::AccountRepository;

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.lock().await.is_empty()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn create(&self, account: Account) -> StoreResult<Account> {
        let mut accounts = self.accounts.lock().await;

        if accounts.contains_key(&account.id)
            || accounts
                .values()
                .any(|a| a.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(StoreError::AlreadyExists(account.email));
        }

        log::debug!("Creating account {} ({})", account.id, account.email);
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn load(&self, id: Uuid) -> StoreResult<Account> {
        self.accounts
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .await
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn save(&self, mut account: Account, expected_version: u64) -> StoreResult<Account> {
        let mut accounts = self.accounts.lock().await;

        let stored = accounts
            .get(&account.id)
            .ok_or_else(|| StoreError::NotFound(account.id.to_string()))?;

        if stored.version != expected_version {
            return Err(StoreError::Conflict {
                id: account.id,
                expected: expected_version,
                found: stored.version,
            });
        }

        account.version = expected_version + 1;
        account.updated_at = Utc::now();
        accounts.insert(account.id, account.clone());

        log::debug!("Saved account {} at version {}", account.id, account.version);
        Ok(account)
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.accounts.lock().await.values().cloned().collect();
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }
}
