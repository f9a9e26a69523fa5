// src/domain/repository/mod.rs
// Repository interfaces for domain entities

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::errors::{QuoteResult, StoreResult};
use crate::domain::models::Account;

/// Persistence for accounts.
///
/// `save` is a compare-and-swap: it succeeds only when the stored version
/// still equals `expected_version`, and returns the account as stored
/// (version bumped, `updated_at` refreshed). Callers that read, modify and
/// save an account therefore detect lost updates as `StoreError::Conflict`.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account. Fails if the id or e-mail is taken.
    async fn create(&self, account: Account) -> StoreResult<Account>;

    async fn load(&self, id: Uuid) -> StoreResult<Account>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn save(&self, account: Account, expected_version: u64) -> StoreResult<Account>;

    async fn list(&self) -> StoreResult<Vec<Account>>;
}

/// Market data provider returning the latest price for a symbol
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, symbol: &str) -> QuoteResult<Decimal>;

    fn name(&self) -> &str;
}
