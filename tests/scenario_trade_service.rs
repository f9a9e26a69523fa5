//! Scenario: trades flow through the service into the account store.
//!
//! Covers the full load → apply → save path against the in-memory store
//! and a static quote table, including rejection paths that must leave the
//! stored account untouched and the optimistic-concurrency retry loop.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use paper_trade::application::{ErrorResponse, ServiceSettings, TradeOrder, TradeService};
use paper_trade::domain::errors::{AppError, StoreError, StoreResult, TradeError};
use paper_trade::domain::models::{Account, TradeType};
use paper_trade::domain::repository::AccountRepository;
use paper_trade::infrastructure::quote::StaticQuoteSource;
use paper_trade::infrastructure::store::InMemoryAccountStore;

fn quotes() -> Arc<StaticQuoteSource> {
    Arc::new(
        StaticQuoteSource::new()
            .with_price("AAPL", dec!(180))
            .with_price("MSFT", dec!(400)),
    )
}

fn service_over(store: Arc<dyn AccountRepository>, max_retries: u32) -> TradeService {
    TradeService::new(
        store,
        quotes(),
        ServiceSettings {
            starting_balance: dec!(10000),
            currency: "USD".to_string(),
            max_retries,
        },
    )
}

fn buy(symbol: &str, quantity: u64, price: Decimal) -> TradeOrder {
    TradeOrder::limit(symbol, TradeType::Buy, quantity, price)
}

fn sell(symbol: &str, quantity: u64, price: Decimal) -> TradeOrder {
    TradeOrder::limit(symbol, TradeType::Sell, quantity, price)
}

// ---------------------------------------------------------------------------
// Store wrappers
// ---------------------------------------------------------------------------

/// Bumps the stored version behind the caller's back for the first
/// `conflicts` saves, simulating a concurrent writer.
struct ContendedStore {
    inner: InMemoryAccountStore,
    conflicts: AtomicU32,
}

#[async_trait]
impl AccountRepository for ContendedStore {
    async fn create(&self, account: Account) -> StoreResult<Account> {
        self.inner.create(account).await
    }

    async fn load(&self, id: Uuid) -> StoreResult<Account> {
        self.inner.load(id).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.inner.find_by_email(email).await
    }

    async fn save(&self, account: Account, expected_version: u64) -> StoreResult<Account> {
        if self.conflicts.load(Ordering::SeqCst) > 0 {
            self.conflicts.fetch_sub(1, Ordering::SeqCst);
            let current = self.inner.load(account.id).await?;
            let version = current.version;
            self.inner.save(current, version).await?;
        }
        self.inner.save(account, expected_version).await
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        self.inner.list().await
    }
}

/// Accepts reads, fails every write
struct ReadOnlyStore {
    inner: InMemoryAccountStore,
}

#[async_trait]
impl AccountRepository for ReadOnlyStore {
    async fn create(&self, account: Account) -> StoreResult<Account> {
        self.inner.create(account).await
    }

    async fn load(&self, id: Uuid) -> StoreResult<Account> {
        self.inner.load(id).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.inner.find_by_email(email).await
    }

    async fn save(&self, _account: Account, _expected_version: u64) -> StoreResult<Account> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        self.inner.list().await
    }
}

// ---------------------------------------------------------------------------
// 1. Walkthrough: the six ledger scenarios end to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn walkthrough_persists_every_step() {
    let store = Arc::new(InMemoryAccountStore::new());
    let service = service_over(store.clone(), 3);
    let id = service.register("Ada", "ada@example.com").await.unwrap().id;

    service.execute(id, buy("AAPL", 10, dec!(150))).await.unwrap();
    let stored = store.load(id).await.unwrap();
    assert_eq!(stored.wallet.balance, dec!(8500));
    assert_eq!(stored.position("AAPL").unwrap().current_value, dec!(1500));

    service.execute(id, buy("AAPL", 10, dec!(170))).await.unwrap();
    let stored = store.load(id).await.unwrap();
    assert_eq!(stored.position("AAPL").unwrap().average_price, dec!(160));
    assert_eq!(stored.wallet.balance, dec!(6800));

    let outcome = service.execute(id, sell("AAPL", 5, dec!(200))).await.unwrap();
    assert_eq!(outcome.realized_pnl, dec!(200));
    assert_eq!(outcome.account.wallet.balance, dec!(7800));
    let aapl = outcome.account.position("AAPL").unwrap();
    assert_eq!(aapl.quantity, 15);
    assert_eq!(aapl.total_investment, dec!(2400));
    assert_eq!(aapl.current_value, dec!(3000));

    let before = store.load(id).await.unwrap();
    let err = service.execute(id, sell("AAPL", 25, dec!(200))).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Trade(TradeError::InsufficientShares {
            required: 25,
            available: 15,
            ..
        })
    ));
    assert_eq!(store.load(id).await.unwrap(), before);

    let err = service.execute(id, buy("MSFT", 100, dec!(1000))).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Trade(TradeError::InsufficientFunds { .. })
    ));
    let body = ErrorResponse::from(&err);
    assert_eq!(body.required, Some(dec!(100000)));
    assert_eq!(body.available, Some(dec!(7800)));

    service.execute(id, sell("AAPL", 15, dec!(100))).await.unwrap();
    let stored = store.load(id).await.unwrap();
    assert!(stored.positions.is_empty());
    assert_eq!(stored.transactions.len(), 4);
    assert_eq!(stored.wallet.balance, dec!(9300));
    assert_eq!(stored.version, 4);
}

// ---------------------------------------------------------------------------
// 2. Pricing from the quote source
// ---------------------------------------------------------------------------

#[tokio::test]
async fn market_orders_use_quote_price() {
    let service = service_over(Arc::new(InMemoryAccountStore::new()), 3);
    let id = service.register("Bo", "bo@example.com").await.unwrap().id;

    let outcome = service
        .execute(id, TradeOrder::market("aapl", TradeType::Buy, 5))
        .await
        .unwrap();
    assert_eq!(outcome.transaction.symbol, "AAPL");
    assert_eq!(outcome.transaction.price, dec!(180));
    assert_eq!(outcome.account.wallet.balance, dec!(9100));

    let err = service
        .execute(id, TradeOrder::market("ZZZZ", TradeType::Buy, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Quote(_)));
}

#[tokio::test]
async fn close_position_sells_everything_at_quote() {
    let service = service_over(Arc::new(InMemoryAccountStore::new()), 3);
    let id = service.register("Cy", "cy@example.com").await.unwrap().id;

    service.execute(id, buy("MSFT", 3, dec!(390))).await.unwrap();
    let outcome = service.close_position(id, "msft").await.unwrap();

    assert_eq!(outcome.transaction.quantity, 3);
    assert_eq!(outcome.transaction.price, dec!(400));
    assert_eq!(outcome.realized_pnl, dec!(30));
    assert!(outcome.account.positions.is_empty());
    assert_eq!(outcome.account.wallet.balance, dec!(10030));

    assert!(matches!(
        service.close_position(id, "MSFT").await,
        Err(AppError::Validation(_))
    ));
}

// ---------------------------------------------------------------------------
// 3. Read models
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_is_newest_first_and_filterable() {
    let service = service_over(Arc::new(InMemoryAccountStore::new()), 3);
    let id = service.register("Di", "di@example.com").await.unwrap().id;

    service.execute(id, buy("AAPL", 1, dec!(100))).await.unwrap();
    service.execute(id, buy("MSFT", 1, dec!(300))).await.unwrap();
    service.execute(id, sell("AAPL", 1, dec!(110))).await.unwrap();

    let all = service.history(id, None).await.unwrap();
    let order: Vec<_> = all.iter().map(|t| (t.symbol.as_str(), t.trade_type)).collect();
    assert_eq!(
        order,
        vec![
            ("AAPL", TradeType::Sell),
            ("MSFT", TradeType::Buy),
            ("AAPL", TradeType::Buy),
        ]
    );

    let aapl = service.history(id, Some("aapl")).await.unwrap();
    assert_eq!(aapl.len(), 2);
}

#[tokio::test]
async fn live_portfolio_marks_at_quotes_without_persisting() {
    let store = Arc::new(InMemoryAccountStore::new());
    let service = service_over(store.clone(), 3);
    let id = service.register("Ed", "ed@example.com").await.unwrap().id;

    service.execute(id, buy("AAPL", 10, dec!(150))).await.unwrap();

    let stale = service.portfolio(id).await.unwrap();
    assert_eq!(stale.market_value, dec!(1500));
    assert_eq!(stale.total_pnl, Decimal::ZERO);

    let live = service.live_portfolio(id).await.unwrap();
    assert_eq!(live.market_value, dec!(1800));
    assert_eq!(live.total_pnl, dec!(300));
    assert_eq!(live.total_pnl_percent, dec!(20));
    assert_eq!(live.net_worth, dec!(10300));

    let stored = store.load(id).await.unwrap();
    assert_eq!(stored.position("AAPL").unwrap().current_value, dec!(1500));
}

#[tokio::test]
async fn watchlist_deduplicates_symbols() {
    let service = service_over(Arc::new(InMemoryAccountStore::new()), 3);
    let id = service.register("Flo", "flo@example.com").await.unwrap().id;

    service.add_to_watchlist(id, "tsla").await.unwrap();
    service.add_to_watchlist(id, "TSLA").await.unwrap();
    let list = service.add_to_watchlist(id, "nvda").await.unwrap();
    assert_eq!(list, vec!["TSLA".to_string(), "NVDA".to_string()]);

    let list = service.remove_from_watchlist(id, "tsla").await.unwrap();
    assert_eq!(list, vec!["NVDA".to_string()]);
}

// ---------------------------------------------------------------------------
// 4. Registration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registration_validates_and_rejects_duplicates() {
    let service = service_over(Arc::new(InMemoryAccountStore::new()), 3);

    let account = service.register(" Gus ", "Gus@Example.com").await.unwrap();
    assert_eq!(account.name, "Gus");
    assert_eq!(account.email, "gus@example.com");
    assert_eq!(account.wallet.balance, dec!(10000));
    assert_eq!(account.wallet.currency, "USD");

    let err = service.register("Gus", "gus@example.com").await.unwrap_err();
    assert!(matches!(err, AppError::Persistence(StoreError::AlreadyExists(_))));

    assert!(matches!(
        service.register("", "x@example.com").await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        service.register("X", "not-an-email").await,
        Err(AppError::Validation(_))
    ));

    let found = service.account_by_email("GUS@example.com").await.unwrap();
    assert_eq!(found.id, account.id);
}

// ---------------------------------------------------------------------------
// 5. Concurrency and persistence failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn conflicting_save_is_retried_against_fresh_state() {
    let store = Arc::new(ContendedStore {
        inner: InMemoryAccountStore::new(),
        conflicts: AtomicU32::new(2),
    });
    let service = service_over(store.clone(), 3);
    let id = service.register("Hal", "hal@example.com").await.unwrap().id;

    let outcome = service.execute(id, buy("AAPL", 2, dec!(100))).await.unwrap();
    assert_eq!(outcome.account.wallet.balance, dec!(9800));
    assert_eq!(outcome.account.transactions.len(), 1);
    // Two foreign bumps plus our own write
    assert_eq!(outcome.account.version, 3);
}

#[tokio::test]
async fn retries_are_bounded() {
    let store = Arc::new(ContendedStore {
        inner: InMemoryAccountStore::new(),
        conflicts: AtomicU32::new(10),
    });
    let service = service_over(store.clone(), 2);
    let id = service.register("Ivy", "ivy@example.com").await.unwrap().id;

    let err = service.execute(id, buy("AAPL", 1, dec!(100))).await.unwrap_err();
    assert!(matches!(err, AppError::Persistence(StoreError::Conflict { .. })));
    assert_eq!(ErrorResponse::from(&err).status, 409);

    let stored = store.load(id).await.unwrap();
    assert_eq!(stored.wallet.balance, dec!(10000));
    assert!(stored.transactions.is_empty());
}

#[tokio::test]
async fn save_failure_is_reported_as_persistence_error() {
    let store = Arc::new(ReadOnlyStore {
        inner: InMemoryAccountStore::new(),
    });
    let service = service_over(store.clone(), 3);
    let id = service.register("Jo", "jo@example.com").await.unwrap().id;

    let err = service.execute(id, buy("AAPL", 1, dec!(100))).await.unwrap_err();
    assert!(matches!(err, AppError::Persistence(StoreError::Io(_))));
    assert_eq!(ErrorResponse::from(&err).status, 500);

    let stored = store.load(id).await.unwrap();
    assert_eq!(stored.wallet.balance, dec!(10000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_buys_on_one_account_are_all_applied() {
    let store = Arc::new(InMemoryAccountStore::new());
    let service = Arc::new(service_over(store.clone(), 64));
    let id = service.register("Kai", "kai@example.com").await.unwrap().id;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.execute(id, buy("AAPL", 1, dec!(10))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = store.load(id).await.unwrap();
    assert_eq!(stored.holdings("AAPL"), 16);
    assert_eq!(stored.transactions.len(), 16);
    assert_eq!(stored.wallet.balance, dec!(9840));
}
