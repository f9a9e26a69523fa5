// src/application/service/mod.rs
// Trade orchestration: load, apply, persist

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::{normalize_symbol, TradeOrder};
use crate::config::Config;
use crate::domain::errors::{AppError, AppResult, StoreError, TradeError};
use crate::domain::ledger::{apply_trade, realized_pnl};
use crate::domain::models::{Account, TradeType, Transaction, Wallet};
use crate::domain::portfolio::PortfolioSummary;
use crate::domain::repository::{AccountRepository, QuoteSource};

/// Knobs for `TradeService`
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub starting_balance: Decimal,
    pub currency: String,
    pub max_retries: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            starting_balance: config.account.starting_balance,
            currency: config.account.currency.clone(),
            max_retries: config.ledger.max_retries,
        }
    }
}

/// Result of an executed trade
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub account: Account,
    pub transaction: Transaction,
    pub realized_pnl: Decimal,
}

pub struct TradeService {
    accounts: Arc<dyn AccountRepository>,
    quotes: Arc<dyn QuoteSource>,
    settings: ServiceSettings,
}

impl TradeService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        quotes: Arc<dyn QuoteSource>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            accounts,
            quotes,
            settings,
        }
    }

    /// Open a new account funded with the configured starting balance
    pub async fn register(&self, name: &str, email: &str) -> AppResult<Account> {
        let name = name.trim();
        let email = email.trim().to_lowercase();

        if name.is_empty() || email.is_empty() {
            return Err(AppError::Validation("Missing required fields".to_string()));
        }
        if !email.contains('@') {
            return Err(AppError::Validation(format!("Invalid e-mail address: {}", email)));
        }

        let wallet = Wallet::new(self.settings.starting_balance, &self.settings.currency);
        let account = self
            .accounts
            .create(Account::new(name, &email, wallet, Utc::now()))
            .await?;

        log::info!(
            "Registered account {} for {} with {} {}",
            account.id,
            account.email,
            account.wallet.balance,
            account.wallet.currency
        );
        Ok(account)
    }

    pub async fn account(&self, account_id: Uuid) -> AppResult<Account> {
        Ok(self.accounts.load(account_id).await?)
    }

    pub async fn account_by_email(&self, email: &str) -> AppResult<Account> {
        self.accounts
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Persistence(StoreError::NotFound(email.to_string())))
    }

    pub async fn quote(&self, symbol: &str) -> AppResult<Decimal> {
        Ok(self.quotes.quote(&normalize_symbol(symbol)).await?)
    }

    /// Execute `order` against the account, pricing it from the quote
    /// source when the order carries no price.
    pub async fn execute(&self, account_id: Uuid, order: TradeOrder) -> AppResult<TradeOutcome> {
        let price = match order.price {
            Some(price) => price,
            None => {
                let price = self.quotes.quote(&order.symbol).await?;
                log::debug!("Priced {} at {} via {}", order.symbol, price, self.quotes.name());
                price
            }
        };
        let trade = order.into_trade(price);

        let result = self
            .update(account_id, |account| {
                let average_price = account
                    .position(&trade.symbol)
                    .map(|p| p.average_price)
                    .unwrap_or_default();

                let delta = apply_trade(account, &trade, Utc::now())?;
                let executed = delta.executed.clone();
                account.commit(delta);

                Ok((executed, realized_pnl(&trade, average_price)))
            })
            .await;

        match result {
            Ok((account, (transaction, realized_pnl))) => {
                log::info!(
                    "{} {} {} @ {} for account {} (balance {})",
                    transaction.trade_type,
                    transaction.quantity,
                    transaction.symbol,
                    transaction.price,
                    account.id,
                    account.wallet.balance
                );
                Ok(TradeOutcome {
                    account,
                    transaction,
                    realized_pnl,
                })
            }
            Err(AppError::Trade(e)) => {
                log::warn!("Rejected {} {} for account {}: {}", trade.trade_type, trade.symbol, account_id, e);
                Err(AppError::Trade(e))
            }
            Err(e) => {
                log::error!("Trade on account {} failed: {}", account_id, e);
                Err(e)
            }
        }
    }

    /// Sell the whole holding of `symbol` at the current quote
    pub async fn close_position(&self, account_id: Uuid, symbol: &str) -> AppResult<TradeOutcome> {
        let symbol = normalize_symbol(symbol);
        let held = self.accounts.load(account_id).await?.holdings(&symbol);
        if held == 0 {
            return Err(AppError::Validation(format!("No open position in {}", symbol)));
        }

        self.execute(account_id, TradeOrder::market(&symbol, TradeType::Sell, held))
            .await
    }

    /// Valuation at the prices of each position's last trade
    pub async fn portfolio(&self, account_id: Uuid) -> AppResult<PortfolioSummary> {
        let account = self.accounts.load(account_id).await?;
        Ok(PortfolioSummary::from_account(&account))
    }

    /// Valuation at current quotes; positions whose quote fails keep their
    /// last mark. Nothing is persisted.
    pub async fn live_portfolio(&self, account_id: Uuid) -> AppResult<PortfolioSummary> {
        let account = self.accounts.load(account_id).await?;

        let mut prices = HashMap::new();
        for symbol in account.positions.keys() {
            match self.quotes.quote(symbol).await {
                Ok(price) => {
                    prices.insert(symbol.clone(), price);
                }
                Err(e) => log::warn!("Keeping last mark for {}: {}", symbol, e),
            }
        }

        Ok(PortfolioSummary::with_prices(&account, &prices))
    }

    /// Transactions newest first, optionally for one symbol
    pub async fn history(
        &self,
        account_id: Uuid,
        symbol: Option<&str>,
    ) -> AppResult<Vec<Transaction>> {
        let account = self.accounts.load(account_id).await?;
        let symbol = symbol.map(normalize_symbol);

        let mut transactions: Vec<Transaction> = account
            .transactions
            .into_iter()
            .filter(|t| symbol.as_ref().map_or(true, |s| &t.symbol == s))
            .collect();
        transactions.reverse();

        Ok(transactions)
    }

    pub async fn add_to_watchlist(&self, account_id: Uuid, symbol: &str) -> AppResult<Vec<String>> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(AppError::Trade(TradeError::InvalidSymbol(symbol)));
        }

        let (account, _) = self
            .update(account_id, |account| {
                if !account.watchlist.contains(&symbol) {
                    account.watchlist.push(symbol.clone());
                }
                Ok(())
            })
            .await?;

        Ok(account.watchlist)
    }

    pub async fn remove_from_watchlist(
        &self,
        account_id: Uuid,
        symbol: &str,
    ) -> AppResult<Vec<String>> {
        let symbol = normalize_symbol(symbol);

        let (account, _) = self
            .update(account_id, |account| {
                account.watchlist.retain(|s| s != &symbol);
                Ok(())
            })
            .await?;

        Ok(account.watchlist)
    }

    /// Read-modify-write one account under optimistic concurrency.
    ///
    /// `change` runs against a freshly loaded copy each attempt; a version
    /// conflict on save reloads and retries up to `max_retries` times.
    async fn update<T, F>(&self, account_id: Uuid, mut change: F) -> AppResult<(Account, T)>
    where
        F: FnMut(&mut Account) -> AppResult<T> + Send,
        T: Send,
    {
        let mut attempt = 0;

        loop {
            let mut account = self.accounts.load(account_id).await?;
            let version = account.version;
            let value = change(&mut account)?;

            match self.accounts.save(account, version).await {
                Ok(saved) => return Ok((saved, value)),
                Err(StoreError::Conflict { expected, found, .. })
                    if attempt < self.settings.max_retries =>
                {
                    attempt += 1;
                    log::warn!(
                        "Version conflict on account {} (expected {}, found {}), retry {}/{}",
                        account_id,
                        expected,
                        found,
                        attempt,
                        self.settings.max_retries
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
