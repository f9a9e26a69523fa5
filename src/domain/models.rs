// src/domain/models.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Direction of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "BUY",
            TradeType::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(TradeType::Buy),
            "SELL" => Ok(TradeType::Sell),
            other => Err(format!("unknown trade type: {}", other)),
        }
    }
}

/// Cash held by an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Decimal,
    pub currency: String,
}

impl Wallet {
    pub fn new(balance: Decimal, currency: &str) -> Self {
        Self {
            balance,
            currency: currency.to_string(),
        }
    }
}

/// Accumulated holding of one instrument.
///
/// `total_investment` always equals `quantity * average_price`; a position
/// whose quantity reaches zero is removed from its account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
    pub average_price: Decimal,
    pub total_investment: Decimal,
    pub current_value: Decimal,
}

impl Position {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            quantity: 0,
            average_price: Decimal::ZERO,
            total_investment: Decimal::ZERO,
            current_value: Decimal::ZERO,
        }
    }

    /// Price per unit implied by the last mark
    pub fn mark_price(&self) -> Decimal {
        self.current_value / Decimal::from(self.quantity.max(1))
    }

    /// Re-mark the position at `price` without touching its cost basis.
    /// Returns `None` and keeps the old mark if the value overflows.
    pub fn mark(&mut self, price: Decimal) -> Option<Decimal> {
        let value = Decimal::from(self.quantity).checked_mul(price)?;
        self.current_value = value;
        Some(value)
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        self.current_value - self.total_investment
    }
}

/// Immutable record of one executed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub symbol: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub quantity: u64,
    pub price: Decimal,
    pub total_amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A single trade instruction for the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub symbol: String,
    pub trade_type: TradeType,
    pub quantity: u64,
    pub price: Decimal,
}

impl Trade {
    pub fn new(symbol: &str, trade_type: TradeType, quantity: u64, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            trade_type,
            quantity,
            price,
        }
    }

    pub fn buy(symbol: &str, quantity: u64, price: Decimal) -> Self {
        Self::new(symbol, TradeType::Buy, quantity, price)
    }

    pub fn sell(symbol: &str, quantity: u64, price: Decimal) -> Self {
        Self::new(symbol, TradeType::Sell, quantity, price)
    }
}

/// State produced by applying one trade to an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDelta {
    pub wallet: Wallet,
    pub positions: BTreeMap<String, Position>,
    pub transactions: Vec<Transaction>,
    /// The record appended to `transactions` by this trade
    pub executed: Transaction,
}

/// A user's paper-trading account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub wallet: Wallet,
    #[serde(default)]
    pub positions: BTreeMap<String, Position>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub watchlist: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every successful save
    #[serde(default)]
    pub version: u64,
}

impl Account {
    pub fn new(name: &str, email: &str, wallet: Wallet, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            wallet,
            positions: BTreeMap::new(),
            transactions: Vec::new(),
            watchlist: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Units of `symbol` currently held
    pub fn holdings(&self, symbol: &str) -> u64 {
        self.position(symbol).map(|p| p.quantity).unwrap_or(0)
    }

    /// Install the result of a ledger update
    pub fn commit(&mut self, delta: AccountDelta) {
        self.wallet = delta.wallet;
        self.positions = delta.positions;
        self.transactions = delta.transactions;
    }
}
