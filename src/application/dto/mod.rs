// src/application/dto/mod.rs
// Request/response shapes at the trade boundary

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::domain::errors::{AppError, StoreError, TradeError};
use crate::domain::models::{Position, Trade, TradeType, Transaction, Wallet};
use crate::domain::portfolio::PortfolioSummary;

/// Trade payload as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRequest {
    #[serde(alias = "symbol")]
    pub stock_symbol: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub quantity: f64,
    /// Execution price; the current quote is used when absent
    #[serde(default)]
    pub price: Option<f64>,
}

/// A trade request whose values have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeOrder {
    pub symbol: String,
    pub trade_type: TradeType,
    pub quantity: u64,
    pub price: Option<Decimal>,
}

impl TradeOrder {
    pub fn market(symbol: &str, trade_type: TradeType, quantity: u64) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            trade_type,
            quantity,
            price: None,
        }
    }

    pub fn limit(symbol: &str, trade_type: TradeType, quantity: u64, price: Decimal) -> Self {
        Self {
            price: Some(price),
            ..Self::market(symbol, trade_type, quantity)
        }
    }

    pub fn into_trade(self, price: Decimal) -> Trade {
        Trade::new(&self.symbol, self.trade_type, self.quantity, price)
    }
}

impl TryFrom<TradeRequest> for TradeOrder {
    type Error = TradeError;

    fn try_from(request: TradeRequest) -> Result<Self, Self::Error> {
        let symbol = normalize_symbol(&request.stock_symbol);
        if symbol.is_empty() {
            return Err(TradeError::InvalidSymbol(request.stock_symbol));
        }

        let quantity = request.quantity;
        if !quantity.is_finite() || quantity <= 0.0 || quantity.fract() != 0.0 || quantity >= u64::MAX as f64 {
            return Err(TradeError::InvalidQuantity(format!(
                "quantity must be a positive integer, got {}",
                quantity
            )));
        }

        let price = match request.price {
            None => None,
            Some(raw) => {
                let price = Decimal::from_f64(raw)
                    .filter(|p| raw.is_finite() && *p > Decimal::ZERO)
                    .ok_or_else(|| {
                        TradeError::InvalidPrice(format!("price must be positive, got {}", raw))
                    })?;
                Some(price)
            }
        };

        Ok(Self {
            symbol,
            trade_type: request.trade_type,
            quantity: quantity as u64,
            price,
        })
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Successful trade, in the shape the web client expects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResponse {
    pub message: String,
    pub portfolio: Vec<Position>,
    pub transactions: Vec<Transaction>,
    pub wallet: Wallet,
    pub realized_pnl: Decimal,
}

/// Portfolio read model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub portfolio: Vec<Position>,
    pub transactions: Vec<Transaction>,
    pub wallet: Wallet,
    pub summary: PortfolioSummary,
}

/// Failure body with an HTTP-style status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, status: u16) -> Self {
        Self {
            error: error.to_string(),
            status,
            required: None,
            available: None,
            details: None,
        }
    }

    fn with_details(mut self, details: impl ToString) -> Self {
        self.details = Some(details.to_string());
        self
    }

    fn with_figures(mut self, required: Decimal, available: Decimal) -> Self {
        self.required = Some(required);
        self.available = Some(available);
        self
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        match error {
            AppError::Trade(TradeError::InsufficientFunds { required, available }) => {
                ErrorResponse::new("Insufficient funds", 400).with_figures(*required, *available)
            }
            AppError::Trade(TradeError::InsufficientShares {
                required, available, ..
            }) => ErrorResponse::new("Insufficient stocks", 400)
                .with_figures(Decimal::from(*required), Decimal::from(*available)),
            AppError::Trade(e) => {
                ErrorResponse::new("Invalid data format or values", 400).with_details(e)
            }
            AppError::Validation(msg) => ErrorResponse::new("Invalid request", 400).with_details(msg),
            AppError::Persistence(StoreError::NotFound(_)) => {
                ErrorResponse::new("User not found", 404)
            }
            AppError::Persistence(StoreError::AlreadyExists(_)) => {
                ErrorResponse::new("User already exists", 400)
            }
            AppError::Persistence(e @ StoreError::Conflict { .. }) => {
                ErrorResponse::new("Concurrent update, please retry", 409).with_details(e)
            }
            AppError::Persistence(e) => {
                ErrorResponse::new("Failed to save transaction", 500).with_details(e)
            }
            AppError::Quote(e) => {
                ErrorResponse::new("Failed to fetch stock data", 502).with_details(e)
            }
            other => ErrorResponse::new("Internal server error", 500).with_details(other),
        }
    }
}
