// src/domain/errors.rs
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Trade rejected: {0}")]
    Trade(#[from] TradeError),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("Quote error: {0}")]
    Quote(#[from] QuoteError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reasons the ledger refuses a trade. The account is untouched in every case.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Insufficient shares of {symbol}: required {required}, available {available}")]
    InsufficientShares {
        symbol: String,
        required: u64,
        available: u64,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Account already exists: {0}")]
    AlreadyExists(String),

    #[error("Version conflict on account {id}: expected {expected}, found {found}")]
    Conflict { id: Uuid, expected: u64, found: u64 },

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Request error: {0}")]
    Request(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Quote parse error: {0}")]
    Parse(String),

    #[error("No data available for: {0}")]
    NoData(String),

    #[error("Quote request timed out after {0}s")]
    Timeout(u64),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

impl From<hyper::Error> for QuoteError {
    fn from(err: hyper::Error) -> Self {
        QuoteError::Request(err.to_string())
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type TradeResult<T> = Result<T, TradeError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type QuoteResult<T> = Result<T, QuoteError>;
