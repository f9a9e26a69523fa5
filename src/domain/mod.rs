// src/domain/mod.rs
pub mod errors;
pub mod ledger;
pub mod models;
pub mod portfolio;
pub mod repository;

// Re-export common types for convenience
pub use errors::{
    AppError, AppResult, QuoteError, QuoteResult, StoreError, StoreResult, TradeError,
    TradeResult,
};
pub use ledger::apply_trade;
pub use models::{Account, AccountDelta, Position, Trade, TradeType, Transaction, Wallet};
pub use portfolio::{PortfolioSummary, PositionView};
pub use repository::{AccountRepository, QuoteSource};
