// src/application/mod.rs
pub mod dto;
pub mod service;

pub use dto::{ErrorResponse, PortfolioResponse, TradeOrder, TradeRequest, TradeResponse};
pub use service::{ServiceSettings, TradeOutcome, TradeService};
