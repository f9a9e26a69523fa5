// src/infrastructure/quote/fixed.rs
// Quote source backed by a fixed price table

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::domain::errors::{QuoteError, QuoteResult};
use crate::domain::repository::QuoteSource;

#[derive(Debug, Clone, Default)]
pub struct StaticQuoteSource {
    prices: HashMap<String, Decimal>,
}

impl StaticQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.set_price(symbol, price);
        self
    }

    pub fn set_price(&mut self, symbol: &str, price: Decimal) {
        self.prices.insert(symbol.trim().to_uppercase(), price);
    }
}

impl From<HashMap<String, Decimal>> for StaticQuoteSource {
    fn from(prices: HashMap<String, Decimal>) -> Self {
        prices
            .into_iter()
            .fold(Self::new(), |source, (symbol, price)| source.with_price(&symbol, price))
    }
}

#[async_trait]
impl QuoteSource for StaticQuoteSource {
    async fn quote(&self, symbol: &str) -> QuoteResult<Decimal> {
        self.prices
            .get(&symbol.trim().to_uppercase())
            .copied()
            .ok_or_else(|| QuoteError::UnknownSymbol(symbol.to_string()))
    }

    fn name(&self) -> &str {
        "static"
    }
}
