// src/infrastructure/quote/mod.rs
pub mod fixed;
pub mod twelvedata;

pub use fixed::StaticQuoteSource;
pub use twelvedata::TwelveDataQuoteSource;
