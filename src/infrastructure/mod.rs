// src/infrastructure/mod.rs
pub mod quote;
pub mod store;
