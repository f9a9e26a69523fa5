// src/infrastructure/store/mod.rs
pub mod file;
pub mod memory;

pub use file::FileAccountStore;
pub use memory::InMemoryAccountStore;
