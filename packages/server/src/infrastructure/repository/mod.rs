//! `MessageStore` の実装

pub mod inmemory;
pub mod postgres;

pub use inmemory::InMemoryMessageStore;
pub use postgres::PostgresMessageStore;
