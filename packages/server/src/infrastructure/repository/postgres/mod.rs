mod message;

pub use message::PostgresMessageStore;
