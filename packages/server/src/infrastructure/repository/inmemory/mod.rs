mod message;

pub use message::InMemoryMessageStore;
