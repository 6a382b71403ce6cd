//! ドメイン層
//!
//! チャットメッセージ、接続ハンドル、永続化のインターフェースを定義します。
//! 具体的な実装（Hub、ストア）は Infrastructure 層が提供します。

pub mod entity;
pub mod error;
pub mod repository;
pub mod value_object;

pub use entity::ChatMessage;
pub use error::StorageError;
pub use repository::MessageStore;
pub use value_object::{ConnectionId, ConnectionIdFactory};

#[cfg(test)]
pub use repository::MockMessageStore;
