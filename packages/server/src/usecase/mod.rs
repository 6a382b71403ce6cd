//! UseCase 層
//!
//! UI 層（WebSocket / HTTP ハンドラ）から呼ばれるアプリケーションの操作。

mod connect_participant;
mod disconnect_participant;
mod error;
mod get_recent_messages;
mod send_message;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::SendMessageError;
pub use get_recent_messages::GetRecentMessagesUseCase;
pub use send_message::SendMessageUseCase;
