//! Data Transfer Objects (DTOs) for the chat relay.
//!
//! The same message record is used on the websocket and by the history
//! endpoint:
//! - `websocket`: inbound and outbound message DTOs
//! - `conversion`: domain entity → DTO

pub mod conversion;
pub mod websocket;
