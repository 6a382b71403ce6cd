//! Wire format of a chat message.
//!
//! `{ "id"?: integer, "name": string, "content": string, "timestamp": string }`

use serde::{Deserialize, Serialize};

/// Message as submitted by a client.
///
/// Only `name` and `content` are read; `id` and `timestamp` sent by the
/// client are ignored because the server assigns them.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InboundMessage {
    #[serde(default)]
    pub name: Option<String>,
    pub content: String,
}

impl InboundMessage {
    /// Decode a client frame (text or binary payload holding JSON)
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

/// Message as sent to clients (broadcast frames and history entries).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageDto {
    /// Present only for messages read back from the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    pub content: String,
    /// RFC 3339, UTC
    pub timestamp: String,
}

impl MessageDto {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
