//! Conversion logic between domain entities and DTOs.

use hiroba_shared::time::to_rfc3339_millis;

use crate::domain::entity;
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<entity::ChatMessage> for dto::MessageDto {
    fn from(model: entity::ChatMessage) -> Self {
        Self {
            id: model.id,
            name: model.name,
            content: model.content,
            timestamp: to_rfc3339_millis(&model.timestamp),
        }
    }
}
