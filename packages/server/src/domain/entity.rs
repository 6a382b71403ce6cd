//! ドメインエンティティ

use chrono::{DateTime, Utc};

/// チャットの発言 1 件
///
/// `timestamp` はサーバーがフレームを受理した時刻（UTC）で、クライアントの値は信用しない。
/// `id` は永続化済みのメッセージにのみ付与される。ブロードキャスト後は不変。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Option<i64>,
    pub name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// 未永続化のメッセージを作成
    pub fn new(name: String, content: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: None,
            name,
            content,
            timestamp,
        }
    }

    /// ストアが採番した ID を付与
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}
