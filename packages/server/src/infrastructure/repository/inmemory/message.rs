//! InMemory MessageStore 実装
//!
//! ドメイン層が定義する MessageStore trait の具体的な実装。
//! Vec をインメモリ DB として使用します。`DATABASE_URL` 未指定時とテストで使います。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, MessageStore, StorageError};

/// インメモリ MessageStore 実装
///
/// 追記順に保持し、ID は 1 から連番で採番します。
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryMessageStore {
    /// 新しい InMemoryMessageStore を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn store(&self, message: &ChatMessage) -> Result<(), StorageError> {
        let mut messages = self.messages.lock().await;
        let id = messages.len() as i64 + 1;
        messages.push(message.clone().with_id(id));
        Ok(())
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ChatMessage>, StorageError> {
        let messages = self.messages.lock().await;
        // 保存はバックグラウンドで行われるため、追記順は時刻順と一致しない
        let mut recent: Vec<ChatMessage> = messages.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        recent.truncate(limit);
        Ok(recent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 追記時の ID 採番
    // - 直近 N 件の取得（新しい順、件数制限）
    // ========================================

    fn message_at(millis: i64, content: &str) -> ChatMessage {
        ChatMessage::new(
            "alice".to_string(),
            content.to_string(),
            Utc.timestamp_millis_opt(millis).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_store_assigns_sequential_ids() {
        // テスト項目: 保存したメッセージに連番の ID が付与される
        // given (前提条件):
        let store = InMemoryMessageStore::new();

        // when (操作):
        store.store(&message_at(1000, "first")).await.unwrap();
        store.store(&message_at(2000, "second")).await.unwrap();
        let recent = store.fetch_recent(10).await.unwrap();

        // then (期待する結果):
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, Some(2));
        assert_eq!(recent[1].id, Some(1));
    }

    #[tokio::test]
    async fn test_fetch_recent_is_newest_first_and_limited() {
        // テスト項目: 直近のメッセージが新しい順に最大 limit 件返される
        // given (前提条件):
        let store = InMemoryMessageStore::new();
        for i in 0..5 {
            store
                .store(&message_at(1000 * (i + 1), &format!("m{}", i)))
                .await
                .unwrap();
        }

        // when (操作):
        let recent = store.fetch_recent(3).await.unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m4", "m3", "m2"]);
    }

    #[tokio::test]
    async fn test_fetch_recent_orders_by_timestamp_not_insertion() {
        // テスト項目: 追記順が時刻順と異なっても、limit 件の中に最新のメッセージが含まれる
        // given (前提条件): 新しいメッセージが先に保存され、古いメッセージが後から届く
        let store = InMemoryMessageStore::new();
        store.store(&message_at(3000, "newest")).await.unwrap();
        store.store(&message_at(1000, "oldest")).await.unwrap();
        store.store(&message_at(2000, "middle")).await.unwrap();

        // when (操作):
        let recent = store.fetch_recent(2).await.unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["newest", "middle"]);
    }

    #[tokio::test]
    async fn test_fetch_recent_on_empty_store() {
        // テスト項目: 空のストアからは空のリストが返される
        // given (前提条件):
        let store = InMemoryMessageStore::new();

        // when (操作):
        let recent = store.fetch_recent(100).await.unwrap();

        // then (期待する結果):
        assert!(recent.is_empty());
    }
}
