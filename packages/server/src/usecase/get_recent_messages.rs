//! UseCase: 履歴取得処理

use std::sync::Arc;

use crate::domain::{ChatMessage, MessageStore, StorageError};

/// 直近のメッセージ取得のユースケース
pub struct GetRecentMessagesUseCase {
    store: Arc<dyn MessageStore>,
    /// 取得件数
    limit: usize,
}

impl GetRecentMessagesUseCase {
    /// 新しい GetRecentMessagesUseCase を作成
    pub fn new(store: Arc<dyn MessageStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// 直近のメッセージを新しい順に取得
    pub async fn execute(&self) -> Result<Vec<ChatMessage>, StorageError> {
        self.store.fetch_recent(self.limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockMessageStore;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_fetch_uses_configured_limit() {
        // テスト項目: 設定された件数でストアから取得する
        // given (前提条件):
        let mut store = MockMessageStore::new();
        let timestamp = Utc.timestamp_millis_opt(1000).unwrap();
        store
            .expect_fetch_recent()
            .with(eq(100))
            .times(1)
            .returning(move |_| {
                Ok(vec![
                    ChatMessage::new("alice".to_string(), "hi".to_string(), timestamp).with_id(1),
                ])
            });
        let usecase = GetRecentMessagesUseCase::new(Arc::new(store), 100);

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        let messages = result.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, Some(1));
    }

    #[tokio::test]
    async fn test_fetch_propagates_storage_error() {
        // テスト項目: ストアのエラーがそのまま返される
        // given (前提条件):
        let mut store = MockMessageStore::new();
        store
            .expect_fetch_recent()
            .returning(|_| Err(StorageError::Unavailable("connection refused".to_string())));
        let usecase = GetRecentMessagesUseCase::new(Arc::new(store), 100);

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(StorageError::Unavailable("connection refused".to_string()))
        );
    }
}
