//! UseCase: メッセージ送信処理
//!
//! ## 処理の流れ
//!
//! 1. サーバー時刻（UTC）でタイムスタンプを付与（クライアントの値は使わない）
//! 2. ストアへの保存を別タスクで開始（完了を待たない）
//! 3. エンコードして Hub にブロードキャストを依頼
//!
//! 保存の失敗はログに残すだけで、リアルタイム配信には影響しません。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - タイムスタンプの付与、保存の依頼、ブロードキャスト
//!
//! ### どのような状況を想定しているか
//! - 正常系：保存とブロードキャスト
//! - 異常系：保存失敗でもブロードキャストされる

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::{
    domain::{ChatMessage, MessageStore},
    infrastructure::{dto::websocket::MessageDto, hub::HubHandle},
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// MessageStore（永続化の抽象化）
    store: Arc<dyn MessageStore>,
    /// Hub（ファンアウト）
    hub: HubHandle,
    /// タイムスタンプの取得元
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(store: Arc<dyn MessageStore>, hub: HubHandle, clock: Arc<dyn Clock>) -> Self {
        Self { store, hub, clock }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `name` - 表示名（空でもよい）
    /// * `content` - 本文
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - タイムスタンプを付与したメッセージ（`id` は未設定）
    /// * `Err(SendMessageError)` - エンコード失敗
    pub async fn execute(
        &self,
        name: String,
        content: String,
    ) -> Result<ChatMessage, SendMessageError> {
        let message = ChatMessage::new(name, content, self.clock.now());

        self.persist_in_background(message.clone());

        let frame = MessageDto::from(message.clone())
            .encode()
            .map_err(|e| SendMessageError::Encode(e.to_string()))?;
        self.hub.broadcast(Arc::from(frame)).await;

        Ok(message)
    }

    fn persist_in_background(&self, message: ChatMessage) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.store(&message).await {
                tracing::error!(error = %e, "Failed to persist message, delivered live only");
            }
        });
    }
}
