//! Repository trait 定義
//!
//! ドメイン層が必要とする永続化のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ChatMessage, StorageError};

/// メッセージストア（Persistence Gateway）
///
/// - `store`: 1 件追記。失敗してもリアルタイム配信には影響させない（呼び出し側はログのみ）
/// - `fetch_recent`: 直近 `limit` 件を新しい順に返す。接続時の履歴取得専用で、ブロードキャスト経路では使わない
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// メッセージを永続化
    async fn store(&self, message: &ChatMessage) -> Result<(), StorageError>;

    /// 直近のメッセージを新しい順に取得（`id` は必ず付与される）
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ChatMessage>, StorageError>;
}
