//! ドメイン層のエラー型

use thiserror::Error;

/// 永続化ストアのエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// ストアに接続できない
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// クエリの実行に失敗
    #[error("Storage query failed: {0}")]
    Query(String),
}
