//! UseCase 層のエラー型

use thiserror::Error;

/// メッセージ送信のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendMessageError {
    /// 送信フレームのエンコードに失敗
    #[error("Failed to encode message: {0}")]
    Encode(String),
}
