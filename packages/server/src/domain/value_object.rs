//! 値オブジェクト

use std::fmt;

use uuid::Uuid;

/// 接続ハンドル
///
/// ユーザーの識別子ではない。同じ表示名の接続が複数あってもよい。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ConnectionId の生成
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// 新しい ConnectionId を生成（UUID v4）
    pub fn generate() -> ConnectionId {
        ConnectionId(Uuid::new_v4())
    }
}
