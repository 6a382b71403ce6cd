//! UseCase: 参加者切断処理
//!
//! Hub から登録解除し、送信キューを閉じます。同じ接続に対して何度呼んでもよい。

use crate::{domain::ConnectionId, infrastructure::hub::HubHandle};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    hub: HubHandle,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }

    /// 参加者切断を実行
    pub async fn execute(&self, connection_id: ConnectionId) {
        self.hub.unregister(connection_id).await;
    }
}
