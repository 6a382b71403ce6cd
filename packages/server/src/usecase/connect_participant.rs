//! UseCase: 参加者接続処理
//!
//! 接続ハンドルと送信キューを作成し、Hub に登録します。

use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory},
    infrastructure::hub::{HubHandle, OutboundFrame},
};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    hub: HubHandle,
    /// 接続ごとの送信キューの容量
    outbound_capacity: usize,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(hub: HubHandle, outbound_capacity: usize) -> Self {
        Self {
            hub,
            outbound_capacity,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Returns
    ///
    /// 接続ハンドルと送信キューの読み出し側。書き込み側は Hub だけが保持する。
    pub async fn execute(&self) -> (ConnectionId, mpsc::Receiver<OutboundFrame>) {
        let connection_id = ConnectionIdFactory::generate();
        let (tx, rx) = mpsc::channel(self.outbound_capacity.max(1));
        self.hub.register(connection_id, tx).await;
        (connection_id, rx)
    }
}
