//! Shared application state.

use std::{sync::Arc, time::Duration};

use hiroba_shared::time::Clock;
use tokio::sync::watch;

use crate::{
    config::ServerConfig,
    domain::MessageStore,
    infrastructure::hub::{Hub, HubHandle},
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, GetRecentMessagesUseCase,
        SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    /// Hub（接続集合の管理）
    pub hub: HubHandle,
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: ConnectParticipantUseCase,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: DisconnectParticipantUseCase,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: SendMessageUseCase,
    /// GetRecentMessagesUseCase（履歴取得のユースケース）
    pub get_recent_messages_usecase: GetRecentMessagesUseCase,
    /// 処理中の WebSocket 接続（シャットダウン時の送信完了待ちに使う）
    pub active_connections: ActiveConnections,
}

impl AppState {
    /// Spawn the hub and wire the use cases around it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ServerConfig, store: Arc<dyn MessageStore>, clock: Arc<dyn Clock>) -> Self {
        let hub = Hub::spawn();
        Self {
            connect_participant_usecase: ConnectParticipantUseCase::new(
                hub.clone(),
                config.outbound_capacity,
            ),
            disconnect_participant_usecase: DisconnectParticipantUseCase::new(hub.clone()),
            send_message_usecase: SendMessageUseCase::new(store.clone(), hub.clone(), clock),
            get_recent_messages_usecase: GetRecentMessagesUseCase::new(
                store,
                config.history_limit,
            ),
            hub,
            config,
            active_connections: ActiveConnections::default(),
        }
    }
}

/// Counts websocket connections whose tasks are still running.
///
/// Upgraded sockets are not tracked by axum's graceful shutdown, so the
/// server uses this to let writers flush their close frames before exiting.
#[derive(Clone)]
pub struct ActiveConnections {
    count: Arc<watch::Sender<usize>>,
}

impl Default for ActiveConnections {
    fn default() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            count: Arc::new(count),
        }
    }
}

impl ActiveConnections {
    /// Mark a connection as running until the returned guard is dropped
    pub fn track(&self) -> ConnectionGuard {
        self.count.send_modify(|n| *n += 1);
        ConnectionGuard {
            count: self.count.clone(),
        }
    }

    /// Number of connections still running
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Wait until every connection has finished, for at most `limit`.
    ///
    /// Returns `false` if connections were still running when `limit` elapsed.
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        let mut rx = self.count.subscribe();
        tokio::time::timeout(limit, rx.wait_for(|n| *n == 0))
            .await
            .is_ok_and(|result| result.is_ok())
    }
}

/// Held by a connection's supervisor for as long as the connection runs
pub struct ConnectionGuard {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}
