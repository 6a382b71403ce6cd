//! Hub: 接続中クライアント集合の唯一の管理者
//!
//! ## 責務
//!
//! - 接続の登録・登録解除
//! - エンコード済みフレームのファンアウト（全接続の送信キューへ投入）
//! - シャットダウン時に全接続の送信キューを閉じる
//!
//! ## 設計ノート
//!
//! 接続集合は 1 つのタスク（アクター）だけが所有し、`HubHandle` からの要求を
//! 到着順に 1 件ずつ処理します。ロックは外部に漏れません。
//!
//! Hub はソケットに触れません。各接続の送信キュー（bounded mpsc）の Sender を
//! 唯一保持しており、Sender を捨てることがキューを閉じる操作になります。
//! キューが閉じると接続の書き込みループが close フレームを送って終了します。

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};

use crate::domain::ConnectionId;

/// エンコード済みのフレーム（全接続で共有）
pub type OutboundFrame = Arc<str>;

/// 接続ごとの送信キューの書き込み側（Hub のみが保持する）
pub type OutboundQueue = mpsc::Sender<OutboundFrame>;

/// Hub への要求キューの容量
const COMMAND_CAPACITY: usize = 1024;

enum HubCommand {
    Register {
        id: ConnectionId,
        queue: OutboundQueue,
    },
    Unregister {
        id: ConnectionId,
    },
    Broadcast {
        frame: OutboundFrame,
    },
    LiveCount {
        reply: oneshot::Sender<usize>,
    },
    Shutdown {
        reply: oneshot::Sender<usize>,
    },
}

/// Hub アクター本体
pub struct Hub {
    connections: HashMap<ConnectionId, OutboundQueue>,
    commands: mpsc::Receiver<HubCommand>,
}

impl Hub {
    /// Hub タスクを起動し、操作用のハンドルを返す
    pub fn spawn() -> HubHandle {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let hub = Hub {
            connections: HashMap::new(),
            commands: rx,
        };
        tokio::spawn(hub.run());
        HubHandle { commands: tx }
    }

    async fn run(mut self) {
        tracing::debug!("Hub started");

        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { id, queue } => self.register(id, queue),
                HubCommand::Unregister { id } => self.unregister(id),
                HubCommand::Broadcast { frame } => self.broadcast(frame),
                HubCommand::LiveCount { reply } => {
                    let _ = reply.send(self.connections.len());
                }
                HubCommand::Shutdown { reply } => {
                    let closed = self.close_all();
                    tracing::info!(closed, "Hub shut down, all outbound queues closed");
                    let _ = reply.send(closed);
                    break;
                }
            }
        }

        // 以降の要求は受け付けない。キュー内に残った登録要求は Sender ごと破棄され、
        // その接続の送信キューは即座に閉じる
        self.commands.close();
        self.close_all();
        tracing::debug!("Hub stopped");
    }

    fn register(&mut self, id: ConnectionId, queue: OutboundQueue) {
        self.connections.insert(id, queue);
        tracing::info!(
            connection_id = %id,
            live = self.connections.len(),
            "Connection registered"
        );
    }

    fn unregister(&mut self, id: ConnectionId) {
        // Sender を捨てるとキューが閉じる。未登録なら何もしない（冪等）
        if self.connections.remove(&id).is_some() {
            tracing::info!(
                connection_id = %id,
                live = self.connections.len(),
                "Connection unregistered"
            );
        } else {
            tracing::debug!(connection_id = %id, "Connection already unregistered");
        }
    }

    fn broadcast(&mut self, frame: OutboundFrame) {
        // ブロックしない投入。満杯の接続は遅いクライアントとみなして切り離す
        self.connections
            .retain(|id, queue| match queue.try_send(frame.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = %id,
                        "Outbound queue full, dropping slow connection"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(connection_id = %id, "Outbound queue already closed");
                    false
                }
            });
        tracing::debug!(live = self.connections.len(), "Broadcast fanned out");
    }

    fn close_all(&mut self) -> usize {
        let closed = self.connections.len();
        self.connections.clear();
        closed
    }
}

/// Hub への要求窓口（Clone 可能）
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// 接続を登録し、以降のブロードキャスト対象にする
    ///
    /// Hub が停止済みの場合は `queue` が破棄され、接続の送信キューは即座に閉じる。
    pub async fn register(&self, id: ConnectionId, queue: OutboundQueue) {
        if self
            .commands
            .send(HubCommand::Register { id, queue })
            .await
            .is_err()
        {
            tracing::debug!(connection_id = %id, "Hub stopped, late registration closed");
        }
    }

    /// 接続を登録解除し、送信キューを閉じる（複数回呼んでもよい）
    pub async fn unregister(&self, id: ConnectionId) {
        if self
            .commands
            .send(HubCommand::Unregister { id })
            .await
            .is_err()
        {
            tracing::debug!(connection_id = %id, "Hub stopped, nothing to unregister");
        }
    }

    /// この時点で登録されている全接続にフレームを配信
    pub async fn broadcast(&self, frame: OutboundFrame) {
        if self
            .commands
            .send(HubCommand::Broadcast { frame })
            .await
            .is_err()
        {
            tracing::debug!("Hub stopped, broadcast discarded");
        }
    }

    /// 登録中の接続数（Hub 停止後は 0）
    pub async fn live_count(&self) -> usize {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(HubCommand::LiveCount { reply })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// 新規要求の受付を停止し、全接続の送信キューを閉じる
    ///
    /// 全キューを閉じた時点で戻り、閉じた接続数を返す。各接続の送信完了は待たない。
    pub async fn shutdown(&self) -> usize {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(HubCommand::Shutdown { reply })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionIdFactory;
    use tokio::sync::mpsc::Receiver;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Hub の登録・登録解除・ブロードキャスト・シャットダウン
    // - 遅いクライアントの切り離し（バックプレッシャー方針）
    //
    // 【なぜこのテストが必要か】
    // - Hub は「誰が受信するか」を決める唯一のコンポーネント
    // - 登録解除後に配信されないこと、配信順序が全接続で一致することを保証する
    // ========================================

    fn frame(text: &str) -> OutboundFrame {
        Arc::from(text)
    }

    async fn connect(hub: &HubHandle, capacity: usize) -> (ConnectionId, Receiver<OutboundFrame>) {
        let id = ConnectionIdFactory::generate();
        let (tx, rx) = mpsc::channel(capacity);
        hub.register(id, tx).await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_registered_connection() {
        // テスト項目: 登録済みの接続にブロードキャストが届く
        // given (前提条件):
        let hub = Hub::spawn();
        let (_id, mut rx) = connect(&hub, 8).await;

        // when (操作):
        hub.broadcast(frame("hello")).await;

        // then (期待する結果):
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
        assert_eq!(hub.live_count().await, 1);
    }

    #[tokio::test]
    async fn test_no_delivery_after_unregister() {
        // テスト項目: 登録解除後のブロードキャストは届かず、キューが閉じる
        // given (前提条件):
        let hub = Hub::spawn();
        let (id, mut rx) = connect(&hub, 8).await;
        hub.broadcast(frame("before")).await;

        // when (操作):
        hub.unregister(id).await;
        hub.broadcast(frame("after")).await;

        // then (期待する結果): 登録解除前のフレームのみ受信し、その後キューは閉じている
        assert_eq!(rx.recv().await.as_deref(), Some("before"));
        assert_eq!(rx.recv().await, None);
        assert_eq!(hub.live_count().await, 0);
    }

    #[tokio::test]
    async fn test_unregister_twice_is_noop() {
        // テスト項目: 同じ接続を 2 回登録解除しても 1 回と同じ結果になる（冪等性）
        // given (前提条件):
        let hub = Hub::spawn();
        let (id, mut rx) = connect(&hub, 8).await;
        let (_other, _other_rx) = connect(&hub, 8).await;

        // when (操作):
        hub.unregister(id).await;
        hub.unregister(id).await;

        // then (期待する結果):
        assert_eq!(rx.recv().await, None);
        assert_eq!(hub.live_count().await, 1);
    }

    #[tokio::test]
    async fn test_fan_out_order_is_consistent() {
        // テスト項目: 複数接続が同じ順序でブロードキャストを受信する
        // given (前提条件):
        let hub = Hub::spawn();
        let (_a, mut rx_a) = connect(&hub, 8).await;
        let (_b, mut rx_b) = connect(&hub, 8).await;

        // when (操作):
        for text in ["one", "two", "three"] {
            hub.broadcast(frame(text)).await;
        }

        // then (期待する結果):
        for expected in ["one", "two", "three"] {
            assert_eq!(rx_a.recv().await.as_deref(), Some(expected));
            assert_eq!(rx_b.recv().await.as_deref(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_late_registration_only_sees_later_broadcasts() {
        // テスト項目: 登録前のブロードキャストは届かず、登録後のものは届く
        // given (前提条件):
        let hub = Hub::spawn();
        let (_a, mut rx_a) = connect(&hub, 8).await;
        hub.broadcast(frame("first")).await;

        // when (操作):
        let (_b, mut rx_b) = connect(&hub, 8).await;
        hub.broadcast(frame("second")).await;

        // then (期待する結果):
        assert_eq!(rx_a.recv().await.as_deref(), Some("first"));
        assert_eq!(rx_a.recv().await.as_deref(), Some("second"));
        assert_eq!(rx_b.recv().await.as_deref(), Some("second"));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_slow_connection_is_dropped_when_queue_is_full() {
        // テスト項目: 送信キューが満杯の接続は切り離され、他の接続には配信が続く
        // given (前提条件): slow は一切読み出さない
        let hub = Hub::spawn();
        let (_fast, mut rx_fast) = connect(&hub, 2048).await;
        let (_slow, mut rx_slow) = connect(&hub, 256).await;

        // when (操作): 1000 件のバースト
        for i in 0..1000 {
            hub.broadcast(frame(&i.to_string())).await;
        }

        // then (期待する結果):
        assert_eq!(hub.live_count().await, 1);

        // slow は容量分だけ受信した後、キューが閉じている
        let mut slow_received = 0;
        while rx_slow.recv().await.is_some() {
            slow_received += 1;
        }
        assert_eq!(slow_received, 256);

        // fast は全件を順序通り受信する
        for i in 0..1000 {
            assert_eq!(rx_fast.recv().await.as_deref(), Some(i.to_string().as_str()));
        }
    }

    #[tokio::test]
    async fn test_closed_queue_is_pruned_on_broadcast() {
        // テスト項目: 受信側が破棄された接続はブロードキャスト時に接続集合から除かれる
        // given (前提条件):
        let hub = Hub::spawn();
        let (_id, rx) = connect(&hub, 8).await;
        drop(rx);

        // when (操作):
        hub.broadcast(frame("anyone?")).await;

        // then (期待する結果):
        assert_eq!(hub.live_count().await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_every_queue() {
        // テスト項目: シャットダウンで全接続のキューが閉じ、接続集合が空になる
        // given (前提条件):
        let hub = Hub::spawn();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (_id, rx) = connect(&hub, 8).await;
            receivers.push(rx);
        }

        // when (操作):
        let closed = hub.shutdown().await;

        // then (期待する結果):
        assert_eq!(closed, 3);
        for rx in receivers.iter_mut() {
            assert_eq!(rx.recv().await, None);
        }
        assert_eq!(hub.live_count().await, 0);
    }

    #[tokio::test]
    async fn test_registration_after_shutdown_is_closed_immediately() {
        // テスト項目: シャットダウン後の登録は受け付けられず、キューは即座に閉じる
        // given (前提条件):
        let hub = Hub::spawn();
        hub.shutdown().await;

        // when (操作):
        let (_id, mut rx) = connect(&hub, 8).await;
        hub.broadcast(frame("ignored")).await;

        // then (期待する結果):
        assert_eq!(rx.recv().await, None);
        assert_eq!(hub.shutdown().await, 0);
    }
}
