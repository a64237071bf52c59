//! MessagePusher trait 定義
//!
//! クライアントへのイベント配信の抽象化。
//! ルーターはコールバックを呼ぶ代わりに、接続ごとの送信キューへ書き込む。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RouterEvent};

/// 接続ごとの送信キュー（エンコード済みのフレームを流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信キューを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信キューを登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続にイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RouterEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にイベントを送信
    ///
    /// 一部の宛先への送信失敗は許容し、残りの宛先への配信を続ける。
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RouterEvent,
    ) -> Result<(), MessagePushError>;
}
