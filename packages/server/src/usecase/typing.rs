//! UseCase: 入力中インジケータ
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - TypingUseCase::start() / stop() と期限切れタイマー
//!
//! ### なぜこのテストが必要か
//! - 連続した入力開始でも開始イベントは 1 回だけであることを保証
//! - 明示的な停止がなくても期限切れで停止イベントが 1 回だけ届くことを確認
//! - 停止済み・延長済みのタイマーが後から発火しても何も起きないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：開始 → 停止、開始 → 期限切れ
//! - 異常系：所属していないルームへの入力通知
//! - エッジケース：期限内の再開始（延長）

use std::sync::Arc;

use tokio::{task::AbortHandle, time::Instant};

use crate::domain::{
    ChatHub, ConnectionId, HubError, MessagePusher, RoomKey, SharedHub, TypingOutcome, UserId,
};

use super::{RouterConfig, deliver, error::TypingError};

/// 入力中インジケータのユースケース
pub struct TypingUseCase {
    hub: SharedHub,
    message_pusher: Arc<dyn MessagePusher>,
    config: RouterConfig,
}

impl TypingUseCase {
    pub fn new(
        hub: SharedHub,
        message_pusher: Arc<dyn MessagePusher>,
        config: RouterConfig,
    ) -> Self {
        Self {
            hub,
            message_pusher,
            config,
        }
    }

    /// 入力開始
    ///
    /// 既に入力中であれば期限を延長するだけで、開始イベントは再送しない。
    pub async fn start(
        &self,
        connection_id: ConnectionId,
        room_key: RoomKey,
    ) -> Result<(), TypingError> {
        let mut hub = self.hub.lock().await;
        let user_id = current_member(&hub, connection_id, room_key)?;

        let expires_at = Instant::now() + self.config.typing_timeout;
        let outcome = hub.start_typing(connection_id, room_key, expires_at)?;
        let generation = outcome.generation();
        if let TypingOutcome::Started { delivery, .. } = outcome {
            deliver(self.message_pusher.as_ref(), vec![delivery]).await;
        }

        // タイマーは hub のロック下で紐付けるため、発火しても紐付けより先には進まない
        let timer = self.spawn_expiry(room_key, user_id, generation);
        hub.arm_typing_timer(room_key, user_id, generation, timer);
        Ok(())
    }

    /// 入力停止（入力中でなければ何もしない）
    pub async fn stop(
        &self,
        connection_id: ConnectionId,
        room_key: RoomKey,
    ) -> Result<(), TypingError> {
        let mut hub = self.hub.lock().await;
        let user_id = current_member(&hub, connection_id, room_key)?;
        if let Some(delivery) = hub.stop_typing(room_key, user_id) {
            deliver(self.message_pusher.as_ref(), vec![delivery]).await;
        }
        Ok(())
    }

    fn spawn_expiry(&self, room_key: RoomKey, user_id: UserId, generation: u64) -> AbortHandle {
        let hub = self.hub.clone();
        let message_pusher = self.message_pusher.clone();
        let timeout = self.config.typing_timeout;

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut hub = hub.lock().await;
            if let Some(delivery) = hub.expire_typing(room_key, user_id, generation) {
                tracing::debug!("Typing of user {} in {} expired", user_id, room_key);
                deliver(message_pusher.as_ref(), vec![delivery]).await;
            }
        })
        .abort_handle()
    }
}

/// 接続が `room_key` に所属していればその Identity を返す
fn current_member(
    hub: &ChatHub,
    connection_id: ConnectionId,
    room_key: RoomKey,
) -> Result<UserId, TypingError> {
    let connection = hub
        .connection(connection_id)
        .ok_or(HubError::ConnectionNotFound(connection_id))?;
    if connection.current_room != Some(room_key) {
        return Err(TypingError::NotInRoom(room_key));
    }
    Ok(connection.identity.id)
}
