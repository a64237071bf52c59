//! UseCase: ルーム参加・離脱
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() / leave() メソッド
//!
//! ### なぜこのテストが必要か
//! - 接続は常に高々 1 つのルームにしか所属しないことを保証
//! - ルーム切り替え時に直前のルームの入力中表示が消えることを確認
//! - DM ルームには当事者以外が参加できないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加、切り替え、離脱
//! - 異常系：当事者以外の DM ルーム参加
//! - エッジケース：同じルームへの再参加

use std::sync::Arc;

use crate::domain::{ConnectionId, HubError, MessagePusher, RoomKey, SharedHub};

use super::{deliver, error::JoinRoomError};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    hub: SharedHub,
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinRoomUseCase {
    pub fn new(hub: SharedHub, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            hub,
            message_pusher,
        }
    }

    /// ルームに参加する（直前のルームからは自動的に離脱）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_key: RoomKey,
    ) -> Result<(), JoinRoomError> {
        let mut hub = self.hub.lock().await;
        let user_id = hub
            .identity_of(connection_id)
            .map(|identity| identity.id)
            .ok_or(HubError::ConnectionNotFound(connection_id))?;
        if !room_key.admits(user_id) {
            return Err(JoinRoomError::Forbidden(room_key));
        }

        let deliveries = hub.join(connection_id, room_key)?;
        deliver(self.message_pusher.as_ref(), deliveries).await;
        tracing::debug!("Connection {} joined {}", connection_id, room_key);
        Ok(())
    }

    /// 現在のルームから離脱する
    pub async fn leave(&self, connection_id: ConnectionId) -> Result<(), JoinRoomError> {
        let mut hub = self.hub.lock().await;
        let deliveries = hub.leave(connection_id)?;
        deliver(self.message_pusher.as_ref(), deliveries).await;
        tracing::debug!("Connection {} left its room", connection_id);
        Ok(())
    }
}
