//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 切断時の後始末（ルーム離脱・プレゼンス撤回・入力中停止）が
//!   接続ごとにちょうど 1 回だけ実行されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：入力中の参加者の切断
//! - エッジケース：同じ接続の二重切断、複数接続を持つ Identity の片側切断

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, SharedHub};

use super::deliver;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    hub: SharedHub,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(hub: SharedHub, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            hub,
            message_pusher,
        }
    }

    /// 参加者切断を実行
    ///
    /// # Returns
    ///
    /// 後始末を実行した場合は `true`。既に切断済みだった場合は `false`。
    pub async fn execute(&self, connection_id: ConnectionId) -> bool {
        let mut hub = self.hub.lock().await;
        let Some(deliveries) = hub.unregister(connection_id) else {
            tracing::debug!("Connection {} was already cleaned up", connection_id);
            return false;
        };
        deliver(self.message_pusher.as_ref(), deliveries).await;
        let remaining = hub.connection_count();
        drop(hub);

        self.message_pusher.unregister_client(&connection_id).await;
        tracing::info!(
            "Connection {} cleaned up ({} connections remain)",
            connection_id,
            remaining
        );
        true
    }
}
