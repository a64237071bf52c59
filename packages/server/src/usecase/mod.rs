//! UseCase 層
//!
//! ルーターの各操作を 1 つのユースケースとして表現する。
//! 共有状態（`SharedHub`）の変更と、その結果のイベント配信はここで組み立てる。
//!
//! ロック順序は常に `ChatHub` → `MessagePusher`。配信は hub のロックを
//! 保持したまま送信キューに積むため、同一ルームのイベント順序はロックの
//! 直列化順序に従う。永続化呼び出しの間は hub のロックを保持しない。

mod channel;
mod connect_participant;
mod conversation;
mod disconnect_participant;
mod error;
mod join_room;
mod room_state;
mod send_message;
mod sequencer;
mod typing;

use std::time::Duration;

use crate::domain::{Delivery, MessagePusher};

pub use channel::{CreateChannelUseCase, GetChannelHistoryUseCase, ListChannelsUseCase};
pub use connect_participant::ConnectParticipantUseCase;
pub use conversation::{
    GetConversationHistoryUseCase, ListConversationsUseCase, OpenConversationUseCase,
};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, JoinRoomError, QueryError, SendMessageError, TypingError};
pub use join_room::JoinRoomUseCase;
pub use room_state::{GetOnlineIdentitiesUseCase, GetRoomSnapshotUseCase, ListUsersUseCase};
pub use send_message::SendMessageUseCase;
pub use sequencer::RoomSequencer;
pub use typing::TypingUseCase;

/// 入力中インジケータの既定の有効期限
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(2000);

/// ルーターの動作設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// 入力開始から自動停止までの時間
    pub typing_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
        }
    }
}

/// `Delivery` を順番に配信する
///
/// 個々の宛先への失敗は MessagePusher 側で握りつぶされる。ここで返る
/// エラーはイベントのエンコード失敗などで、ログに残して次へ進む。
pub(crate) async fn deliver(pusher: &dyn MessagePusher, deliveries: Vec<Delivery>) {
    for delivery in deliveries {
        if delivery.targets.is_empty() {
            continue;
        }
        if let Err(e) = pusher.broadcast(delivery.targets, &delivery.event).await {
            tracing::warn!("Failed to deliver event: {}", e);
        }
    }
}
