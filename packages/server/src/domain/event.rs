//! ルーターからクライアントへ配信するイベント
//!
//! ワイヤーフォーマットへの変換は Infrastructure 層（DTO）が担う。

use super::{
    entity::{DeliveredMessage, Identity},
    value_object::{ConnectionId, DisplayName, RoomKey},
};

/// Router → Client イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterEvent {
    NewChannelMessage(DeliveredMessage),
    NewDirectMessage(DeliveredMessage),
    OnlineIdentities(Vec<Identity>),
    TypingStarted {
        room_key: RoomKey,
        display_name: DisplayName,
    },
    TypingStopped {
        room_key: RoomKey,
        display_name: DisplayName,
    },
    OperationError {
        message: String,
    },
}

/// 1 つのイベントと、その配信先の接続
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub targets: Vec<ConnectionId>,
    pub event: RouterEvent,
}

impl Delivery {
    pub fn new(targets: Vec<ConnectionId>, event: RouterEvent) -> Self {
        Self { targets, event }
    }
}
