//! Entities
//!
//! ルーターが扱うエンティティ。`Identity` と配信済みメッセージの内容は
//! 永続化層が所有しており、ルーターはそのコピーを参照するだけ。

use super::value_object::{
    ChannelId, ChannelName, ConnectionId, ConversationId, DisplayName, MessageContent, MessageId,
    RoomKey, Timestamp, UserId,
};

/// 認証済みの主体（ユーザー ID と表示名）
///
/// 接続確立時に一度だけ解決され、接続の生存期間中は変化しない。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: UserId,
    pub display_name: DisplayName,
}

impl Identity {
    pub fn new(id: UserId, display_name: DisplayName) -> Self {
        Self { id, display_name }
    }
}

/// 1 本の双方向接続
///
/// `current_room` は高々 1 つ。ルームの切り替えは `RoomRegistry::join` を通してのみ行う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub identity: Identity,
    pub current_room: Option<RoomKey>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, identity: Identity, connected_at: Timestamp) -> Self {
        Self {
            id,
            identity,
            current_room: None,
            connected_at,
        }
    }
}

/// 永続化ゲートウェイが追記時に返すレコード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: MessageId,
    pub created_at: Timestamp,
}

/// メッセージの宛先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Channel(ChannelId),
    Direct(ConversationId),
}

/// 永続化済みで、ファンアウト可能なメッセージ
///
/// 永続化に成功したメッセージからのみ生成される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub id: MessageId,
    pub content: MessageContent,
    pub author_id: UserId,
    pub author_display_name: DisplayName,
    pub room_key: RoomKey,
    pub target: MessageTarget,
    pub created_at: Timestamp,
}

impl DeliveredMessage {
    pub fn new(
        stored: StoredMessage,
        content: MessageContent,
        author: &Identity,
        room_key: RoomKey,
        target: MessageTarget,
    ) -> Self {
        Self {
            id: stored.id,
            content,
            author_id: author.id,
            author_display_name: author.display_name.clone(),
            room_key,
            target,
            created_at: stored.created_at,
        }
    }
}

/// チャンネル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: ChannelName,
    pub created_at: Timestamp,
}

/// 1 対 1 の会話スレッド（参加者は正規化済み: `low < high`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub low: UserId,
    pub high: UserId,
    pub created_at: Timestamp,
}

impl Conversation {
    pub fn involves(&self, user_id: UserId) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// 参加者がちょうど `{a, b}` であるかどうか
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.low == a.min(b)) && (self.high == a.max(b))
    }

    /// `user_id` から見た相手
    pub fn other(&self, user_id: UserId) -> Option<UserId> {
        if self.low == user_id {
            Some(self.high)
        } else if self.high == user_id {
            Some(self.low)
        } else {
            None
        }
    }
}

/// 一覧表示用の会話スレッド（相手側の情報つき）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub other_id: UserId,
    /// 相手がこのプロセスの起動後に一度も接続していなければ `None`
    pub other_display_name: Option<DisplayName>,
}

/// 起動後に一度でも接続した Identity とその現在の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownUser {
    pub identity: Identity,
    pub online: bool,
}

/// 履歴取得用のメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub id: MessageId,
    pub content: MessageContent,
    pub author_id: UserId,
    pub author_display_name: DisplayName,
    pub created_at: Timestamp,
}
