//! ドメイン層のエラー型

use thiserror::Error;

use super::value_object::{ConnectionId, RoomKey};

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{kind} must be positive (got {value})")]
    NonPositiveId { kind: &'static str, value: i64 },
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("display name must be at most {0} characters")]
    DisplayNameTooLong(usize),
    #[error("message content must not be empty")]
    EmptyMessageContent,
    #[error("channel name must not be empty")]
    EmptyChannelName,
    #[error("cannot open a direct room with yourself (user {0})")]
    SelfDirectRoom(i64),
    #[error("invalid room key: '{0}'")]
    InvalidRoomKey(String),
}

/// 接続時の認証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// 認証情報が提示されなかった
    #[error("no credential provided")]
    Unauthenticated,
    /// 認証情報が不正（形式不正・期限切れ・署名不一致・クレーム不正）
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}

/// 永続化ゲートウェイのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// 一時的なストレージ障害
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    /// 対象のチャンネル・会話が存在しない
    #[error("{0} not found")]
    NotFound(String),
    /// 一意制約違反
    #[error("{0} already exists")]
    Conflict(String),
}

/// ルーター内部状態（ChatHub）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("connection {0} is not registered")]
    ConnectionNotFound(ConnectionId),
    #[error("connection {0} is already registered")]
    DuplicateConnection(ConnectionId),
    /// 不変条件違反。回復不能なプログラムエラーとして扱う。
    #[error("room state corruption: connection {connection} expected in {room}")]
    RoomStateCorruption {
        connection: ConnectionId,
        room: RoomKey,
    },
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),
    #[error("push failed: {0}")]
    PushFailed(String),
    #[error("failed to encode event: {0}")]
    Encode(String),
}
