//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{AuthError, HubError, RoomKey, StoreError, ValueObjectError};

/// 接続時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Hub(#[from] HubError),
}

/// ルーム参加時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error(transparent)]
    InvalidInput(#[from] ValueObjectError),
    #[error("not allowed to join {0}")]
    Forbidden(RoomKey),
    #[error(transparent)]
    Hub(#[from] HubError),
}

/// メッセージ送信時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// 空白のみの本文。送信者にも通知せず破棄する。
    #[error("message content is empty")]
    EmptyContent,
    #[error("invalid message: {0}")]
    InvalidInput(ValueObjectError),
    #[error("sender is not a participant of conversation {0}")]
    NotParticipant(i64),
    #[error("message could not be delivered: {0}")]
    DeliveryFailed(#[from] StoreError),
    #[error(transparent)]
    Hub(#[from] HubError),
}

impl From<ValueObjectError> for SendMessageError {
    fn from(e: ValueObjectError) -> Self {
        match e {
            ValueObjectError::EmptyMessageContent => Self::EmptyContent,
            other => Self::InvalidInput(other),
        }
    }
}

/// 入力中通知のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypingError {
    #[error(transparent)]
    InvalidInput(#[from] ValueObjectError),
    #[error("not currently in {0}")]
    NotInRoom(RoomKey),
    #[error(transparent)]
    Hub(#[from] HubError),
}

/// 参照系 API のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for QueryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Conflict(what) => Self::Conflict(what),
            StoreError::StorageUnavailable(reason) => Self::Unavailable(reason),
        }
    }
}

impl From<ValueObjectError> for QueryError {
    fn from(e: ValueObjectError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

/// ルーム状態の不整合（接続を切断すべき致命的エラー）かどうか
pub(crate) fn is_corruption(e: &HubError) -> bool {
    matches!(e, HubError::RoomStateCorruption { .. })
}

impl JoinRoomError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Hub(e) if is_corruption(e))
    }
}

impl SendMessageError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Hub(e) if is_corruption(e))
    }
}

impl TypingError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Hub(e) if is_corruption(e))
    }
}
