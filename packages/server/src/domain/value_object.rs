//! Value Objects
//!
//! 不変で、値そのものが同一性を表すドメインの基本型。
//! 生成時にバリデーションを行い、不正な値はドメイン内に入り込まない。

use std::{fmt, str::FromStr};

use serde::Serialize;
use uuid::Uuid;

use super::error::ValueObjectError;

/// 表示名の最大文字数
pub const MAX_DISPLAY_NAME_LENGTH: usize = 64;

/// 物理的な接続 1 本ごとに払い出される識別子
///
/// UUID v4 なので再利用されない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(i64);

        impl $name {
            pub fn new(value: i64) -> Result<Self, ValueObjectError> {
                if value <= 0 {
                    return Err(ValueObjectError::NonPositiveId {
                        kind: $label,
                        value,
                    });
                }
                Ok(Self(value))
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ValueObjectError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

positive_id!(
    /// 永続化されたユーザーの ID
    UserId,
    "user id"
);
positive_id!(
    /// チャンネルの ID
    ChannelId,
    "channel id"
);
positive_id!(
    /// 1 対 1 の会話スレッドの ID
    ConversationId,
    "conversation id"
);
positive_id!(
    /// 永続化済みメッセージの ID
    MessageId,
    "message id"
);

/// 表示名（ユーザー名）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyDisplayName);
        }
        if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            return Err(ValueObjectError::DisplayNameTooLong(MAX_DISPLAY_NAME_LENGTH));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// メッセージ本文
///
/// 前後の空白は除去して保持する。空白のみの本文は生成できない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyMessageContent);
        }
        // 既にトリム済みなら再確保しない
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// チャンネル名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelName(String);

impl ChannelName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyChannelName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// ブロードキャストの単位となるルームのキー
///
/// - `Channel`: チャンネル ID で識別される
/// - `Direct`: 2 人のユーザー ID の組で識別される（常に `low < high` に正規化）
///
/// どちらから DM を開始しても同じキーになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomKey {
    Channel(ChannelId),
    Direct { low: UserId, high: UserId },
}

impl RoomKey {
    pub fn channel(channel_id: ChannelId) -> Self {
        Self::Channel(channel_id)
    }

    /// 2 人のユーザーの DM ルームキーを生成する
    pub fn direct(a: UserId, b: UserId) -> Result<Self, ValueObjectError> {
        if a == b {
            return Err(ValueObjectError::SelfDirectRoom(a.value()));
        }
        Ok(Self::Direct {
            low: a.min(b),
            high: a.max(b),
        })
    }

    /// このルームにアクセスできるユーザーかどうか
    ///
    /// チャンネルは全員に開かれている。DM はペアの 2 人のみ。
    pub fn admits(&self, user_id: UserId) -> bool {
        match self {
            Self::Channel(_) => true,
            Self::Direct { low, high } => *low == user_id || *high == user_id,
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(id) => write!(f, "channel-{}", id),
            Self::Direct { low, high } => write!(f, "dm-{}-{}", low, high),
        }
    }
}

impl FromStr for RoomKey {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueObjectError::InvalidRoomKey(s.to_string());
        let parse_id = |part: &str| part.parse::<i64>().map_err(|_| invalid());

        if let Some(rest) = s.strip_prefix("channel-") {
            return Ok(Self::Channel(ChannelId::new(parse_id(rest)?)?));
        }
        if let Some(rest) = s.strip_prefix("dm-") {
            let (a, b) = rest.split_once('-').ok_or_else(invalid)?;
            return Self::direct(UserId::new(parse_id(a)?)?, UserId::new(parse_id(b)?)?);
        }
        Err(invalid())
    }
}

impl Serialize for RoomKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
