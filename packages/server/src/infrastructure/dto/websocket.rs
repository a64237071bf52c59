//! WebSocket event DTOs.
//!
//! Every frame is a JSON text frame of the form `{"type": "<event>", ...}`
//! with kebab-case event names and camelCase fields.

use serde::{Deserialize, Serialize};

/// Client → Router events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinRoom {
        room_key: String,
    },
    LeaveRoom,
    SendChannelMessage {
        channel_id: i64,
        content: String,
    },
    SendDirectMessage {
        recipient_id: i64,
        conversation_id: i64,
        content: String,
    },
    TypingStart {
        room_key: String,
    },
    TypingStop {
        room_key: String,
    },
}

/// Router → Client events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    NewChannelMessage(DeliveredMessageDto),
    NewDirectMessage(DeliveredMessageDto),
    OnlineIdentities {
        identities: Vec<IdentityDto>,
    },
    TypingStarted {
        room_key: String,
        display_name: String,
    },
    TypingStopped {
        room_key: String,
        display_name: String,
    },
    OperationError {
        message: String,
    },
}

/// A persisted message as delivered to room members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredMessageDto {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_display_name: String,
    pub room_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    /// RFC 3339 (JST)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDto {
    pub id: i64,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_channel_message() {
        // テスト項目: チャンネル送信イベントを JSON から復元できる
        // given (前提条件):
        let json = r#"{"type":"send-channel-message","channelId":3,"content":"hello"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::SendChannelMessage {
                channel_id: 3,
                content: "hello".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_leave_room_without_fields() {
        // テスト項目: フィールドを持たないイベントを復元できる
        // given (前提条件):
        let json = r#"{"type":"leave-room"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(event, ClientEvent::LeaveRoom);
    }

    #[test]
    fn test_parse_unknown_event_fails() {
        // テスト項目: 未知のイベント種別はエラーになる
        // given (前提条件):
        let json = r#"{"type":"delete-message","id":1}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientEvent>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_new_channel_message_is_flattened() {
        // テスト項目: 新着メッセージイベントは type とメッセージのフィールドが同じ階層に並ぶ
        // given (前提条件):
        let event = ServerEvent::NewChannelMessage(DeliveredMessageDto {
            id: 10,
            content: "hello".to_string(),
            author_id: 1,
            author_display_name: "alice".to_string(),
            room_key: "channel-1".to_string(),
            channel_id: Some(1),
            conversation_id: None,
            created_at: "2023-01-01T00:00:00.000+09:00".to_string(),
        });

        // when (操作):
        let value = serde_json::to_value(&event).unwrap();

        // then (期待する結果):
        assert_eq!(value["type"], "new-channel-message");
        assert_eq!(value["id"], 10);
        assert_eq!(value["authorDisplayName"], "alice");
        assert_eq!(value["roomKey"], "channel-1");
        assert!(value.get("conversationId").is_none());
    }

    #[test]
    fn test_typing_started_field_names() {
        // テスト項目: 入力中イベントのフィールド名が camelCase になる
        // given (前提条件):
        let event = ServerEvent::TypingStarted {
            room_key: "dm-1-2".to_string(),
            display_name: "bob".to_string(),
        };

        // when (操作):
        let json = serde_json::to_string(&event).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            r#"{"type":"typing-started","roomKey":"dm-1-2","displayName":"bob"}"#
        );
    }
}
