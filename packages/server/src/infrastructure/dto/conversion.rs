//! Conversion logic from domain entities to DTOs.

use irori_shared::time::timestamp_to_jst_rfc3339;

use crate::domain::{
    Channel, Conversation, ConversationSummary, DeliveredMessage, HistoryMessage, Identity,
    KnownUser, MessageTarget, RoomKey, RoomSnapshot, RouterEvent,
};
use crate::infrastructure::dto::{http, websocket as ws};

// ========================================
// Domain → WebSocket DTO
// ========================================

impl From<&DeliveredMessage> for ws::DeliveredMessageDto {
    fn from(message: &DeliveredMessage) -> Self {
        let (channel_id, conversation_id) = match message.target {
            MessageTarget::Channel(id) => (Some(id.value()), None),
            MessageTarget::Direct(id) => (None, Some(id.value())),
        };
        Self {
            id: message.id.value(),
            content: message.content.as_str().to_string(),
            author_id: message.author_id.value(),
            author_display_name: message.author_display_name.as_str().to_string(),
            room_key: message.room_key.to_string(),
            channel_id,
            conversation_id,
            created_at: timestamp_to_jst_rfc3339(message.created_at.value()),
        }
    }
}

impl From<&Identity> for ws::IdentityDto {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.value(),
            display_name: identity.display_name.as_str().to_string(),
        }
    }
}

impl From<&RouterEvent> for ws::ServerEvent {
    fn from(event: &RouterEvent) -> Self {
        match event {
            RouterEvent::NewChannelMessage(message) => Self::NewChannelMessage(message.into()),
            RouterEvent::NewDirectMessage(message) => Self::NewDirectMessage(message.into()),
            RouterEvent::OnlineIdentities(identities) => Self::OnlineIdentities {
                identities: identities.iter().map(Into::into).collect(),
            },
            RouterEvent::TypingStarted {
                room_key,
                display_name,
            } => Self::TypingStarted {
                room_key: room_key.to_string(),
                display_name: display_name.as_str().to_string(),
            },
            RouterEvent::TypingStopped {
                room_key,
                display_name,
            } => Self::TypingStopped {
                room_key: room_key.to_string(),
                display_name: display_name.as_str().to_string(),
            },
            RouterEvent::OperationError { message } => Self::OperationError {
                message: message.clone(),
            },
        }
    }
}

// ========================================
// Domain → HTTP DTO
// ========================================

impl From<&Channel> for http::ChannelDto {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id.value(),
            name: channel.name.as_str().to_string(),
            room_key: RoomKey::channel(channel.id).to_string(),
            created_at: timestamp_to_jst_rfc3339(channel.created_at.value()),
        }
    }
}

impl From<&HistoryMessage> for http::HistoryMessageDto {
    fn from(message: &HistoryMessage) -> Self {
        Self {
            id: message.id.value(),
            content: message.content.as_str().to_string(),
            author_id: message.author_id.value(),
            author_display_name: message.author_display_name.as_str().to_string(),
            created_at: timestamp_to_jst_rfc3339(message.created_at.value()),
        }
    }
}

impl From<&Conversation> for http::ConversationDto {
    fn from(conversation: &Conversation) -> Self {
        let room_key = RoomKey::Direct {
            low: conversation.low,
            high: conversation.high,
        };
        Self {
            id: conversation.id.value(),
            user_ids: [conversation.low.value(), conversation.high.value()],
            room_key: room_key.to_string(),
            created_at: timestamp_to_jst_rfc3339(conversation.created_at.value()),
        }
    }
}

impl From<&ConversationSummary> for http::ConversationSummaryDto {
    fn from(summary: &ConversationSummary) -> Self {
        let conversation = http::ConversationDto::from(&summary.conversation);
        Self {
            id: conversation.id,
            other_user_id: summary.other_id.value(),
            other_display_name: summary
                .other_display_name
                .as_ref()
                .map(|name| name.as_str().to_string()),
            room_key: conversation.room_key,
            created_at: conversation.created_at,
        }
    }
}

impl From<&KnownUser> for http::UserDto {
    fn from(user: &KnownUser) -> Self {
        Self {
            id: user.identity.id.value(),
            display_name: user.identity.display_name.as_str().to_string(),
            online: user.online,
        }
    }
}

impl From<&RoomSnapshot> for http::RoomSnapshotDto {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            room_key: snapshot.room_key.to_string(),
            members: snapshot
                .members
                .iter()
                .map(|(connection_id, identity)| http::RoomMemberDto {
                    connection_id: connection_id.to_string(),
                    user_id: identity.id.value(),
                    display_name: identity.display_name.as_str().to_string(),
                })
                .collect(),
            typing: snapshot.typing.clone(),
        }
    }
}
