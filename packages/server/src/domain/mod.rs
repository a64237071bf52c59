//! Domain layer for the messaging router.
//!
//! This module contains the router's state machines and the interfaces it
//! consumes, independent of transport, wire format and storage.

pub mod entity;
pub mod error;
pub mod event;
pub mod hub;
pub mod identity;
pub mod pusher;
pub mod repository;
pub mod value_object;

pub use entity::{
    Channel, Connection, Conversation, ConversationSummary, DeliveredMessage, HistoryMessage,
    Identity, KnownUser, MessageTarget, StoredMessage,
};
pub use error::{AuthError, HubError, MessagePushError, StoreError, ValueObjectError};
pub use event::{Delivery, RouterEvent};
pub use hub::{ChatHub, RoomSnapshot, SharedHub, TypingOutcome};
pub use identity::IdentityVerifier;
pub use pusher::{MessagePusher, PusherChannel};
pub use repository::{DEFAULT_HISTORY_LIMIT, MessageStore};
pub use value_object::{
    ChannelId, ChannelName, ConnectionId, ConversationId, DisplayName, MessageContent, MessageId,
    RoomKey, Timestamp, UserId,
};

#[cfg(test)]
pub use repository::MockMessageStore;
