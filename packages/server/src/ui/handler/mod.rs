//! Request handlers.

mod auth;
mod http;
mod websocket;

pub use http::{
    create_channel, debug_rooms, get_channel_history, get_conversation_history,
    get_online_identities, health_check, list_channels, list_conversations, list_users,
    open_conversation,
};
pub use websocket::websocket_handler;
