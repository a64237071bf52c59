//! Server state and dependency wiring.

use std::sync::Arc;

use irori_shared::time::Clock;

use crate::{
    domain::{ChatHub, IdentityVerifier, MessagePusher, MessageStore},
    infrastructure::message_pusher::WebSocketMessagePusher,
    usecase::{
        ConnectParticipantUseCase, CreateChannelUseCase, DisconnectParticipantUseCase,
        GetChannelHistoryUseCase, GetConversationHistoryUseCase, GetOnlineIdentitiesUseCase,
        GetRoomSnapshotUseCase, JoinRoomUseCase, ListChannelsUseCase, ListConversationsUseCase,
        ListUsersUseCase, OpenConversationUseCase, RouterConfig, SendMessageUseCase, TypingUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// MessagePusher（メッセージ通知の抽象化）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub connect_participant_usecase: ConnectParticipantUseCase,
    pub disconnect_participant_usecase: DisconnectParticipantUseCase,
    pub join_room_usecase: JoinRoomUseCase,
    pub send_message_usecase: SendMessageUseCase,
    pub typing_usecase: TypingUseCase,
    pub list_channels_usecase: ListChannelsUseCase,
    pub create_channel_usecase: CreateChannelUseCase,
    pub get_channel_history_usecase: GetChannelHistoryUseCase,
    pub open_conversation_usecase: OpenConversationUseCase,
    pub get_conversation_history_usecase: GetConversationHistoryUseCase,
    pub list_conversations_usecase: ListConversationsUseCase,
    pub get_online_identities_usecase: GetOnlineIdentitiesUseCase,
    pub list_users_usecase: ListUsersUseCase,
    pub get_room_snapshot_usecase: GetRoomSnapshotUseCase,
}

impl AppState {
    /// Wire every use case around a fresh `ChatHub` and WebSocket pusher.
    ///
    /// Dependencies are created in order:
    /// 1. ChatHub (shared router state)
    /// 2. MessagePusher
    /// 3. UseCases
    pub fn new(
        store: Arc<dyn MessageStore>,
        verifier: Arc<dyn IdentityVerifier>,
        clock: Arc<dyn Clock>,
        config: RouterConfig,
    ) -> Self {
        // 1. ChatHub
        let hub = ChatHub::shared();

        // 2. MessagePusher (WebSocket implementation)
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

        // 3. UseCases
        Self {
            connect_participant_usecase: ConnectParticipantUseCase::new(
                hub.clone(),
                verifier,
                message_pusher.clone(),
                clock,
            ),
            disconnect_participant_usecase: DisconnectParticipantUseCase::new(
                hub.clone(),
                message_pusher.clone(),
            ),
            join_room_usecase: JoinRoomUseCase::new(hub.clone(), message_pusher.clone()),
            send_message_usecase: SendMessageUseCase::new(
                hub.clone(),
                store.clone(),
                message_pusher.clone(),
            ),
            typing_usecase: TypingUseCase::new(hub.clone(), message_pusher.clone(), config),
            list_channels_usecase: ListChannelsUseCase::new(store.clone()),
            create_channel_usecase: CreateChannelUseCase::new(store.clone()),
            get_channel_history_usecase: GetChannelHistoryUseCase::new(store.clone()),
            open_conversation_usecase: OpenConversationUseCase::new(store.clone()),
            get_conversation_history_usecase: GetConversationHistoryUseCase::new(store.clone()),
            list_conversations_usecase: ListConversationsUseCase::new(store, hub.clone()),
            get_online_identities_usecase: GetOnlineIdentitiesUseCase::new(hub.clone()),
            list_users_usecase: ListUsersUseCase::new(hub.clone()),
            get_room_snapshot_usecase: GetRoomSnapshotUseCase::new(hub),
            message_pusher,
        }
    }
}
