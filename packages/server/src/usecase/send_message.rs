//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::send_channel_message() / send_direct_message() メソッド
//!
//! ### なぜこのテストが必要か
//! - 永続化に成功したメッセージのみが配信されることを保証
//! - 送信者自身にも同じ配信経路でメッセージが届くことを確認
//! - 空のメッセージは永続化も配信もされないことを確認
//! - 永続化の失敗は送信者にだけ返され、配信されないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：チャンネル・DM の送信とルーム内へのブロードキャスト
//! - 異常系：永続化失敗、会話スレッドの当事者でない送信
//! - エッジケース：空白のみの本文、送信と同時の入力中停止

use std::sync::Arc;

use crate::domain::{
    ChannelId, ConnectionId, ConversationId, DeliveredMessage, HubError, Identity, MessageContent,
    MessagePusher, MessageStore, MessageTarget, RoomKey, RouterEvent, SharedHub, UserId,
};

use super::{deliver, error::SendMessageError, sequencer::RoomSequencer};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    hub: SharedHub,
    /// MessageStore（永続化層の抽象化）
    store: Arc<dyn MessageStore>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: RoomSequencer,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        hub: SharedHub,
        store: Arc<dyn MessageStore>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            hub,
            store,
            message_pusher,
            sequencer: RoomSequencer::new(),
        }
    }

    /// チャンネルへのメッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 送信者の接続 ID
    /// * `channel_id` - 送信先チャンネル
    /// * `content` - 本文（前後の空白は除去される）
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveredMessage)` - 永続化されルームへ配信されたメッセージ
    /// * `Err(SendMessageError)` - 送信失敗（`EmptyContent` の場合は何も起きていない）
    pub async fn send_channel_message(
        &self,
        connection_id: ConnectionId,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<DeliveredMessage, SendMessageError> {
        // 1. 本文の検証（永続化の前に行う）
        let content = MessageContent::new(content.to_string())?;
        let author = self.author_of(connection_id).await?;
        let room_key = RoomKey::channel(channel_id);

        // 2. 永続化と配信をルーム単位で直列化
        let _turn = self.sequencer.acquire(room_key).await;
        let stored = self
            .store
            .append_channel_message(&content, &author, channel_id)
            .await?;

        // 3. 永続化されたメッセージをルームの全メンバー（送信者を含む）へ配信
        let message = DeliveredMessage::new(
            stored,
            content,
            &author,
            room_key,
            MessageTarget::Channel(channel_id),
        );
        self.fan_out(
            room_key,
            author.id,
            RouterEvent::NewChannelMessage(message.clone()),
        )
        .await;

        Ok(message)
    }

    /// DM の送信を実行
    ///
    /// 会話スレッドの当事者がちょうど送信者と宛先の 2 人でなければ拒否する。
    pub async fn send_direct_message(
        &self,
        connection_id: ConnectionId,
        recipient_id: UserId,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<DeliveredMessage, SendMessageError> {
        let content = MessageContent::new(content.to_string())?;
        let author = self.author_of(connection_id).await?;
        let room_key = RoomKey::direct(author.id, recipient_id)?;

        let conversation = self.store.conversation(conversation_id).await?;
        if !conversation.is_between(author.id, recipient_id) {
            tracing::warn!(
                "User {} tried to post to conversation {} as a non-participant",
                author.id,
                conversation_id
            );
            return Err(SendMessageError::NotParticipant(conversation_id.value()));
        }

        let _turn = self.sequencer.acquire(room_key).await;
        let stored = self
            .store
            .append_direct_message(&content, &author, conversation_id)
            .await?;

        let message = DeliveredMessage::new(
            stored,
            content,
            &author,
            room_key,
            MessageTarget::Direct(conversation_id),
        );
        self.fan_out(
            room_key,
            author.id,
            RouterEvent::NewDirectMessage(message.clone()),
        )
        .await;

        Ok(message)
    }

    async fn author_of(&self, connection_id: ConnectionId) -> Result<Identity, HubError> {
        self.hub
            .lock()
            .await
            .identity_of(connection_id)
            .cloned()
            .ok_or(HubError::ConnectionNotFound(connection_id))
    }

    /// 送信者の入力中表示を止めてから、メッセージをルームへ配信する
    async fn fan_out(&self, room_key: RoomKey, author_id: UserId, event: RouterEvent) {
        let mut hub = self.hub.lock().await;
        let mut deliveries: Vec<_> = hub.stop_typing(room_key, author_id).into_iter().collect();
        deliveries.push(hub.room_delivery(&room_key, event));
        tracing::debug!(
            "Delivering message in {} to {} connections",
            room_key,
            hub.members_of(&room_key).len()
        );
        deliver(self.message_pusher.as_ref(), deliveries).await;
    }
}
