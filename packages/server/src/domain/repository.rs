//! Repository trait 定義
//!
//! ルーターが永続化層（Persistence Gateway）に求めるインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    Channel, ChannelId, ChannelName, Conversation, ConversationId, HistoryMessage, Identity,
    MessageContent, StoreError, StoredMessage, UserId,
};

/// 履歴取得のデフォルト件数
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Message Store trait（Persistence Gateway）
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
///
/// 追記系のメソッドは I/O で待たされる可能性がある。
/// 呼び出し側はルーターの共有状態のロックを保持したまま呼び出してはならない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// チャンネルにメッセージを追記
    async fn append_channel_message(
        &self,
        content: &MessageContent,
        author: &Identity,
        channel_id: ChannelId,
    ) -> Result<StoredMessage, StoreError>;

    /// 会話スレッドに DM を追記
    async fn append_direct_message(
        &self,
        content: &MessageContent,
        author: &Identity,
        conversation_id: ConversationId,
    ) -> Result<StoredMessage, StoreError>;

    /// 会話スレッドを ID で解決
    async fn conversation(&self, conversation_id: ConversationId)
    -> Result<Conversation, StoreError>;

    /// 2 人の会話スレッドを取得（なければ作成）
    async fn open_conversation(&self, a: UserId, b: UserId) -> Result<Conversation, StoreError>;

    /// `user_id` が参加している会話スレッドの一覧（新しい順）
    async fn list_conversations(&self, user_id: UserId) -> Result<Vec<Conversation>, StoreError>;

    /// チャンネル一覧（ID 昇順）
    async fn list_channels(&self) -> Result<Vec<Channel>, StoreError>;

    /// チャンネルを作成
    async fn create_channel(&self, name: ChannelName) -> Result<Channel, StoreError>;

    /// チャンネルの直近 `limit` 件の履歴（古い順）
    async fn channel_history(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<HistoryMessage>, StoreError>;

    /// 会話スレッドの直近 `limit` 件の履歴（古い順）
    async fn conversation_history(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<HistoryMessage>, StoreError>;
}
