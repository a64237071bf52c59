//! UseCase: 1 対 1 の会話スレッド
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - OpenConversationUseCase / GetConversationHistoryUseCase / ListConversationsUseCase
//!
//! ### なぜこのテストが必要か
//! - どちらから開始しても同じ会話スレッド（同じ DM ルーム）になることを保証
//! - 当事者以外は履歴を読めないことを確認
//! - 再接続したクライアントが自分の会話スレッド（と DM 送信に必要な ID）を取り直せることを確認

use std::sync::Arc;

use crate::domain::{
    Conversation, ConversationId, ConversationSummary, HistoryMessage, MessageStore, SharedHub,
    UserId,
};

use super::{channel::history_limit, error::QueryError};

/// 会話スレッドを開く（なければ作成する）ユースケース
pub struct OpenConversationUseCase {
    store: Arc<dyn MessageStore>,
}

impl OpenConversationUseCase {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        requester: UserId,
        other: UserId,
    ) -> Result<Conversation, QueryError> {
        if requester == other {
            return Err(QueryError::InvalidInput(
                "cannot open a conversation with yourself".to_string(),
            ));
        }
        Ok(self.store.open_conversation(requester, other).await?)
    }
}

/// 会話スレッドの履歴取得のユースケース
pub struct GetConversationHistoryUseCase {
    store: Arc<dyn MessageStore>,
}

impl GetConversationHistoryUseCase {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// 当事者のみ取得できる
    pub async fn execute(
        &self,
        requester: UserId,
        conversation_id: ConversationId,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryMessage>, QueryError> {
        let conversation = self.store.conversation(conversation_id).await?;
        if !conversation.involves(requester) {
            return Err(QueryError::Forbidden(format!(
                "user {} is not a participant of conversation {}",
                requester, conversation_id
            )));
        }
        Ok(self
            .store
            .conversation_history(conversation_id, history_limit(limit))
            .await?)
    }
}

/// 自分の会話スレッド一覧取得のユースケース
pub struct ListConversationsUseCase {
    store: Arc<dyn MessageStore>,
    hub: SharedHub,
}

impl ListConversationsUseCase {
    pub fn new(store: Arc<dyn MessageStore>, hub: SharedHub) -> Self {
        Self { store, hub }
    }

    /// 新しい順。相手の表示名は接続したことのある相手についてのみ埋まる。
    pub async fn execute(&self, requester: UserId) -> Result<Vec<ConversationSummary>, QueryError> {
        let conversations = self.store.list_conversations(requester).await?;

        let hub = self.hub.lock().await;
        Ok(conversations
            .into_iter()
            .filter_map(|conversation| {
                let other_id = conversation.other(requester)?;
                Some(ConversationSummary {
                    other_display_name: hub.display_name_of(other_id).cloned(),
                    other_id,
                    conversation,
                })
            })
            .collect())
    }
}
