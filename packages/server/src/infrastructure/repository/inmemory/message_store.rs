//! InMemory Message Store 実装
//!
//! ドメイン層が定義する MessageStore trait の具体的な実装。
//! チャンネル・会話・メッセージを HashMap / BTreeMap に保持します。
//!
//! ID はテーブルごとに 1 から単調増加で払い出します。

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use irori_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    Channel, ChannelId, ChannelName, Conversation, ConversationId, HistoryMessage, Identity,
    MessageContent, MessageId, MessageStore, StoreError, StoredMessage, Timestamp, UserId,
};

#[derive(Debug, Default)]
struct StoreState {
    channels: BTreeMap<ChannelId, Channel>,
    conversations: BTreeMap<ConversationId, Conversation>,
    channel_messages: HashMap<ChannelId, Vec<HistoryMessage>>,
    direct_messages: HashMap<ConversationId, Vec<HistoryMessage>>,
    last_channel_id: i64,
    last_conversation_id: i64,
    last_message_id: i64,
    last_direct_message_id: i64,
}

impl StoreState {
    fn insert_channel(&mut self, name: ChannelName, now: Timestamp) -> Result<Channel, StoreError> {
        if self.channels.values().any(|channel| channel.name == name) {
            return Err(StoreError::Conflict(format!("channel '{}'", name.as_str())));
        }
        let id = ChannelId::new(next_id(&mut self.last_channel_id)).map_err(unavailable)?;
        let channel = Channel {
            id,
            name,
            created_at: now,
        };
        self.channels.insert(id, channel.clone());
        Ok(channel)
    }
}

fn next_id(last: &mut i64) -> i64 {
    *last += 1;
    *last
}

fn unavailable(e: impl std::fmt::Display) -> StoreError {
    StoreError::StorageUnavailable(e.to_string())
}

/// 古い順に並んだ履歴から直近 `limit` 件を返す
fn tail(messages: Option<&Vec<HistoryMessage>>, limit: usize) -> Vec<HistoryMessage> {
    let messages = messages.map(Vec::as_slice).unwrap_or_default();
    let start = messages.len().saturating_sub(limit);
    messages[start..].to_vec()
}

/// インメモリ Message Store 実装
pub struct InMemoryMessageStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    /// 指定したチャンネルを作成済みの状態で生成する（重複した名前は無視）
    pub fn with_channels(clock: Arc<dyn Clock>, names: Vec<ChannelName>) -> Self {
        let mut state = StoreState::default();
        let now = Timestamp::new(clock.now_millis());
        for name in names {
            if let Err(e) = state.insert_channel(name, now) {
                tracing::warn!("Skipping seed channel: {}", e);
            }
        }
        Self {
            state: Mutex::new(state),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append_channel_message(
        &self,
        content: &MessageContent,
        author: &Identity,
        channel_id: ChannelId,
    ) -> Result<StoredMessage, StoreError> {
        let mut state = self.state.lock().await;
        if !state.channels.contains_key(&channel_id) {
            return Err(StoreError::NotFound(format!("channel {}", channel_id)));
        }

        // ID と時刻はロック内で払い出し、両者の順序を一致させる
        let id = MessageId::new(next_id(&mut state.last_message_id)).map_err(unavailable)?;
        let now = self.now();
        state
            .channel_messages
            .entry(channel_id)
            .or_default()
            .push(HistoryMessage {
                id,
                content: content.clone(),
                author_id: author.id,
                author_display_name: author.display_name.clone(),
                created_at: now,
            });

        Ok(StoredMessage { id, created_at: now })
    }

    async fn append_direct_message(
        &self,
        content: &MessageContent,
        author: &Identity,
        conversation_id: ConversationId,
    ) -> Result<StoredMessage, StoreError> {
        let mut state = self.state.lock().await;
        if !state.conversations.contains_key(&conversation_id) {
            return Err(StoreError::NotFound(format!(
                "conversation {}",
                conversation_id
            )));
        }

        let id = MessageId::new(next_id(&mut state.last_direct_message_id)).map_err(unavailable)?;
        let now = self.now();
        state
            .direct_messages
            .entry(conversation_id)
            .or_default()
            .push(HistoryMessage {
                id,
                content: content.clone(),
                author_id: author.id,
                author_display_name: author.display_name.clone(),
                created_at: now,
            });

        Ok(StoredMessage { id, created_at: now })
    }

    async fn conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Conversation, StoreError> {
        let state = self.state.lock().await;
        state
            .conversations
            .get(&conversation_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", conversation_id)))
    }

    async fn open_conversation(&self, a: UserId, b: UserId) -> Result<Conversation, StoreError> {
        let (low, high) = (a.min(b), a.max(b));
        let mut state = self.state.lock().await;

        if let Some(existing) = state
            .conversations
            .values()
            .find(|conversation| conversation.low == low && conversation.high == high)
        {
            return Ok(existing.clone());
        }

        let id = ConversationId::new(next_id(&mut state.last_conversation_id)).map_err(unavailable)?;
        let conversation = Conversation {
            id,
            low,
            high,
            created_at: self.now(),
        };
        state.conversations.insert(id, conversation.clone());
        Ok(conversation)
    }

    async fn list_conversations(&self, user_id: UserId) -> Result<Vec<Conversation>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .conversations
            .values()
            .rev()
            .filter(|conversation| conversation.involves(user_id))
            .cloned()
            .collect())
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.channels.values().cloned().collect())
    }

    async fn create_channel(&self, name: ChannelName) -> Result<Channel, StoreError> {
        let mut state = self.state.lock().await;
        let now = self.now();
        state.insert_channel(name, now)
    }

    async fn channel_history(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<HistoryMessage>, StoreError> {
        let state = self.state.lock().await;
        if !state.channels.contains_key(&channel_id) {
            return Err(StoreError::NotFound(format!("channel {}", channel_id)));
        }
        Ok(tail(state.channel_messages.get(&channel_id), limit))
    }

    async fn conversation_history(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<HistoryMessage>, StoreError> {
        let state = self.state.lock().await;
        if !state.conversations.contains_key(&conversation_id) {
            return Err(StoreError::NotFound(format!(
                "conversation {}",
                conversation_id
            )));
        }
        Ok(tail(state.direct_messages.get(&conversation_id), limit))
    }
}
