//! UseCase: チャンネル一覧・作成・履歴取得

use std::sync::Arc;

use crate::domain::{
    Channel, ChannelId, ChannelName, DEFAULT_HISTORY_LIMIT, HistoryMessage, MessageStore,
};

use super::error::QueryError;

/// 履歴取得で指定できる最大件数
pub const MAX_HISTORY_LIMIT: usize = 200;

pub(crate) fn history_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

/// チャンネル一覧取得のユースケース
pub struct ListChannelsUseCase {
    store: Arc<dyn MessageStore>,
}

impl ListChannelsUseCase {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> Result<Vec<Channel>, QueryError> {
        Ok(self.store.list_channels().await?)
    }
}

/// チャンネル作成のユースケース
pub struct CreateChannelUseCase {
    store: Arc<dyn MessageStore>,
}

impl CreateChannelUseCase {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, name: &str) -> Result<Channel, QueryError> {
        let name = ChannelName::new(name.to_string())?;
        let channel = self.store.create_channel(name).await?;
        tracing::info!("Channel '{}' created", channel.name.as_str());
        Ok(channel)
    }
}

/// チャンネル履歴取得のユースケース
pub struct GetChannelHistoryUseCase {
    store: Arc<dyn MessageStore>,
}

impl GetChannelHistoryUseCase {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// 直近 `limit` 件（既定 50 件）を古い順で返す
    pub async fn execute(
        &self,
        channel_id: ChannelId,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryMessage>, QueryError> {
        Ok(self
            .store
            .channel_history(channel_id, history_limit(limit))
            .await?)
    }
}
