//! ルームごとの送信順序制御
//!
//! 同じルームへの送信は「永続化 → 配信」を 1 単位として直列に実行する。
//! これにより、ルームのメンバーが受け取る順序は永続化された順序と一致する。
//! 異なるルーム同士は並行に進む。

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::RoomKey;

/// 送信中のルームが保持する順番待ちのロック
pub type RoomTurn = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct RoomSequencer {
    turns: Mutex<HashMap<RoomKey, Arc<Mutex<()>>>>,
}

impl RoomSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// ルームの順番を取得する。返り値を drop するまで同じルームの送信は待たされる。
    pub async fn acquire(&self, room_key: RoomKey) -> RoomTurn {
        let turn = {
            let mut turns = self.turns.lock().await;
            // 誰も保持・待機していないエントリは捨てる
            turns.retain(|_, turn| Arc::strong_count(turn) > 1);
            turns.entry(room_key).or_default().clone()
        };
        turn.lock_owned().await
    }

    /// 使用中（保持または待機中）のルーム数
    pub async fn active_rooms(&self) -> usize {
        self.turns
            .lock()
            .await
            .values()
            .filter(|turn| Arc::strong_count(turn) > 1)
            .count()
    }
}
