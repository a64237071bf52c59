//! Typing Coordinator
//!
//! (room, identity) ごとに高々 1 件の「入力中」エントリを管理する。
//! エントリは期限付きで、期限切れタイマーはエントリが所有する。
//!
//! タイマーの発火と停止が競合しても、世代番号（generation）が一致しない
//! 発火は何もしない。

use std::collections::HashMap;

use tokio::{task::AbortHandle, time::Instant};

use crate::domain::{DisplayName, Identity, RoomKey, UserId};

/// 入力中エントリ
#[derive(Debug)]
pub struct TypingEntry {
    pub display_name: DisplayName,
    pub generation: u64,
    pub expires_at: Instant,
    timer: Option<AbortHandle>,
}

impl TypingEntry {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// `TypingCoordinator::start` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingStart {
    /// 新しいエントリを作成した（開始イベントを配信する）
    Started { generation: u64 },
    /// 既存エントリの期限を延長した（開始イベントは配信しない）
    Refreshed { generation: u64 },
}

impl TypingStart {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Started { generation } | Self::Refreshed { generation } => *generation,
        }
    }
}

#[derive(Debug, Default)]
pub struct TypingCoordinator {
    entries: HashMap<(RoomKey, UserId), TypingEntry>,
    next_generation: u64,
}

impl TypingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入力開始、または既存エントリの期限延長
    ///
    /// 延長時は既存のタイマーをキャンセルする。呼び出し側は返された世代番号で
    /// 新しいタイマーを `arm` すること。
    pub fn start(&mut self, room_key: RoomKey, identity: &Identity, expires_at: Instant) -> TypingStart {
        self.next_generation += 1;
        let generation = self.next_generation;

        match self.entries.get_mut(&(room_key, identity.id)) {
            Some(entry) => {
                entry.cancel_timer();
                entry.generation = generation;
                entry.expires_at = expires_at;
                TypingStart::Refreshed { generation }
            }
            None => {
                self.entries.insert(
                    (room_key, identity.id),
                    TypingEntry {
                        display_name: identity.display_name.clone(),
                        generation,
                        expires_at,
                        timer: None,
                    },
                );
                TypingStart::Started { generation }
            }
        }
    }

    /// 期限切れタイマーをエントリに紐付ける
    ///
    /// 世代が変わっていた場合（既に停止・延長済み）はタイマーをキャンセルして `false` を返す。
    pub fn arm(
        &mut self,
        room_key: RoomKey,
        user_id: UserId,
        generation: u64,
        timer: AbortHandle,
    ) -> bool {
        match self.entries.get_mut(&(room_key, user_id)) {
            Some(entry) if entry.generation == generation => {
                entry.cancel_timer();
                entry.timer = Some(timer);
                true
            }
            _ => {
                timer.abort();
                false
            }
        }
    }

    /// 明示的な停止。エントリがあればタイマーをキャンセルして取り除く。
    pub fn stop(&mut self, room_key: RoomKey, user_id: UserId) -> Option<TypingEntry> {
        let mut entry = self.entries.remove(&(room_key, user_id))?;
        entry.cancel_timer();
        Some(entry)
    }

    /// タイマー発火による停止
    ///
    /// 世代が一致する場合のみエントリを取り除く。発火済み・キャンセル済みの
    /// タイマーからの呼び出しは何もしない。
    pub fn expire(&mut self, room_key: RoomKey, user_id: UserId, generation: u64) -> Option<TypingEntry> {
        let current = self.entries.get(&(room_key, user_id))?.generation;
        if current != generation {
            return None;
        }
        // 発火中のタイマー自身なので abort しない
        let mut entry = self.entries.remove(&(room_key, user_id))?;
        entry.timer = None;
        Some(entry)
    }

    pub fn is_typing(&self, room_key: RoomKey, user_id: UserId) -> bool {
        self.entries.contains_key(&(room_key, user_id))
    }

    /// ルーム内で入力中の表示名（順不同）
    pub fn typists_in(&self, room_key: RoomKey) -> Vec<DisplayName> {
        self.entries
            .iter()
            .filter(|((room, _), _)| *room == room_key)
            .map(|(_, entry)| entry.display_name.clone())
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }
}
