//! Room Registry
//!
//! ルーム → 接続の逆引きインデックス。
//! 接続 → ルームの向きは `Connection::current_room` が保持する。

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{Connection, ConnectionId, HubError, RoomKey};

#[derive(Debug, Default)]
pub struct RoomRegistry {
    members: HashMap<RoomKey, HashSet<ConnectionId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続を `room_key` に参加させる
    ///
    /// 既に別のルームにいる場合はそのルームから抜けてから参加する。
    /// 既に同じルームにいる場合は何もしない。
    ///
    /// # Returns
    ///
    /// * `Ok(Some(previous))` - ルームを切り替えた（直前のルーム）
    /// * `Ok(None)` - 初めての参加、または同じルームへの再参加
    /// * `Err(HubError::RoomStateCorruption)` - `current_room` と逆引きが食い違っている
    pub fn join(
        &mut self,
        connection: &mut Connection,
        room_key: RoomKey,
    ) -> Result<Option<RoomKey>, HubError> {
        if let Some(current) = connection.current_room {
            self.ensure_member(connection.id, current)?;
            if current == room_key {
                return Ok(None);
            }
        }

        let previous = connection.current_room.take();
        if let Some(previous) = previous {
            self.remove_member(connection.id, previous);
        }
        self.members
            .entry(room_key)
            .or_default()
            .insert(connection.id);
        connection.current_room = Some(room_key);

        Ok(previous)
    }

    /// 接続を現在のルームから外す（どこにもいなければ何もしない）
    pub fn leave(&mut self, connection: &mut Connection) -> Option<RoomKey> {
        let room_key = connection.current_room.take()?;
        self.remove_member(connection.id, room_key);
        Some(room_key)
    }

    /// ルームにいる接続の一覧
    ///
    /// 存在しないルームと空のルームは区別しない（どちらも空）。
    pub fn members_of(&self, room_key: &RoomKey) -> Vec<ConnectionId> {
        self.members
            .get(room_key)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// 接続を含むルームの数（不変条件の検査用）
    pub fn rooms_containing(&self, connection_id: ConnectionId) -> usize {
        self.members
            .values()
            .filter(|members| members.contains(&connection_id))
            .count()
    }

    pub fn room_count(&self) -> usize {
        self.members.len()
    }

    pub fn snapshot(&self) -> BTreeMap<RoomKey, Vec<ConnectionId>> {
        self.members
            .iter()
            .map(|(room_key, members)| {
                let mut members: Vec<ConnectionId> = members.iter().copied().collect();
                members.sort();
                (*room_key, members)
            })
            .collect()
    }

    fn ensure_member(&self, connection_id: ConnectionId, room_key: RoomKey) -> Result<(), HubError> {
        let present = self
            .members
            .get(&room_key)
            .is_some_and(|members| members.contains(&connection_id));
        if present {
            Ok(())
        } else {
            Err(HubError::RoomStateCorruption {
                connection: connection_id,
                room: room_key,
            })
        }
    }

    fn remove_member(&mut self, connection_id: ConnectionId, room_key: RoomKey) {
        if let Some(members) = self.members.get_mut(&room_key) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.members.remove(&room_key);
            }
        }
    }
}
