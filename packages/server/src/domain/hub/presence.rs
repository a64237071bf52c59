//! Presence Tracker
//!
//! 少なくとも 1 本の接続を持つ Identity の集合を管理する。
//! 同じ Identity の複数接続（複数タブなど）は 1 件にまとめる。
//!
//! オフラインになった Identity も、最後の表示名とともにユーザー一覧用に覚えておく。

use std::collections::{BTreeMap, HashSet};

use crate::domain::{ConnectionId, DisplayName, Identity, KnownUser, UserId};

#[derive(Debug)]
struct PresenceEntry {
    display_name: DisplayName,
    connections: HashSet<ConnectionId>,
}

#[derive(Debug, Default)]
pub struct PresenceTracker {
    entries: BTreeMap<UserId, PresenceEntry>,
    known: BTreeMap<UserId, DisplayName>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続を `identity` の生存源として登録する
    ///
    /// Identity が新たにオンラインになった場合は `true` を返す。
    pub fn connect(&mut self, connection_id: ConnectionId, identity: &Identity) -> bool {
        let entry = self
            .entries
            .entry(identity.id)
            .or_insert_with(|| PresenceEntry {
                display_name: identity.display_name.clone(),
                connections: HashSet::new(),
            });
        let came_online = entry.connections.is_empty();
        // 後から来た接続の表示名を優先する
        entry.display_name = identity.display_name.clone();
        entry.connections.insert(connection_id);
        self.known
            .insert(identity.id, identity.display_name.clone());
        came_online
    }

    /// 接続を生存源から外す
    ///
    /// Identity の最後の接続が外れてオフラインになった場合は `true` を返す。
    pub fn disconnect(&mut self, connection_id: ConnectionId, user_id: UserId) -> bool {
        let Some(entry) = self.entries.get_mut(&user_id) else {
            return false;
        };
        if !entry.connections.remove(&connection_id) {
            return false;
        }
        if entry.connections.is_empty() {
            self.entries.remove(&user_id);
            return true;
        }
        false
    }

    /// オンラインの Identity 一覧（ユーザー ID 昇順、重複なし）
    pub fn online_identities(&self) -> Vec<Identity> {
        self.entries
            .iter()
            .map(|(id, entry)| Identity::new(*id, entry.display_name.clone()))
            .collect()
    }

    /// 一度でも接続した Identity の一覧（ユーザー ID 昇順）
    pub fn known_users(&self) -> Vec<KnownUser> {
        self.known
            .iter()
            .map(|(id, display_name)| KnownUser {
                identity: Identity::new(*id, display_name.clone()),
                online: self.is_online(*id),
            })
            .collect()
    }

    /// 最後に接続したときの表示名
    pub fn display_name_of(&self, user_id: UserId) -> Option<&DisplayName> {
        self.known.get(&user_id)
    }

    pub fn connection_count(&self, user_id: UserId) -> usize {
        self.entries
            .get(&user_id)
            .map_or(0, |entry| entry.connections.len())
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.entries.contains_key(&user_id)
    }
}
