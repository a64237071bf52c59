//! ChatHub: ルーターの共有状態
//!
//! Room Registry / Presence Tracker / Typing Coordinator と接続表をまとめて保持する。
//! すべての変更操作は `ChatHub` のメソッドを通して行い、呼び出し側は
//! 単一のロック（`SharedHub`）の下でこれを呼ぶ。
//!
//! 変更操作は、その結果として配信すべきイベントを `Delivery` として返す。
//! I/O は行わない。

mod presence;
mod room_registry;
mod typing;

use std::{collections::HashMap, sync::Arc};

use tokio::{sync::Mutex, task::AbortHandle, time::Instant};

pub use presence::PresenceTracker;
pub use room_registry::RoomRegistry;
pub use typing::{TypingCoordinator, TypingEntry, TypingStart};

use super::{
    Connection, ConnectionId, Delivery, DisplayName, HubError, Identity, KnownUser, RoomKey,
    RouterEvent, UserId,
};

/// ルーター全体で共有する ChatHub
pub type SharedHub = Arc<Mutex<ChatHub>>;

/// 入力開始の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypingOutcome {
    /// 新規に入力中になった。`delivery` を配信する。
    Started { generation: u64, delivery: Delivery },
    /// 既に入力中だった。期限のみ延長。
    Refreshed { generation: u64 },
}

impl TypingOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Started { generation, .. } | Self::Refreshed { generation } => *generation,
        }
    }
}

/// ルームのメンバー一覧（診断用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_key: RoomKey,
    pub members: Vec<(ConnectionId, Identity)>,
    pub typing: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ChatHub {
    connections: HashMap<ConnectionId, Connection>,
    rooms: RoomRegistry,
    presence: PresenceTracker,
    typing: TypingCoordinator,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedHub {
        Arc::new(Mutex::new(Self::new()))
    }

    // ========================================
    // 接続のライフサイクル
    // ========================================

    /// 認証済みの接続を登録し、オンライン一覧の再配信を返す
    pub fn register(&mut self, connection: Connection) -> Result<Delivery, HubError> {
        if self.connections.contains_key(&connection.id) {
            return Err(HubError::DuplicateConnection(connection.id));
        }
        self.presence.connect(connection.id, &connection.identity);
        self.connections.insert(connection.id, connection);
        Ok(self.presence_delivery())
    }

    /// 接続を取り除き、ルーム・プレゼンス・入力中状態を一括で撤回する
    ///
    /// 既に取り除かれていた場合は `None`（撤回は接続ごとに 1 回だけ行われる）。
    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<Vec<Delivery>> {
        let mut connection = self.connections.remove(&connection_id)?;
        let mut deliveries = Vec::new();

        if let Some(room_key) = self.rooms.leave(&mut connection) {
            if let Some(delivery) = self.retract_typing(room_key, connection.identity.id) {
                deliveries.push(delivery);
            }
        }
        self.presence.disconnect(connection.id, connection.identity.id);
        deliveries.push(self.presence_delivery());

        Some(deliveries)
    }

    // ========================================
    // ルーム
    // ========================================

    /// 接続をルームに参加させる
    ///
    /// ルームを切り替えた場合、直前のルームにこの Identity の接続が残っていなければ
    /// 入力中状態を停止する。
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        room_key: RoomKey,
    ) -> Result<Vec<Delivery>, HubError> {
        let connection = self
            .connections
            .get_mut(&connection_id)
            .ok_or(HubError::ConnectionNotFound(connection_id))?;
        let user_id = connection.identity.id;
        let previous = self.rooms.join(connection, room_key)?;

        Ok(previous
            .and_then(|previous| self.retract_typing(previous, user_id))
            .into_iter()
            .collect())
    }

    /// 接続を現在のルームから外す
    pub fn leave(&mut self, connection_id: ConnectionId) -> Result<Vec<Delivery>, HubError> {
        let connection = self
            .connections
            .get_mut(&connection_id)
            .ok_or(HubError::ConnectionNotFound(connection_id))?;
        let user_id = connection.identity.id;
        let left = self.rooms.leave(connection);

        Ok(left
            .and_then(|room_key| self.retract_typing(room_key, user_id))
            .into_iter()
            .collect())
    }

    /// ルームの全メンバーへの配信
    pub fn room_delivery(&self, room_key: &RoomKey, event: RouterEvent) -> Delivery {
        Delivery::new(self.rooms.members_of(room_key), event)
    }

    // ========================================
    // 入力中
    // ========================================

    /// 入力開始（または期限延長）
    pub fn start_typing(
        &mut self,
        connection_id: ConnectionId,
        room_key: RoomKey,
        expires_at: Instant,
    ) -> Result<TypingOutcome, HubError> {
        let identity = self
            .connections
            .get(&connection_id)
            .map(|connection| connection.identity.clone())
            .ok_or(HubError::ConnectionNotFound(connection_id))?;

        match self.typing.start(room_key, &identity, expires_at) {
            TypingStart::Started { generation } => {
                let delivery = Delivery::new(
                    self.others_in(&room_key, identity.id),
                    RouterEvent::TypingStarted {
                        room_key,
                        display_name: identity.display_name,
                    },
                );
                Ok(TypingOutcome::Started {
                    generation,
                    delivery,
                })
            }
            TypingStart::Refreshed { generation } => Ok(TypingOutcome::Refreshed { generation }),
        }
    }

    /// 期限切れタイマーを紐付ける
    pub fn arm_typing_timer(
        &mut self,
        room_key: RoomKey,
        user_id: UserId,
        generation: u64,
        timer: AbortHandle,
    ) -> bool {
        self.typing.arm(room_key, user_id, generation, timer)
    }

    /// 入力停止。エントリがあった場合のみ停止イベントを返す。
    pub fn stop_typing(&mut self, room_key: RoomKey, user_id: UserId) -> Option<Delivery> {
        let entry = self.typing.stop(room_key, user_id)?;
        Some(self.typing_stopped(room_key, user_id, entry))
    }

    /// タイマー発火による停止。世代が古ければ何もしない。
    pub fn expire_typing(
        &mut self,
        room_key: RoomKey,
        user_id: UserId,
        generation: u64,
    ) -> Option<Delivery> {
        let entry = self.typing.expire(room_key, user_id, generation)?;
        Some(self.typing_stopped(room_key, user_id, entry))
    }

    pub fn is_typing(&self, room_key: RoomKey, user_id: UserId) -> bool {
        self.typing.is_typing(room_key, user_id)
    }

    // ========================================
    // 参照
    // ========================================

    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    pub fn identity_of(&self, connection_id: ConnectionId) -> Option<&Identity> {
        self.connections
            .get(&connection_id)
            .map(|connection| &connection.identity)
    }

    pub fn room_of(&self, connection_id: ConnectionId) -> Option<RoomKey> {
        self.connections
            .get(&connection_id)
            .and_then(|connection| connection.current_room)
    }

    pub fn members_of(&self, room_key: &RoomKey) -> Vec<ConnectionId> {
        self.rooms.members_of(room_key)
    }

    pub fn rooms_containing(&self, connection_id: ConnectionId) -> usize {
        self.rooms.rooms_containing(connection_id)
    }

    pub fn online_identities(&self) -> Vec<Identity> {
        self.presence.online_identities()
    }

    pub fn known_users(&self) -> Vec<KnownUser> {
        self.presence.known_users()
    }

    pub fn display_name_of(&self, user_id: UserId) -> Option<&DisplayName> {
        self.presence.display_name_of(user_id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn snapshot(&self) -> Vec<RoomSnapshot> {
        self.rooms
            .snapshot()
            .into_iter()
            .map(|(room_key, members)| RoomSnapshot {
                room_key,
                members: members
                    .into_iter()
                    .filter_map(|id| self.identity_of(id).map(|identity| (id, identity.clone())))
                    .collect(),
                typing: self
                    .typing
                    .typists_in(room_key)
                    .into_iter()
                    .map(|name| name.into_string())
                    .collect(),
            })
            .collect()
    }

    fn presence_delivery(&self) -> Delivery {
        Delivery::new(
            self.connection_ids(),
            RouterEvent::OnlineIdentities(self.presence.online_identities()),
        )
    }

    /// ルーム内の、指定した Identity 以外の接続
    fn others_in(&self, room_key: &RoomKey, user_id: UserId) -> Vec<ConnectionId> {
        self.rooms
            .members_of(room_key)
            .into_iter()
            .filter(|id| {
                self.connections
                    .get(id)
                    .is_some_and(|connection| connection.identity.id != user_id)
            })
            .collect()
    }

    /// 接続がルームを離れたときの入力中状態の撤回
    ///
    /// 同じ Identity の別の接続がまだルームにいる場合は何もしない。
    fn retract_typing(&mut self, room_key: RoomKey, user_id: UserId) -> Option<Delivery> {
        if self.identity_in_room(&room_key, user_id) {
            return None;
        }
        self.stop_typing(room_key, user_id)
    }

    fn identity_in_room(&self, room_key: &RoomKey, user_id: UserId) -> bool {
        self.rooms.members_of(room_key).into_iter().any(|id| {
            self.connections
                .get(&id)
                .is_some_and(|connection| connection.identity.id == user_id)
        })
    }

    fn typing_stopped(&self, room_key: RoomKey, user_id: UserId, entry: TypingEntry) -> Delivery {
        Delivery::new(
            self.others_in(&room_key, user_id),
            RouterEvent::TypingStopped {
                room_key,
                display_name: entry.display_name,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChannelId, DisplayName, Timestamp};
    use std::time::Duration;

    fn identity(id: i64, name: &str) -> Identity {
        Identity::new(
            UserId::new(id).unwrap(),
            DisplayName::new(name.to_string()).unwrap(),
        )
    }

    fn connect(hub: &mut ChatHub, identity: &Identity) -> ConnectionId {
        let id = ConnectionId::generate();
        hub.register(Connection::new(id, identity.clone(), Timestamp::new(0)))
            .unwrap();
        id
    }

    fn channel(id: i64) -> RoomKey {
        RoomKey::channel(ChannelId::new(id).unwrap())
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_secs(2)
    }

    #[test]
    fn test_register_publishes_presence_to_everyone() {
        // テスト項目: 接続のたびに全接続へオンライン一覧が配信される
        // given (前提条件):
        let mut hub = ChatHub::new();
        let alice = identity(1, "alice");
        let bob = identity(2, "bob");
        let alice_conn = connect(&mut hub, &alice);

        // when (操作):
        let bob_conn = ConnectionId::generate();
        let delivery = hub
            .register(Connection::new(bob_conn, bob.clone(), Timestamp::new(0)))
            .unwrap();

        // then (期待する結果):
        assert_eq!(delivery.targets.len(), 2);
        assert!(delivery.targets.contains(&alice_conn));
        assert!(delivery.targets.contains(&bob_conn));
        assert_eq!(delivery.event, RouterEvent::OnlineIdentities(vec![alice, bob]));
    }

    #[test]
    fn test_register_rejects_duplicate_connection_id() {
        // テスト項目: 同じ接続 ID の二重登録はエラーになる
        // given (前提条件):
        let mut hub = ChatHub::new();
        let alice = identity(1, "alice");
        let id = connect(&mut hub, &alice);

        // when (操作):
        let result = hub.register(Connection::new(id, alice, Timestamp::new(0)));

        // then (期待する結果):
        assert_eq!(result, Err(HubError::DuplicateConnection(id)));
    }

    #[test]
    fn test_unregister_runs_once() {
        // テスト項目: 切断時の撤回は 1 回だけ行われる
        // given (前提条件):
        let mut hub = ChatHub::new();
        let alice = identity(1, "alice");
        let id = connect(&mut hub, &alice);
        hub.join(id, channel(1)).unwrap();

        // when (操作):
        let first = hub.unregister(id);
        let second = hub.unregister(id);

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(hub.members_of(&channel(1)).is_empty());
        assert!(hub.online_identities().is_empty());
    }

    #[test]
    fn test_two_tabs_are_reported_once() {
        // テスト項目: 同じ Identity の 2 接続はオンライン一覧に 1 回だけ現れる
        // given (前提条件):
        let mut hub = ChatHub::new();
        let alice = identity(1, "alice");
        let tab1 = connect(&mut hub, &alice);
        let tab2 = connect(&mut hub, &alice);

        // when (操作) / then (期待する結果):
        assert_eq!(hub.online_identities(), vec![alice.clone()]);

        hub.unregister(tab1);
        assert_eq!(hub.online_identities(), vec![alice]);

        hub.unregister(tab2);
        assert!(hub.online_identities().is_empty());
    }

    #[test]
    fn test_typing_start_excludes_sender_identity() {
        // テスト項目: 入力開始イベントは送信者の Identity 以外のメンバーに配信される
        // given (前提条件):
        let mut hub = ChatHub::new();
        let alice = identity(1, "alice");
        let bob = identity(2, "bob");
        let alice_tab1 = connect(&mut hub, &alice);
        let alice_tab2 = connect(&mut hub, &alice);
        let bob_conn = connect(&mut hub, &bob);
        for id in [alice_tab1, alice_tab2, bob_conn] {
            hub.join(id, channel(1)).unwrap();
        }

        // when (操作):
        let outcome = hub.start_typing(alice_tab1, channel(1), soon()).unwrap();

        // then (期待する結果):
        match outcome {
            TypingOutcome::Started { delivery, .. } => {
                assert_eq!(delivery.targets, vec![bob_conn]);
                assert_eq!(
                    delivery.event,
                    RouterEvent::TypingStarted {
                        room_key: channel(1),
                        display_name: alice.display_name,
                    }
                );
            }
            other => panic!("expected Started, got {other:?}"),
        }
    }

    #[test]
    fn test_switching_room_stops_typing_in_previous_room() {
        // テスト項目: ルームを切り替えると元のルームの入力中状態が停止される
        // given (前提条件):
        let mut hub = ChatHub::new();
        let alice = identity(1, "alice");
        let bob = identity(2, "bob");
        let alice_conn = connect(&mut hub, &alice);
        let bob_conn = connect(&mut hub, &bob);
        hub.join(alice_conn, channel(1)).unwrap();
        hub.join(bob_conn, channel(1)).unwrap();
        hub.start_typing(alice_conn, channel(1), soon()).unwrap();

        // when (操作):
        let deliveries = hub.join(alice_conn, channel(2)).unwrap();

        // then (期待する結果):
        assert_eq!(
            deliveries,
            vec![Delivery::new(
                vec![bob_conn],
                RouterEvent::TypingStopped {
                    room_key: channel(1),
                    display_name: alice.display_name,
                },
            )]
        );
        assert!(!hub.is_typing(channel(1), alice.id));
    }

    #[test]
    fn test_unregister_stops_typing_for_remaining_members() {
        // テスト項目: 入力中に切断すると残りのメンバーに停止イベントが 1 回配信される
        // given (前提条件):
        let mut hub = ChatHub::new();
        let alice = identity(1, "alice");
        let bob = identity(2, "bob");
        let alice_conn = connect(&mut hub, &alice);
        let bob_conn = connect(&mut hub, &bob);
        hub.join(alice_conn, channel(1)).unwrap();
        hub.join(bob_conn, channel(1)).unwrap();
        hub.start_typing(alice_conn, channel(1), soon()).unwrap();

        // when (操作):
        let deliveries = hub.unregister(alice_conn).unwrap();

        // then (期待する結果):
        let stops: Vec<&Delivery> = deliveries
            .iter()
            .filter(|d| matches!(d.event, RouterEvent::TypingStopped { .. }))
            .collect();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].targets, vec![bob_conn]);
        // プレゼンスは残りの接続に再配信される
        let presence = deliveries.last().unwrap();
        assert_eq!(presence.targets, vec![bob_conn]);
        assert_eq!(presence.event, RouterEvent::OnlineIdentities(vec![bob]));
    }

    #[test]
    fn test_typing_survives_while_another_tab_stays_in_room() {
        // テスト項目: 同じ Identity の別タブがルームに残っている間は入力中状態を撤回しない
        // given (前提条件):
        let mut hub = ChatHub::new();
        let alice = identity(1, "alice");
        let bob = identity(2, "bob");
        let alice_tab1 = connect(&mut hub, &alice);
        let alice_tab2 = connect(&mut hub, &alice);
        let bob_conn = connect(&mut hub, &bob);
        for id in [alice_tab1, alice_tab2, bob_conn] {
            hub.join(id, channel(1)).unwrap();
        }
        hub.start_typing(alice_tab1, channel(1), soon()).unwrap();

        // when (操作): 2 つ目のタブが別ルームへ移動し、その後閉じられる
        let on_switch = hub.join(alice_tab2, channel(2)).unwrap();
        let on_close = hub.unregister(alice_tab2).unwrap();

        // then (期待する結果):
        assert!(on_switch.is_empty());
        assert!(
            !on_close
                .iter()
                .any(|d| matches!(d.event, RouterEvent::TypingStopped { .. }))
        );
        assert!(hub.is_typing(channel(1), alice.id));

        // when (操作): 最後のタブがルームを離れる
        let on_leave = hub.leave(alice_tab1).unwrap();

        // then (期待する結果):
        assert_eq!(
            on_leave,
            vec![Delivery::new(
                vec![bob_conn],
                RouterEvent::TypingStopped {
                    room_key: channel(1),
                    display_name: alice.display_name,
                },
            )]
        );
        assert!(!hub.is_typing(channel(1), alice.id));
    }

    #[test]
    fn test_room_delivery_includes_sender() {
        // テスト項目: ルーム宛ての配信には送信者自身の接続も含まれる
        // given (前提条件):
        let mut hub = ChatHub::new();
        let alice = identity(1, "alice");
        let alice_conn = connect(&mut hub, &alice);
        hub.join(alice_conn, channel(1)).unwrap();

        // when (操作):
        let delivery = hub.room_delivery(
            &channel(1),
            RouterEvent::OperationError {
                message: "x".to_string(),
            },
        );

        // then (期待する結果):
        assert_eq!(delivery.targets, vec![alice_conn]);
    }

    #[test]
    fn test_join_unknown_connection_fails() {
        // テスト項目: 未登録の接続は参加できない
        // given (前提条件):
        let mut hub = ChatHub::new();
        let ghost = ConnectionId::generate();

        // when (操作):
        let result = hub.join(ghost, channel(1));

        // then (期待する結果):
        assert_eq!(result, Err(HubError::ConnectionNotFound(ghost)));
    }
}
