//! UseCase: オンライン一覧・ユーザー一覧・ルーム状態の参照

use crate::domain::{Identity, KnownUser, RoomSnapshot, SharedHub};

/// オンライン一覧取得のユースケース
pub struct GetOnlineIdentitiesUseCase {
    hub: SharedHub,
}

impl GetOnlineIdentitiesUseCase {
    pub fn new(hub: SharedHub) -> Self {
        Self { hub }
    }

    pub async fn execute(&self) -> Vec<Identity> {
        self.hub.lock().await.online_identities()
    }
}

/// ユーザー一覧取得のユースケース
///
/// ルーターはユーザーの台帳を持たないため、起動後に接続したことのある
/// Identity をオンライン状態とともに返す。
pub struct ListUsersUseCase {
    hub: SharedHub,
}

impl ListUsersUseCase {
    pub fn new(hub: SharedHub) -> Self {
        Self { hub }
    }

    pub async fn execute(&self) -> Vec<KnownUser> {
        self.hub.lock().await.known_users()
    }
}

/// ルーム状態取得のユースケース（診断用）
pub struct GetRoomSnapshotUseCase {
    hub: SharedHub,
}

impl GetRoomSnapshotUseCase {
    pub fn new(hub: SharedHub) -> Self {
        Self { hub }
    }

    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        self.hub.lock().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChannelId, RoomKey},
        usecase::test_support::{connect, create_test_hub, create_test_pusher, identity},
    };

    #[tokio::test]
    async fn test_snapshot_lists_members_per_room() {
        // テスト項目: ルームごとのメンバーが取得できる
        // given (前提条件):
        let hub = create_test_hub();
        let pusher = create_test_pusher();
        let (alice, _rx1) = connect(&hub, &pusher, identity(1, "alice")).await;
        let (_bob, _rx2) = connect(&hub, &pusher, identity(2, "bob")).await;
        let room = RoomKey::channel(ChannelId::new(1).unwrap());
        hub.lock().await.join(alice, room).unwrap();

        // when (操作):
        let snapshot = GetRoomSnapshotUseCase::new(hub.clone()).execute().await;
        let online = GetOnlineIdentitiesUseCase::new(hub).execute().await;

        // then (期待する結果):
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].room_key, room);
        assert_eq!(snapshot[0].members, vec![(alice, identity(1, "alice"))]);
        assert_eq!(online.len(), 2);
    }

    #[tokio::test]
    async fn test_users_include_disconnected_identities() {
        // テスト項目: 切断したユーザーもオフラインとして一覧に残る
        // given (前提条件):
        let hub = create_test_hub();
        let pusher = create_test_pusher();
        let (alice, _rx1) = connect(&hub, &pusher, identity(1, "alice")).await;
        let (_bob, _rx2) = connect(&hub, &pusher, identity(2, "bob")).await;
        hub.lock().await.unregister(alice);

        // when (操作):
        let users = ListUsersUseCase::new(hub).execute().await;

        // then (期待する結果):
        let listed: Vec<(i64, bool)> = users
            .iter()
            .map(|user| (user.identity.id.value(), user.online))
            .collect();
        assert_eq!(listed, vec![(1, false), (2, true)]);
    }
}
