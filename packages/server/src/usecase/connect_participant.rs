//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::authenticate() / execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 認証に失敗した接続は共有状態に一切登録されないことを保証
//! - 接続のたびにオンライン一覧が全接続へ再配信されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続とオンライン一覧の配信
//! - 異常系：資格情報なし・不正な資格情報
//! - エッジケース：同一 Identity の 2 接続目（オンライン一覧では 1 人）

use std::sync::Arc;

use irori_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionId, Identity, IdentityVerifier, MessagePusher, PusherChannel,
    SharedHub, Timestamp,
};

use super::{deliver, error::ConnectError};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    hub: SharedHub,
    /// IdentityVerifier（認証の抽象化）
    verifier: Arc<dyn IdentityVerifier>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        hub: SharedHub,
        verifier: Arc<dyn IdentityVerifier>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            hub,
            verifier,
            message_pusher,
            clock,
        }
    }

    /// 資格情報を検証する
    ///
    /// 共有状態には触れない。接続のアップグレード前に呼び出す。
    pub fn authenticate(&self, credential: Option<&str>) -> Result<Identity, ConnectError> {
        Ok(self.verifier.verify(credential)?)
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `identity` - 認証済みの Identity
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 接続成功（払い出した接続 ID を返す）
    /// * `Err(ConnectError)` - 接続失敗
    pub async fn execute(
        &self,
        identity: Identity,
        sender: PusherChannel,
    ) -> Result<ConnectionId, ConnectError> {
        let connection_id = ConnectionId::generate();
        let connected_at = Timestamp::new(self.clock.now_millis());

        // 1. MessagePusher に送信キューを登録（オンライン一覧を本人にも届けるため先に行う）
        self.message_pusher
            .register_client(connection_id, sender)
            .await;

        // 2. ChatHub に接続を登録し、オンライン一覧を全接続へ配信
        let mut hub = self.hub.lock().await;
        let connection = Connection::new(connection_id, identity, connected_at);
        match hub.register(connection) {
            Ok(delivery) => {
                deliver(self.message_pusher.as_ref(), vec![delivery]).await;
                tracing::info!(
                    "Connection {} registered ({} connections)",
                    connection_id,
                    hub.connection_count()
                );
                Ok(connection_id)
            }
            Err(e) => {
                drop(hub);
                self.message_pusher.unregister_client(&connection_id).await;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::AuthError,
        infrastructure::identity::JwtIdentityVerifier,
        usecase::test_support::{create_test_hub, create_test_pusher, frames_of, identity},
    };
    use irori_shared::time::FixedClock;
    use std::time::Duration;
    use tokio::sync::mpsc;

    const SECRET: &str = "test-secret";

    fn create_usecase(hub: SharedHub, pusher: Arc<dyn MessagePusher>) -> ConnectParticipantUseCase {
        ConnectParticipantUseCase::new(
            hub,
            Arc::new(JwtIdentityVerifier::new(SECRET)),
            pusher,
            Arc::new(FixedClock::new(1672498800000)),
        )
    }

    #[tokio::test]
    async fn test_authenticate_returns_verified_identity() {
        // テスト項目: 検証済みの Identity が返される
        // given (前提条件):
        let usecase = create_usecase(create_test_hub(), create_test_pusher());
        let token = JwtIdentityVerifier::new(SECRET)
            .issue(&identity(1, "alice"), Duration::from_secs(60))
            .unwrap();

        // when (操作):
        let result = usecase.authenticate(Some(&token));

        // then (期待する結果):
        assert_eq!(result, Ok(identity(1, "alice")));
    }

    #[tokio::test]
    async fn test_authenticate_failure_registers_nothing() {
        // テスト項目: 認証失敗時は接続が登録されない
        // given (前提条件):
        let hub = create_test_hub();
        let usecase = create_usecase(hub.clone(), create_test_pusher());

        // when (操作):
        let missing = usecase.authenticate(None);
        let invalid = usecase.authenticate(Some("not-a-token"));

        // then (期待する結果):
        assert_eq!(missing, Err(ConnectError::Auth(AuthError::Unauthenticated)));
        assert!(matches!(
            invalid,
            Err(ConnectError::Auth(AuthError::InvalidCredential(_)))
        ));
        assert_eq!(hub.lock().await.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_execute_broadcasts_online_identities_to_everyone() {
        // テスト項目: 接続時にオンライン一覧が全接続（本人を含む）へ配信される
        // given (前提条件):
        let hub = create_test_hub();
        let pusher = create_test_pusher();
        let usecase = create_usecase(hub.clone(), pusher.clone());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        usecase.execute(identity(1, "alice"), tx1).await.unwrap();
        frames_of(&mut rx1, "online-identities");

        // when (操作):
        usecase.execute(identity(2, "bob"), tx2).await.unwrap();

        // then (期待する結果):
        let to_alice = frames_of(&mut rx1, "online-identities");
        let to_bob = frames_of(&mut rx2, "online-identities");
        assert_eq!(to_alice.len(), 1);
        assert_eq!(to_bob.len(), 1);
        assert_eq!(to_bob[0]["identities"].as_array().unwrap().len(), 2);
        assert_eq!(pusher.client_count().await, 2);
    }

    #[tokio::test]
    async fn test_same_identity_twice_is_online_once() {
        // テスト項目: 同一 Identity の 2 接続はオンライン一覧で 1 件
        // given (前提条件):
        let hub = create_test_hub();
        let usecase = create_usecase(hub.clone(), create_test_pusher());
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        // when (操作):
        let first = usecase.execute(identity(1, "alice"), tx1).await.unwrap();
        let second = usecase.execute(identity(1, "alice"), tx2).await.unwrap();

        // then (期待する結果):
        assert_ne!(first, second);
        let frames = frames_of(&mut rx2, "online-identities");
        assert_eq!(frames[0]["identities"].as_array().unwrap().len(), 1);
        assert_eq!(hub.lock().await.connection_count(), 2);
    }
}
