//! In-process test server and WebSocket test client.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use irori_server::{
    domain::{ChannelName, DisplayName, Identity, UserId},
    infrastructure::{identity::JwtIdentityVerifier, repository::InMemoryMessageStore},
    ui::{AppState, Server},
    usecase::RouterConfig,
};
use irori_shared::time::SystemClock;
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub const SECRET: &str = "integration-test-secret";
pub const TYPING_TIMEOUT: Duration = Duration::from_millis(300);
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Router running on an ephemeral port, shut down on drop
pub struct TestServer {
    addr: SocketAddr,
    verifier: JwtIdentityVerifier,
    http: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(RouterConfig {
            typing_timeout: TYPING_TIMEOUT,
        })
        .await
    }

    pub async fn start_with(config: RouterConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let clock = Arc::new(SystemClock);
        let store = Arc::new(InMemoryMessageStore::with_channels(
            clock.clone(),
            vec![
                ChannelName::new("general".to_string()).unwrap(),
                ChannelName::new("random".to_string()).unwrap(),
            ],
        ));
        let state = AppState::new(
            store,
            Arc::new(JwtIdentityVerifier::new(SECRET)),
            clock,
            config,
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(Server::new(state).serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        TestServer {
            addr,
            verifier: JwtIdentityVerifier::new(SECRET),
            http: reqwest::Client::new(),
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn token(&self, id: i64, name: &str) -> String {
        let identity = Identity::new(
            UserId::new(id).unwrap(),
            DisplayName::new(name.to_string()).unwrap(),
        );
        self.verifier
            .issue(&identity, Duration::from_secs(3600))
            .unwrap()
    }

    /// Token for polling the diagnostics endpoint without joining any room
    pub fn observer_token(&self) -> String {
        self.token(9999, "observer")
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Connect as `(id, name)` and consume the presence frame for this connection
    pub async fn connect(&self, id: i64, name: &str) -> TestClient {
        let url = format!("{}?token={}", self.ws_url(), self.token(id, name));
        let (stream, _) = connect_async(url).await.unwrap();
        let mut client = TestClient { stream };
        client.recv_type("online-identities").await;
        client
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.http.get(self.http_url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.http
            .post(self.http_url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Poll the diagnostics endpoint until `room_key` has `count` members
    pub async fn wait_for_members(&self, room_key: &str, count: usize) {
        self.wait_until(|rooms| {
            let members = rooms
                .as_array()
                .and_then(|rooms| rooms.iter().find(|room| room["roomKey"] == room_key))
                .and_then(|room| room["members"].as_array())
                .map_or(0, |members| members.len());
            members == count
        })
        .await;
    }

    /// Poll the diagnostics endpoint until no room has members left
    pub async fn wait_for_empty_rooms(&self) {
        self.wait_until(|rooms| rooms.as_array().is_some_and(|rooms| rooms.is_empty()))
            .await;
    }

    async fn wait_until(&self, condition: impl Fn(&Value) -> bool) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let rooms: Value = self
                .get("/debug/rooms", Some(&self.observer_token()))
                .await
                .json()
                .await
                .unwrap();
            if condition(&rooms) {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for room state, last: {}",
                rooms
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// WebSocket client speaking the JSON event protocol
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl TestClient {
    pub async fn send(&mut self, event: Value) {
        self.stream
            .send(Message::text(event.to_string()))
            .await
            .unwrap();
    }

    pub async fn join(&mut self, room_key: &str) {
        self.send(serde_json::json!({"type": "join-room", "roomKey": room_key}))
            .await;
    }

    pub async fn send_channel_message(&mut self, channel_id: i64, content: &str) {
        self.send(serde_json::json!({
            "type": "send-channel-message",
            "channelId": channel_id,
            "content": content,
        }))
        .await;
    }

    /// Next JSON frame, or `None` if nothing arrives within `wait`
    pub async fn recv_within(&mut self, wait: Duration) -> Option<Value> {
        loop {
            let frame = tokio::time::timeout(wait, self.stream.next()).await.ok()??;
            match frame.unwrap() {
                Message::Text(text) => return Some(serde_json::from_str(text.as_str()).unwrap()),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Skip frames until one of type `kind` arrives
    pub async fn recv_type(&mut self, kind: &str) -> Value {
        loop {
            let frame = self
                .recv_within(RECV_TIMEOUT)
                .await
                .unwrap_or_else(|| panic!("timed out waiting for '{}'", kind));
            if frame["type"] == kind {
                return frame;
            }
        }
    }

    /// All frames of type `kind` received within `wait`
    pub async fn collect_type(&mut self, kind: &str, wait: Duration) -> Vec<Value> {
        let deadline = tokio::time::Instant::now() + wait;
        let mut frames = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return frames;
            }
            match self.recv_within(remaining).await {
                Some(frame) if frame["type"] == kind => frames.push(frame),
                Some(_) => {}
                None => return frames,
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
