//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    extract::Request,
    http::Uri,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_channel, debug_rooms, get_channel_history, get_conversation_history,
        get_online_identities, health_check, list_channels, list_conversations, list_users,
        open_conversation, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Messaging router server
///
/// # Example
///
/// ```ignore
/// let state = AppState::new(store, verifier, clock, RouterConfig::default());
/// Server::new(state).run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Build the axum router with every endpoint
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/channels", get(list_channels).post(create_channel))
            .route(
                "/api/channels/{channel_id}/messages",
                get(get_channel_history),
            )
            .route(
                "/api/conversations",
                get(list_conversations).post(open_conversation),
            )
            .route(
                "/api/conversations/{conversation_id}/messages",
                get(get_conversation_history),
            )
            .route("/api/online", get(get_online_identities))
            .route("/api/users", get(list_users))
            .route("/debug/rooms", get(debug_rooms))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Connect to: ws://{}/ws (Authorization: Bearer <jwt>)",
            bind_addr
        );
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        tracing::info!("Irori router listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// リクエストごとの span。資格情報をログに残さないよう URI は伏せ字にする。
fn request_span(request: &Request) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        uri = %redacted_uri(request.uri()),
        version = ?request.version(),
    )
}

/// `token` クエリパラメータの値を伏せた URI
fn redacted_uri(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };
    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("token", _)) => "token=<redacted>",
            _ => pair,
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", uri.path(), query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_uri_hides_token() {
        // テスト項目: token クエリの値はログ用 URI から取り除かれる
        // given (前提条件):
        let uri: Uri = "/ws?token=eyJhbGciOi.secret.sig&room=channel-1".parse().unwrap();

        // when (操作):
        let logged = redacted_uri(&uri);

        // then (期待する結果):
        assert_eq!(logged, "/ws?token=<redacted>&room=channel-1");
        assert!(!logged.contains("secret"));
    }

    #[test]
    fn test_redacted_uri_keeps_other_queries() {
        // テスト項目: token 以外のクエリはそのまま残る
        // given (前提条件):
        let with_query: Uri = "/api/channels/1/messages?limit=10".parse().unwrap();
        let without_query: Uri = "/api/health".parse().unwrap();

        // when (操作) / then (期待する結果):
        assert_eq!(redacted_uri(&with_query), "/api/channels/1/messages?limit=10");
        assert_eq!(redacted_uri(&without_query), "/api/health");
    }
}
