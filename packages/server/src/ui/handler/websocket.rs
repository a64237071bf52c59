//! WebSocket connection handlers.

use std::{fmt::Display, ops::ControlFlow, sync::Arc};

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ChannelId, ConnectionId, ConversationId, Identity, RoomKey, RouterEvent, UserId,
        ValueObjectError,
    },
    infrastructure::dto::{http::ErrorResponse, websocket::ClientEvent},
    ui::state::AppState,
    usecase::{JoinRoomError, SendMessageError, TypingError},
};

use super::auth::bearer_token;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Verify the credential, then upgrade
///
/// Nothing is registered until the upgrade succeeds, so a rejected handshake
/// leaves no trace in the router state.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let credential = query.token.as_deref().or_else(|| bearer_token(&headers));

    let identity = match state.connect_participant_usecase.authenticate(credential) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Rejected WebSocket handshake: {}", e);
            return Err((StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(e.to_string()))));
        }
    };

    tracing::info!(
        "User {} ({}) authenticated, upgrading",
        identity.id,
        identity.display_name
    );
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound flow: every event the router delivers
/// to this connection arrives on `rx` and is written to the socket in order.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Identity) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive events
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = match state
        .connect_participant_usecase
        .execute(identity, tx)
        .await
    {
        Ok(connection_id) => connection_id,
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            return;
        }
    };

    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on {}: {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if dispatch(&state_clone, connection_id, text.as_str())
                        .await
                        .is_break()
                    {
                        break;
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection {} requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push router events to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_participant_usecase
        .execute(connection_id)
        .await;
}

/// Failures of a client event, classified for the reply
trait EventFailure: Display {
    /// Router state is inconsistent; the connection must be closed
    fn is_fatal(&self) -> bool {
        false
    }

    /// Dropped without telling the sender
    fn is_silent(&self) -> bool {
        false
    }
}

impl EventFailure for ValueObjectError {}

impl EventFailure for JoinRoomError {
    fn is_fatal(&self) -> bool {
        JoinRoomError::is_fatal(self)
    }
}

impl EventFailure for TypingError {
    fn is_fatal(&self) -> bool {
        TypingError::is_fatal(self)
    }
}

impl EventFailure for SendMessageError {
    fn is_fatal(&self) -> bool {
        SendMessageError::is_fatal(self)
    }

    fn is_silent(&self) -> bool {
        matches!(self, SendMessageError::EmptyContent)
    }
}

/// Handle one text frame from a client
async fn dispatch(state: &AppState, connection_id: ConnectionId, text: &str) -> ControlFlow<()> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Invalid event from {}: {}", connection_id, e);
            report(state, connection_id, format!("invalid event: {}", e)).await;
            return ControlFlow::Continue(());
        }
    };
    tracing::debug!("Event from {}: {:?}", connection_id, event);

    match event {
        ClientEvent::JoinRoom { room_key } => {
            let result: Result<(), JoinRoomError> = async {
                let room_key: RoomKey = room_key.parse()?;
                state
                    .join_room_usecase
                    .execute(connection_id, room_key)
                    .await
            }
            .await;
            respond(state, connection_id, result).await
        }
        ClientEvent::LeaveRoom => {
            let result = state.join_room_usecase.leave(connection_id).await;
            respond(state, connection_id, result).await
        }
        ClientEvent::SendChannelMessage {
            channel_id,
            content,
        } => {
            let result: Result<(), SendMessageError> = async {
                let channel_id = ChannelId::new(channel_id)?;
                state
                    .send_message_usecase
                    .send_channel_message(connection_id, channel_id, &content)
                    .await
                    .map(|_| ())
            }
            .await;
            respond(state, connection_id, result).await
        }
        ClientEvent::SendDirectMessage {
            recipient_id,
            conversation_id,
            content,
        } => {
            let result: Result<(), SendMessageError> = async {
                let recipient_id = UserId::new(recipient_id)?;
                let conversation_id = ConversationId::new(conversation_id)?;
                state
                    .send_message_usecase
                    .send_direct_message(connection_id, recipient_id, conversation_id, &content)
                    .await
                    .map(|_| ())
            }
            .await;
            respond(state, connection_id, result).await
        }
        ClientEvent::TypingStart { room_key } => {
            let result: Result<(), TypingError> = async {
                let room_key: RoomKey = room_key.parse()?;
                state.typing_usecase.start(connection_id, room_key).await
            }
            .await;
            respond(state, connection_id, result).await
        }
        ClientEvent::TypingStop { room_key } => {
            let result: Result<(), TypingError> = async {
                let room_key: RoomKey = room_key.parse()?;
                state.typing_usecase.stop(connection_id, room_key).await
            }
            .await;
            respond(state, connection_id, result).await
        }
    }
}

/// Turn the result of a client event into a reply to that client only
async fn respond<E: EventFailure>(
    state: &AppState,
    connection_id: ConnectionId,
    result: Result<(), E>,
) -> ControlFlow<()> {
    match result {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) if e.is_fatal() => {
            tracing::error!("Closing connection {}: {}", connection_id, e);
            ControlFlow::Break(())
        }
        Err(e) if e.is_silent() => {
            tracing::debug!("Dropped event from {}: {}", connection_id, e);
            ControlFlow::Continue(())
        }
        Err(e) => {
            tracing::warn!("Event from {} failed: {}", connection_id, e);
            report(state, connection_id, e.to_string()).await;
            ControlFlow::Continue(())
        }
    }
}

async fn report(state: &AppState, connection_id: ConnectionId, message: String) {
    let event = RouterEvent::OperationError { message };
    if let Err(e) = state.message_pusher.push_to(&connection_id, &event).await {
        tracing::debug!("Could not report error to {}: {}", connection_id, e);
    }
}
