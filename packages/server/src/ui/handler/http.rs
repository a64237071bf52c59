//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::{ChannelId, ConversationId, UserId},
    infrastructure::dto::{
        http::{
            ChannelDto, ConversationDto, ConversationSummaryDto, CreateChannelRequest,
            ErrorResponse, HistoryMessageDto, HistoryQuery, OnlineIdentitiesDto,
            OpenConversationRequest, RoomSnapshotDto, UserDto,
        },
        websocket::IdentityDto,
    },
    ui::state::AppState,
    usecase::QueryError,
};

use super::auth::AuthenticatedIdentity;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: QueryError) -> ApiError {
    let status = match &e {
        QueryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        QueryError::NotFound(_) => StatusCode::NOT_FOUND,
        QueryError::Forbidden(_) => StatusCode::FORBIDDEN,
        QueryError::Conflict(_) => StatusCode::CONFLICT,
        QueryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    } else {
        tracing::debug!("Request rejected: {}", e);
    }
    (status, Json(ErrorResponse::new(e.to_string())))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of channels
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    AuthenticatedIdentity(_): AuthenticatedIdentity,
) -> Result<Json<Vec<ChannelDto>>, ApiError> {
    let channels = state
        .list_channels_usecase
        .execute()
        .await
        .map_err(api_error)?;

    // Domain Model から DTO への変換
    Ok(Json(channels.iter().map(ChannelDto::from).collect()))
}

/// Create a channel
pub async fn create_channel(
    State(state): State<Arc<AppState>>,
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
    Json(request): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<ChannelDto>), ApiError> {
    let channel = state
        .create_channel_usecase
        .execute(&request.name)
        .await
        .map_err(api_error)?;
    tracing::info!(
        "User {} created channel {}",
        identity.id,
        channel.name.as_str()
    );

    Ok((StatusCode::CREATED, Json(ChannelDto::from(&channel))))
}

/// Get recent messages of a channel (oldest first)
pub async fn get_channel_history(
    State(state): State<Arc<AppState>>,
    AuthenticatedIdentity(_): AuthenticatedIdentity,
    Path(channel_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryMessageDto>>, ApiError> {
    let channel_id = ChannelId::new(channel_id)
        .map_err(QueryError::from)
        .map_err(api_error)?;
    let history = state
        .get_channel_history_usecase
        .execute(channel_id, query.limit)
        .await
        .map_err(api_error)?;

    Ok(Json(history.iter().map(HistoryMessageDto::from).collect()))
}

/// Find or create the conversation between the caller and `userId`
pub async fn open_conversation(
    State(state): State<Arc<AppState>>,
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
    Json(request): Json<OpenConversationRequest>,
) -> Result<Json<ConversationDto>, ApiError> {
    let other = UserId::new(request.user_id)
        .map_err(QueryError::from)
        .map_err(api_error)?;
    let conversation = state
        .open_conversation_usecase
        .execute(identity.id, other)
        .await
        .map_err(api_error)?;

    Ok(Json(ConversationDto::from(&conversation)))
}

/// List the caller's conversations, newest first
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
) -> Result<Json<Vec<ConversationSummaryDto>>, ApiError> {
    let summaries = state
        .list_conversations_usecase
        .execute(identity.id)
        .await
        .map_err(api_error)?;

    Ok(Json(
        summaries.iter().map(ConversationSummaryDto::from).collect(),
    ))
}

/// Get recent messages of a conversation (participants only)
pub async fn get_conversation_history(
    State(state): State<Arc<AppState>>,
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
    Path(conversation_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryMessageDto>>, ApiError> {
    let conversation_id = ConversationId::new(conversation_id)
        .map_err(QueryError::from)
        .map_err(api_error)?;
    let history = state
        .get_conversation_history_usecase
        .execute(identity.id, conversation_id, query.limit)
        .await
        .map_err(api_error)?;

    Ok(Json(history.iter().map(HistoryMessageDto::from).collect()))
}

/// Get identities that currently have a live connection
pub async fn get_online_identities(
    State(state): State<Arc<AppState>>,
    AuthenticatedIdentity(_): AuthenticatedIdentity,
) -> Json<OnlineIdentitiesDto> {
    let identities = state.get_online_identities_usecase.execute().await;
    Json(OnlineIdentitiesDto {
        identities: identities.iter().map(IdentityDto::from).collect(),
    })
}

/// List every identity seen since startup with its online flag
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthenticatedIdentity(_): AuthenticatedIdentity,
) -> Json<Vec<UserDto>> {
    let users = state.list_users_usecase.execute().await;
    Json(users.iter().map(UserDto::from).collect())
}

/// Debug endpoint to get current room membership (for testing purposes)
pub async fn debug_rooms(
    State(state): State<Arc<AppState>>,
    AuthenticatedIdentity(_): AuthenticatedIdentity,
) -> Json<Vec<RoomSnapshotDto>> {
    let rooms = state.get_room_snapshot_usecase.execute().await;
    Json(rooms.iter().map(RoomSnapshotDto::from).collect())
}
