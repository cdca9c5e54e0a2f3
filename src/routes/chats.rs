use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::chat::{ChatDto, MessageDto, PeerType};
use crate::error::AppError;
use crate::routes::AuthUser;
use crate::state::AppState;

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Deserialize)]
pub struct Page {
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

impl Page {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE)
    }
}

fn parse_peer_type(value: &str) -> Result<PeerType, AppError> {
    value.parse()
}

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub text: String,
}

pub async fn create_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((peer_type, peer_id)): Path<(String, Uuid)>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<Json<MessageDto>, AppError> {
    if body.text.trim().is_empty() {
        return Err(AppError::BadRequest("message text cannot be empty".into()));
    }

    let peer_type = parse_peer_type(&peer_type)?;
    let message = state
        .chat
        .create_message(user_id, peer_id, peer_type, body.text)
        .await?;

    Ok(Json(message))
}

pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((peer_type, peer_id)): Path<(String, Uuid)>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<MessageDto>>, AppError> {
    let peer_type = parse_peer_type(&peer_type)?;
    let messages = state
        .chat
        .list_messages(user_id, peer_id, peer_type, page.offset, page.limit())
        .await?;

    Ok(Json(messages))
}

#[derive(Deserialize)]
pub struct UpdateMessageRequest {
    pub text: String,
}

pub async fn update_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(message_id): Path<Uuid>,
    Json(body): Json<UpdateMessageRequest>,
) -> Result<Json<MessageDto>, AppError> {
    if body.text.trim().is_empty() {
        return Err(AppError::BadRequest("message text cannot be empty".into()));
    }

    let message = state
        .chat
        .update_message(user_id, message_id, body.text)
        .await?;

    Ok(Json(message))
}

#[derive(Deserialize)]
pub struct ListChatsQuery {
    pub peer_type: Option<String>,
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

pub async fn list_chats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListChatsQuery>,
) -> Result<Json<Vec<ChatDto>>, AppError> {
    let peer_type = query
        .peer_type
        .as_deref()
        .map(parse_peer_type)
        .transpose()?;
    let limit = query.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE);

    let chats = state
        .chat
        .list_chats(user_id, peer_type, query.offset, limit)
        .await?;

    Ok(Json(chats))
}

#[derive(Serialize)]
pub struct ReadChatResponse {
    pub read_count: u64,
}

pub async fn read_chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((peer_type, peer_id)): Path<(String, Uuid)>,
) -> Result<Json<ReadChatResponse>, AppError> {
    let peer_type = parse_peer_type(&peer_type)?;
    let read_count = state.chat.read_chat(user_id, peer_id, peer_type).await?;

    Ok(Json(ReadChatResponse { read_count }))
}

#[derive(Deserialize)]
pub struct TypingRequest {
    pub typing: bool,
}

pub async fn update_typing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((peer_type, peer_id)): Path<(String, Uuid)>,
    Json(body): Json<TypingRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    let peer_type = parse_peer_type(&peer_type)?;
    state
        .chat
        .update_typing(user_id, peer_id, peer_type, body.typing)
        .await?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}
