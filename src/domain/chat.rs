use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of the other side of a chat. Group chats are reserved for a future
/// release; everywhere they are matched the service answers `NotImplemented`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "lowercase")]
pub enum PeerType {
    #[sqlx(rename = "user")]
    User,
    #[sqlx(rename = "group")]
    Group,
}

impl PeerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

impl std::str::FromStr for PeerType {
    type Err = crate::error::AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            other => Err(crate::error::AppError::BadRequest(format!(
                "unknown peer type: {other}"
            ))),
        }
    }
}

/// Grouping key for messages. For user peers both participants derive the
/// same value; for group peers the group ID itself is the key.
pub fn chat_id(user_id: Uuid, peer_id: Uuid, peer_type: PeerType) -> String {
    match peer_type {
        PeerType::User => super::combine_ids(user_id, peer_id),
        PeerType::Group => peer_id.to_string(),
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub peer_id: Uuid,
    pub peer_type: PeerType,
    pub chat_id: String,
    pub text: String,
    pub attachments: Vec<String>,
    /// Users who have marked this message read. Never contains the sender.
    pub read_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(sender_id: Uuid, peer_id: Uuid, peer_type: PeerType, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            peer_id,
            peer_type,
            chat_id: chat_id(sender_id, peer_id, peer_type),
            text,
            attachments: Vec::new(),
            read_by: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn dto(&self) -> MessageDto {
        MessageDto {
            id: self.id,
            sender_id: self.sender_id,
            peer_id: self.peer_id,
            peer_type: self.peer_type,
            chat_id: self.chat_id.clone(),
            text: self.text.clone(),
            attachments: self.attachments.clone(),
            read_by: self.read_by.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub peer_id: Uuid,
    pub peer_type: PeerType,
    pub chat_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attachments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub read_by: Vec<Uuid>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// One row of the chat-list projection: the most recent message in a chat
/// plus the viewer's unread count. Derived per query, never stored.
#[derive(Debug, Clone)]
pub struct ChatSummary {
    pub id: String,
    pub peer_type: PeerType,
    pub last_message: Message,
    pub unread_count: i64,
}

impl ChatSummary {
    /// `viewer` picks which participant of the last message is "the peer"
    /// from the caller's perspective.
    pub fn dto(&self, viewer: Uuid) -> ChatDto {
        let peer_id = if self.last_message.sender_id == viewer {
            self.last_message.peer_id
        } else {
            self.last_message.sender_id
        };

        ChatDto {
            id: self.id.clone(),
            peer_id,
            peer_type: self.peer_type,
            last_message: self.last_message.dto(),
            unread_count: self.unread_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDto {
    pub id: String,
    pub peer_id: Uuid,
    pub peer_type: PeerType,
    pub last_message: MessageDto,
    pub unread_count: i64,
}

// Per-user broker channels for chat events.

pub fn channel_message_new(user_id: Uuid) -> String {
    format!("chat:message_new#{user_id}")
}

pub fn channel_message_updated(user_id: Uuid) -> String {
    format!("chat:message_updated#{user_id}")
}

pub fn channel_read(user_id: Uuid) -> String {
    format!("chat:read#{user_id}")
}

pub fn channel_typing(user_id: Uuid) -> String {
    format!("chat:typing#{user_id}")
}
