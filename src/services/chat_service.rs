use std::sync::Arc;
use uuid::Uuid;

use crate::domain::chat::{
    self, chat_id, ChatDto, Message, MessageDto, PeerType,
};
use crate::error::{AppError, AppResult};
use crate::repository::{ChatRepository, MessageRepository, UserDirectory};
use crate::services::notifier::Notifier;

pub struct ChatService {
    users: Arc<dyn UserDirectory>,
    messages: Arc<dyn MessageRepository>,
    chats: Arc<dyn ChatRepository>,
    notifier: Notifier,
}

impl ChatService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        messages: Arc<dyn MessageRepository>,
        chats: Arc<dyn ChatRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            users,
            messages,
            chats,
            notifier,
        }
    }

    /// Persists a message with an empty reader set and notifies the peer.
    /// The sender does not receive their own `message.new` event.
    pub async fn create_message(
        &self,
        sender_id: Uuid,
        peer_id: Uuid,
        peer_type: PeerType,
        text: String,
    ) -> AppResult<MessageDto> {
        self.check_peer(peer_id, peer_type).await?;

        let message = Message::new(sender_id, peer_id, peer_type, text);
        self.messages.create(&message).await?;

        let dto = message.dto();
        self.notifier
            .publish(
                &chat::channel_message_new(peer_id),
                serde_json::json!({ "type": "message.new", "message": dto }),
            )
            .await;

        Ok(dto)
    }

    /// Page of a chat's messages, most recent first. An empty page is the
    /// domain error `MessagesNotFound`, never a successful empty list.
    pub async fn list_messages(
        &self,
        viewer_id: Uuid,
        peer_id: Uuid,
        peer_type: PeerType,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<MessageDto>> {
        let chat = chat_id(viewer_id, peer_id, peer_type);
        let messages = self.messages.list(&chat, offset, limit).await?;

        if messages.is_empty() {
            return Err(AppError::MessagesNotFound);
        }

        Ok(messages.iter().map(Message::dto).collect())
    }

    pub async fn update_message(
        &self,
        editor_id: Uuid,
        message_id: Uuid,
        text: String,
    ) -> AppResult<MessageDto> {
        let updated = self
            .messages
            .update_text(message_id, editor_id, &text)
            .await?
            .ok_or(AppError::MessageNotFound)?;

        match updated.peer_type {
            PeerType::User => {
                let dto = updated.dto();
                self.notifier
                    .publish(
                        &chat::channel_message_updated(updated.peer_id),
                        serde_json::json!({ "type": "message.updated", "message": dto }),
                    )
                    .await;
                Ok(dto)
            }
            PeerType::Group => Err(AppError::NotImplemented),
        }
    }

    pub async fn list_chats(
        &self,
        viewer_id: Uuid,
        peer_type: Option<PeerType>,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<ChatDto>> {
        let chats = self
            .chats
            .list_chats(viewer_id, peer_type, offset, limit)
            .await?;

        if chats.is_empty() {
            return Err(AppError::ChatsNotFound);
        }

        Ok(chats.iter().map(|c| c.dto(viewer_id)).collect())
    }

    /// Marks every unread message in the chat as read by the viewer and
    /// tells both sides. Returns how many messages were newly marked.
    pub async fn read_chat(
        &self,
        viewer_id: Uuid,
        peer_id: Uuid,
        peer_type: PeerType,
    ) -> AppResult<u64> {
        if peer_type == PeerType::Group {
            return Err(AppError::NotImplemented);
        }

        let chat = chat_id(viewer_id, peer_id, peer_type);
        let count = self.chats.mark_read(viewer_id, &chat).await?;

        if count == 0 {
            return Err(AppError::MessagesNotFound);
        }

        let payload = serde_json::json!({
            "type": "chat.read",
            "user_id": viewer_id,
            "peer_id": peer_id,
            "chat_id": chat,
        });

        // Both sides react: the peer updates read receipts, the viewer's
        // other devices drop their unread badge.
        self.notifier
            .publish(&chat::channel_read(peer_id), payload.clone())
            .await;
        self.notifier
            .publish(&chat::channel_read(viewer_id), payload)
            .await;

        Ok(count)
    }

    /// Pure notification, nothing persisted.
    pub async fn update_typing(
        &self,
        user_id: Uuid,
        peer_id: Uuid,
        peer_type: PeerType,
        typing: bool,
    ) -> AppResult<()> {
        self.check_peer(peer_id, peer_type).await?;

        self.notifier
            .publish(
                &chat::channel_typing(peer_id),
                serde_json::json!({
                    "type": "chat.typing",
                    "user_id": user_id,
                    "peer_id": peer_id,
                    "typing": typing,
                }),
            )
            .await;

        Ok(())
    }

    async fn check_peer(&self, peer_id: Uuid, peer_type: PeerType) -> AppResult<()> {
        match peer_type {
            PeerType::User => {
                if !self.users.exists(peer_id).await? {
                    return Err(AppError::PeerNotFound);
                }
                Ok(())
            }
            PeerType::Group => Err(AppError::NotImplemented),
        }
    }
}
