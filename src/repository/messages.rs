use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::domain::chat::{ChatSummary, Message, PeerType};
use crate::error::AppResult;
use crate::repository::{ChatRepository, MessageRepository};

#[derive(Clone)]
pub struct PgMessageRepository {
    db: Pool<Postgres>,
}

impl PgMessageRepository {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

const MESSAGE_COLUMNS: &str =
    "id, sender_id, peer_id, peer_type, chat_id, text, attachments, read_by, created_at, updated_at";

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &Message) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO messages \
             (id, sender_id, peer_id, peer_type, chat_id, text, attachments, read_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(message.peer_id)
        .bind(message.peer_type)
        .bind(&message.chat_id)
        .bind(&message.text)
        .bind(&message.attachments)
        .bind(&message.read_by)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list(&self, chat_id: &str, offset: i64, limit: i64) -> AppResult<Vec<Message>> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE chat_id = $1 \
             ORDER BY created_at DESC \
             OFFSET $2 LIMIT $3"
        );

        let messages = sqlx::query_as::<_, Message>(&query)
            .bind(chat_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        Ok(messages)
    }

    async fn update_text(
        &self,
        id: Uuid,
        editor_id: Uuid,
        text: &str,
    ) -> AppResult<Option<Message>> {
        let query = format!(
            "UPDATE messages SET text = $1, updated_at = now() \
             WHERE id = $2 AND sender_id = $3 \
             RETURNING {MESSAGE_COLUMNS}"
        );

        let updated = sqlx::query_as::<_, Message>(&query)
            .bind(text)
            .bind(id)
            .bind(editor_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(updated)
    }
}

#[async_trait]
impl ChatRepository for PgMessageRepository {
    async fn list_chats(
        &self,
        viewer_id: Uuid,
        peer_type: Option<PeerType>,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<ChatSummary>> {
        // One pass over the viewer's messages: rank rows per chat by recency
        // and count unread ones per partition, then keep the top row of each
        // chat. Pagination applies after grouping.
        let query = format!(
            "SELECT {MESSAGE_COLUMNS}, unread_count FROM ( \
                 SELECT m.*, \
                        ROW_NUMBER() OVER (PARTITION BY chat_id ORDER BY created_at DESC) AS rn, \
                        COUNT(*) FILTER (WHERE sender_id <> $1 AND NOT ($1 = ANY(read_by))) \
                            OVER (PARTITION BY chat_id) AS unread_count \
                 FROM messages m \
                 WHERE (sender_id = $1 OR peer_id = $1) \
                   AND ($2::varchar IS NULL OR peer_type = $2) \
             ) ranked \
             WHERE rn = 1 \
             ORDER BY created_at DESC \
             OFFSET $3 LIMIT $4"
        );

        let rows = sqlx::query(&query)
            .bind(viewer_id)
            .bind(peer_type)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        let chats = rows
            .into_iter()
            .map(|row| {
                let last_message = Message {
                    id: row.get("id"),
                    sender_id: row.get("sender_id"),
                    peer_id: row.get("peer_id"),
                    peer_type: row.get("peer_type"),
                    chat_id: row.get("chat_id"),
                    text: row.get("text"),
                    attachments: row.get("attachments"),
                    read_by: row.get("read_by"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                };

                ChatSummary {
                    id: last_message.chat_id.clone(),
                    peer_type: last_message.peer_type,
                    unread_count: row.get("unread_count"),
                    last_message,
                }
            })
            .collect();

        Ok(chats)
    }

    async fn mark_read(&self, viewer_id: Uuid, chat_id: &str) -> AppResult<u64> {
        // Set semantics in the predicate: a sender never reads their own
        // message and a reader is never appended twice, so the statement is
        // idempotent and rows_affected is the newly-read count.
        let result = sqlx::query(
            "UPDATE messages \
             SET read_by = array_append(read_by, $1), updated_at = now() \
             WHERE chat_id = $2 \
               AND sender_id <> $1 \
               AND NOT ($1 = ANY(read_by))",
        )
        .bind(viewer_id)
        .bind(chat_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}
