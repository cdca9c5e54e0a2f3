//! Store access. The Postgres implementations below are the only components
//! that talk to the database; services depend on the traits so the store can
//! be swapped for fakes in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::call::{Call, CallStatus};
use crate::domain::chat::{ChatSummary, Message, PeerType};
use crate::error::AppResult;

pub mod calls;
pub mod messages;
pub mod users;

pub use calls::PgCallRepository;
pub use messages::PgMessageRepository;
pub use users::PgUserDirectory;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, user_id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &Message) -> AppResult<()>;

    /// Page of messages in a chat, most recent first.
    async fn list(&self, chat_id: &str, offset: i64, limit: i64) -> AppResult<Vec<Message>>;

    /// Conditional edit: only the sender may change the text. `None` when no
    /// row matched (wrong author or unknown ID, deliberately not
    /// distinguished).
    async fn update_text(
        &self,
        id: Uuid,
        editor_id: Uuid,
        text: &str,
    ) -> AppResult<Option<Message>>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Chat-list projection: last message per chat the viewer participates
    /// in, plus the viewer's unread count, paginated after grouping.
    async fn list_chats(
        &self,
        viewer_id: Uuid,
        peer_type: Option<PeerType>,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<ChatSummary>>;

    /// Adds the viewer to the reader set of every message in the chat they
    /// have not sent and not yet read. Returns the number newly marked.
    async fn mark_read(&self, viewer_id: Uuid, chat_id: &str) -> AppResult<u64>;
}

/// Match conditions for a call status transition. Zero matched rows means
/// the transition was illegal for this actor/state and surfaces as
/// `CallNotFound` in the service layer.
#[derive(Debug, Clone)]
pub struct StatusTransition {
    /// When set, the call's callee must be this user (accept/decline).
    pub required_peer: Option<Uuid>,
    /// When set, this user must be either participant (finish).
    pub required_participant: Option<Uuid>,
    pub previous: Vec<CallStatus>,
    pub new_status: CallStatus,
    pub answer: Option<serde_json::Value>,
}

#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Atomic admission: insert the call iff no `request`-status call exists
    /// involving either participant in any role. Returns whether a row was
    /// created.
    async fn create(&self, call: &Call) -> AppResult<bool>;

    async fn find_with_status(&self, id: Uuid, status: CallStatus) -> AppResult<Option<Call>>;

    /// Most recent call with the given status where the user is either
    /// participant.
    async fn find_last_for_user(&self, user_id: Uuid, status: CallStatus)
        -> AppResult<Option<Call>>;

    /// Single conditional update applying `transition`; returns the updated
    /// call, or `None` when nothing matched.
    async fn update_status(&self, id: Uuid, transition: StatusTransition)
        -> AppResult<Option<Call>>;
}
