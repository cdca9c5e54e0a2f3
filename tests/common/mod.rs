#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use dialog_service::domain::call::{Call, CallStatus};
use dialog_service::domain::chat::{ChatSummary, Message, PeerType};
use dialog_service::error::AppResult;
use dialog_service::repository::{
    CallRepository, ChatRepository, MessageRepository, StatusTransition, UserDirectory,
};
use dialog_service::services::{Broker, BrokerError, CallService, ChatService, Notifier};

/// In-memory user directory.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashSet<Uuid>>,
}

impl InMemoryDirectory {
    pub async fn add(&self, user_id: Uuid) {
        self.users.lock().await.insert(user_id);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn exists(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(self.users.lock().await.contains(&user_id))
    }
}

/// In-memory message store. Insertion order breaks created_at ties so
/// "most recent" is deterministic even when timestamps collide.
#[derive(Default)]
pub struct InMemoryMessages {
    rows: Mutex<Vec<Message>>,
}

impl InMemoryMessages {
    pub async fn get(&self, id: Uuid) -> Option<Message> {
        self.rows.lock().await.iter().find(|m| m.id == id).cloned()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessages {
    async fn create(&self, message: &Message) -> AppResult<()> {
        self.rows.lock().await.push(message.clone());
        Ok(())
    }

    async fn list(&self, chat_id: &str, offset: i64, limit: i64) -> AppResult<Vec<Message>> {
        let rows = self.rows.lock().await;
        let mut matched: Vec<(usize, &Message)> = rows
            .iter()
            .enumerate()
            .filter(|(_, m)| m.chat_id == chat_id)
            .collect();
        matched.sort_by(|(ai, a), (bi, b)| (b.created_at, bi).cmp(&(a.created_at, ai)));

        Ok(matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn update_text(
        &self,
        id: Uuid,
        editor_id: Uuid,
        text: &str,
    ) -> AppResult<Option<Message>> {
        let mut rows = self.rows.lock().await;
        let Some(message) = rows
            .iter_mut()
            .find(|m| m.id == id && m.sender_id == editor_id)
        else {
            return Ok(None);
        };

        message.text = text.to_string();
        message.updated_at = Some(chrono::Utc::now());
        Ok(Some(message.clone()))
    }
}

#[async_trait]
impl ChatRepository for InMemoryMessages {
    async fn list_chats(
        &self,
        viewer_id: Uuid,
        peer_type: Option<PeerType>,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<ChatSummary>> {
        let rows = self.rows.lock().await;

        let mut chat_ids: Vec<String> = Vec::new();
        for m in rows.iter() {
            let participates = m.sender_id == viewer_id || m.peer_id == viewer_id;
            let type_matches = peer_type.map_or(true, |t| m.peer_type == t);
            if participates && type_matches && !chat_ids.contains(&m.chat_id) {
                chat_ids.push(m.chat_id.clone());
            }
        }

        let mut chats: Vec<ChatSummary> = chat_ids
            .into_iter()
            .map(|chat_id| {
                let members: Vec<(usize, &Message)> = rows
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.chat_id == chat_id)
                    .collect();

                let (_, last) = members
                    .iter()
                    .max_by_key(|(i, m)| (m.created_at, *i))
                    .copied()
                    .expect("chat without messages");

                let unread_count = members
                    .iter()
                    .filter(|(_, m)| m.sender_id != viewer_id && !m.read_by.contains(&viewer_id))
                    .count() as i64;

                ChatSummary {
                    id: chat_id,
                    peer_type: last.peer_type,
                    last_message: last.clone(),
                    unread_count,
                }
            })
            .collect();

        chats.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));

        Ok(chats
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn mark_read(&self, viewer_id: Uuid, chat_id: &str) -> AppResult<u64> {
        let mut rows = self.rows.lock().await;
        let mut count = 0;

        for m in rows.iter_mut() {
            if m.chat_id == chat_id && m.sender_id != viewer_id && !m.read_by.contains(&viewer_id)
            {
                m.read_by.push(viewer_id);
                m.updated_at = Some(chrono::Utc::now());
                count += 1;
            }
        }

        Ok(count)
    }
}

/// In-memory call store: the whole check-and-insert runs under one lock,
/// mirroring the atomicity the Postgres repository gets from its
/// advisory-lock transaction.
#[derive(Default)]
pub struct InMemoryCalls {
    rows: Mutex<Vec<Call>>,
}

impl InMemoryCalls {
    pub async fn get(&self, id: Uuid) -> Option<Call> {
        self.rows.lock().await.iter().find(|c| c.id == id).cloned()
    }
}

#[async_trait]
impl CallRepository for InMemoryCalls {
    async fn create(&self, call: &Call) -> AppResult<bool> {
        let mut rows = self.rows.lock().await;

        let blocked = rows.iter().any(|c| {
            c.status == CallStatus::Request
                && [c.caller_id, c.peer_id]
                    .iter()
                    .any(|id| *id == call.caller_id || *id == call.peer_id)
        });
        if blocked {
            return Ok(false);
        }

        rows.push(call.clone());
        Ok(true)
    }

    async fn find_with_status(&self, id: Uuid, status: CallStatus) -> AppResult<Option<Call>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|c| c.id == id && c.status == status)
            .cloned())
    }

    async fn find_last_for_user(
        &self,
        user_id: Uuid,
        status: CallStatus,
    ) -> AppResult<Option<Call>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|c| c.status == status && (c.caller_id == user_id || c.peer_id == user_id))
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        transition: StatusTransition,
    ) -> AppResult<Option<Call>> {
        let mut rows = self.rows.lock().await;

        let Some(call) = rows.iter_mut().find(|c| {
            c.id == id
                && transition.previous.contains(&c.status)
                && transition.required_peer.map_or(true, |p| c.peer_id == p)
                && transition
                    .required_participant
                    .map_or(true, |p| c.caller_id == p || c.peer_id == p)
        }) else {
            return Ok(None);
        };

        call.status = transition.new_status;
        if transition.answer.is_some() {
            call.answer = transition.answer;
        }
        call.updated_at = chrono::Utc::now();
        Ok(Some(call.clone()))
    }
}

/// Broker fake that records every publish.
#[derive(Default)]
pub struct RecordingBroker {
    events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingBroker {
    pub async fn events(&self) -> Vec<(String, serde_json::Value)> {
        self.events.lock().await.clone()
    }

    pub async fn channels(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    pub async fn payloads_for(&self, channel: &str) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

#[async_trait]
impl Broker for RecordingBroker {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), BrokerError> {
        self.events
            .lock()
            .await
            .push((channel.to_string(), payload));
        Ok(())
    }
}

/// Broker fake that always fails, for the swallow-and-log contract.
pub struct FailingBroker;

#[async_trait]
impl Broker for FailingBroker {
    async fn publish(&self, _channel: &str, _payload: serde_json::Value) -> Result<(), BrokerError> {
        Err(BrokerError::Other("broker down".into()))
    }
}

pub struct TestEnv {
    pub chat: Arc<ChatService>,
    pub calls: Arc<CallService>,
    pub directory: Arc<InMemoryDirectory>,
    pub messages: Arc<InMemoryMessages>,
    pub call_store: Arc<InMemoryCalls>,
    pub broker: Arc<RecordingBroker>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_broker_arc(Arc::new(RecordingBroker::default()))
    }

    fn with_broker_arc(broker: Arc<RecordingBroker>) -> Self {
        let directory = Arc::new(InMemoryDirectory::default());
        let messages = Arc::new(InMemoryMessages::default());
        let call_store = Arc::new(InMemoryCalls::default());
        let notifier = Notifier::new(broker.clone());

        Self {
            chat: Arc::new(ChatService::new(
                directory.clone(),
                messages.clone(),
                messages.clone(),
                notifier.clone(),
            )),
            calls: Arc::new(CallService::new(
                directory.clone(),
                call_store.clone(),
                notifier,
            )),
            directory,
            messages,
            call_store,
            broker,
        }
    }

    /// Same wiring, but every publish fails.
    pub fn with_failing_broker() -> Self {
        let directory = Arc::new(InMemoryDirectory::default());
        let messages = Arc::new(InMemoryMessages::default());
        let call_store = Arc::new(InMemoryCalls::default());
        let notifier = Notifier::new(Arc::new(FailingBroker));

        Self {
            chat: Arc::new(ChatService::new(
                directory.clone(),
                messages.clone(),
                messages.clone(),
                notifier.clone(),
            )),
            calls: Arc::new(CallService::new(
                directory.clone(),
                call_store.clone(),
                notifier,
            )),
            directory,
            messages,
            call_store,
            broker: Arc::new(RecordingBroker::default()),
        }
    }

    pub async fn user(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.directory.add(id).await;
        id
    }
}
