use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Call lifecycle: `request` is the only initial state, `declined` and
/// `finished` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    #[sqlx(rename = "request")]
    Request,
    #[sqlx(rename = "accepted")]
    Accepted,
    #[sqlx(rename = "declined")]
    Declined,
    #[sqlx(rename = "finished")]
    Finished,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Call {
    pub id: Uuid,
    pub caller_id: Uuid,
    pub peer_id: Uuid,
    pub status: CallStatus,
    /// Opaque signaling blobs; this service never looks inside them.
    pub offer: Option<serde_json::Value>,
    pub answer: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Call {
    pub fn new(caller_id: Uuid, peer_id: Uuid, offer: Option<serde_json::Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            caller_id,
            peer_id,
            status: CallStatus::Request,
            offer,
            answer: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The participant that is not `user_id`.
    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if user_id == self.peer_id {
            self.caller_id
        } else {
            self.peer_id
        }
    }

    pub fn dto(&self) -> CallDto {
        CallDto {
            id: self.id,
            caller_id: self.caller_id,
            peer_id: self.peer_id,
            status: self.status,
            offer: self.offer.clone(),
            answer: self.answer.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallDto {
    pub id: Uuid,
    pub caller_id: Uuid,
    pub peer_id: Uuid,
    pub status: CallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<serde_json::Value>,
    pub created_at: String,
}

// Per-user broker channels for call events.

pub fn channel_call_new(user_id: Uuid) -> String {
    format!("call:new#{user_id}")
}

pub fn channel_call_updates(user_id: Uuid) -> String {
    format!("call:updates#{user_id}")
}

pub fn channel_call_data(user_id: Uuid) -> String {
    format!("call:data#{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_call_starts_as_request() {
        let call = Call::new(Uuid::new_v4(), Uuid::new_v4(), None);
        assert_eq!(call.status, CallStatus::Request);
        assert!(call.answer.is_none());
    }

    #[test]
    fn other_participant_flips_roles() {
        let call = Call::new(Uuid::new_v4(), Uuid::new_v4(), None);
        assert_eq!(call.other_participant(call.caller_id), call.peer_id);
        assert_eq!(call.other_participant(call.peer_id), call.caller_id);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&CallStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
    }
}
