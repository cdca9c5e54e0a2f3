use std::sync::Arc;
use uuid::Uuid;

use crate::domain::call::{self, Call, CallDto, CallStatus};
use crate::error::{AppError, AppResult};
use crate::repository::{CallRepository, StatusTransition, UserDirectory};
use crate::services::notifier::Notifier;

pub struct CallService {
    users: Arc<dyn UserDirectory>,
    calls: Arc<dyn CallRepository>,
    notifier: Notifier,
}

impl CallService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        calls: Arc<dyn CallRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            users,
            calls,
            notifier,
        }
    }

    /// Admission plus ring: at most one pending request may involve either
    /// participant, enforced by the repository in a single atomic operation.
    pub async fn create_call(
        &self,
        caller_id: Uuid,
        peer_id: Uuid,
        offer: Option<serde_json::Value>,
    ) -> AppResult<Uuid> {
        if !self.users.exists(peer_id).await? {
            return Err(AppError::PeerNotFound);
        }

        let call = Call::new(caller_id, peer_id, offer);

        if !self.calls.create(&call).await? {
            return Err(AppError::CallAlreadyExists);
        }

        self.notifier
            .publish(
                &call::channel_call_new(peer_id),
                serde_json::json!({ "type": "call.new", "call": call.dto() }),
            )
            .await;

        Ok(call.id)
    }

    /// The user's pending incoming or outgoing ring, if any. Lets a client
    /// pick the call back up after a reconnect.
    pub async fn get_call(&self, user_id: Uuid) -> AppResult<CallDto> {
        let call = self
            .calls
            .find_last_for_user(user_id, CallStatus::Request)
            .await?
            .ok_or(AppError::CallNotFound)?;

        Ok(call.dto())
    }

    /// Accept or decline a ringing call. Only the callee may do either, and
    /// only while the call is still in `request`; any other actor/state
    /// combination is reported as `CallNotFound` so existence is not leaked.
    pub async fn update_call_status(
        &self,
        acting_user_id: Uuid,
        call_id: Uuid,
        accept: bool,
        answer: Option<serde_json::Value>,
    ) -> AppResult<CallDto> {
        let transition = StatusTransition {
            required_peer: Some(acting_user_id),
            required_participant: None,
            previous: vec![CallStatus::Request],
            new_status: if accept {
                CallStatus::Accepted
            } else {
                CallStatus::Declined
            },
            answer: if accept { answer } else { None },
        };

        self.apply_transition(call_id, transition).await
    }

    /// Ends a call. Either participant may finish, from `request` (hanging
    /// up before the callee reacts) or from `accepted`.
    pub async fn finish_call(&self, acting_user_id: Uuid, call_id: Uuid) -> AppResult<CallDto> {
        let transition = StatusTransition {
            required_peer: None,
            required_participant: Some(acting_user_id),
            previous: vec![CallStatus::Request, CallStatus::Accepted],
            new_status: CallStatus::Finished,
            answer: None,
        };

        self.apply_transition(call_id, transition).await
    }

    /// Relays an opaque signaling payload (ICE candidate and the like) to
    /// the other participant of an accepted call. Never echoed back to the
    /// actor.
    pub async fn proxy_call_data(
        &self,
        acting_user_id: Uuid,
        call_id: Uuid,
        payload: serde_json::Value,
    ) -> AppResult<()> {
        let call = self
            .calls
            .find_with_status(call_id, CallStatus::Accepted)
            .await?
            .ok_or(AppError::CallNotFound)?;

        let target = call.other_participant(acting_user_id);

        self.notifier
            .publish(
                &call::channel_call_data(target),
                serde_json::json!({
                    "type": "call.data",
                    "call_id": call.id,
                    "data": payload,
                }),
            )
            .await;

        Ok(())
    }

    async fn apply_transition(
        &self,
        call_id: Uuid,
        transition: StatusTransition,
    ) -> AppResult<CallDto> {
        let call = self
            .calls
            .update_status(call_id, transition)
            .await?
            .ok_or(AppError::CallNotFound)?;

        let dto = call.dto();
        let payload = serde_json::json!({ "type": "call.update", "call": dto });

        // Either side may need to react to the new state, so both hear it.
        self.notifier
            .publish(&call::channel_call_updates(call.caller_id), payload.clone())
            .await;
        self.notifier
            .publish(&call::channel_call_updates(call.peer_id), payload)
            .await;

        Ok(dto)
    }
}
