//! Transport plumbing: thin axum handlers over the services. Requests are
//! authenticated upstream; the gateway forwards the verified identity in the
//! `x-user-id` header.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post, put};
use axum::Router;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub mod calls;
pub mod chats;

const USER_ID_HEADER: &str = "x-user-id";

/// Pre-authenticated acting user, extracted from the gateway header.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let user_id = Uuid::parse_str(value).map_err(|_| AppError::Unauthorized)?;

        Ok(AuthUser(user_id))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/chats", get(chats::list_chats))
        .route(
            "/api/v1/chats/:peer_type/:peer_id/messages",
            post(chats::create_message).get(chats::list_messages),
        )
        .route(
            "/api/v1/chats/:peer_type/:peer_id/read",
            post(chats::read_chat),
        )
        .route(
            "/api/v1/chats/:peer_type/:peer_id/typing",
            post(chats::update_typing),
        )
        .route("/api/v1/messages/:id", put(chats::update_message))
        .route("/api/v1/calls", get(calls::get_call))
        .route("/api/v1/calls/user/:peer_id", post(calls::create_call))
        .route("/api/v1/calls/:id/status", put(calls::update_call_status))
        .route("/api/v1/calls/:id/data", put(calls::proxy_call_data))
        .with_state(state)
}
