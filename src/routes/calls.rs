use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::call::{CallDto, CallStatus};
use crate::error::AppError;
use crate::routes::AuthUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCallRequest {
    pub offer: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct CreateCallResponse {
    pub call_id: Uuid,
}

pub async fn create_call(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(peer_id): Path<Uuid>,
    Json(body): Json<CreateCallRequest>,
) -> Result<Json<CreateCallResponse>, AppError> {
    if peer_id == user_id {
        return Err(AppError::BadRequest("cannot call yourself".into()));
    }

    let call_id = state.calls.create_call(user_id, peer_id, body.offer).await?;

    Ok(Json(CreateCallResponse { call_id }))
}

pub async fn get_call(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CallDto>, AppError> {
    let call = state.calls.get_call(user_id).await?;

    Ok(Json(call))
}

#[derive(Deserialize)]
pub struct UpdateCallRequest {
    pub status: CallStatus,
    pub answer: Option<serde_json::Value>,
}

pub async fn update_call_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(call_id): Path<Uuid>,
    Json(body): Json<UpdateCallRequest>,
) -> Result<Json<CallDto>, AppError> {
    let call = match body.status {
        CallStatus::Accepted => {
            state
                .calls
                .update_call_status(user_id, call_id, true, body.answer)
                .await?
        }
        CallStatus::Declined => {
            state
                .calls
                .update_call_status(user_id, call_id, false, None)
                .await?
        }
        CallStatus::Finished => state.calls.finish_call(user_id, call_id).await?,
        CallStatus::Request => {
            return Err(AppError::BadRequest(
                "status must be accepted, declined or finished".into(),
            ));
        }
    };

    Ok(Json(call))
}

#[derive(Deserialize)]
pub struct ProxyCallDataRequest {
    pub data: serde_json::Value,
}

pub async fn proxy_call_data(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(call_id): Path<Uuid>,
    Json(body): Json<ProxyCallDataRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    state.calls.proxy_call_data(user_id, call_id, body.data).await?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}
