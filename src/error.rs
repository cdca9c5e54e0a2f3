use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("peer not found")]
    PeerNotFound,

    #[error("call not found")]
    CallNotFound,

    #[error("call already exists")]
    CallAlreadyExists,

    #[error("message not found")]
    MessageNotFound,

    #[error("messages not found")]
    MessagesNotFound,

    #[error("chats not found")]
    ChatsNotFound,

    #[error("not implemented")]
    NotImplemented,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Stable machine-readable code, part of the API contract.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "ERR_CONFIG",
            AppError::StartServer(_) => "ERR_START_SERVER",
            AppError::BadRequest(_) => "ERR_BAD_REQUEST",
            AppError::Unauthorized => "ERR_UNAUTHORIZED",
            AppError::Forbidden => "ERR_FORBIDDEN",
            AppError::PeerNotFound => "ERR_PEER_NOT_FOUND",
            AppError::CallNotFound => "ERR_CALL_NOT_FOUND",
            AppError::CallAlreadyExists => "ERR_CALL_ALREADY_EXISTS",
            AppError::MessageNotFound => "ERR_MESSAGE_NOT_FOUND",
            AppError::MessagesNotFound => "ERR_MESSAGES_NOT_FOUND",
            AppError::ChatsNotFound => "ERR_CHATS_NOT_FOUND",
            AppError::NotImplemented => "ERR_NOT_IMPLEMENTED",
            AppError::Database(_) => "ERR_DATABASE",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AppError::BadRequest(_) => 400,
            AppError::Unauthorized => 401,
            AppError::Forbidden => 403,
            AppError::PeerNotFound
            | AppError::CallNotFound
            | AppError::MessageNotFound
            | AppError::MessagesNotFound
            | AppError::ChatsNotFound => 404,
            AppError::CallAlreadyExists => 409,
            AppError::NotImplemented => 501,
            AppError::Config(_) | AppError::StartServer(_) | AppError::Database(_) => 500,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Infrastructure details stay in the logs, not in the response body.
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "code": self.code(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
