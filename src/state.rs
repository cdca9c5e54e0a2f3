use std::sync::Arc;

use crate::services::{CallService, ChatService};

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub calls: Arc<CallService>,
}
