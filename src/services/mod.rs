pub mod call_service;
pub mod chat_service;
pub mod notifier;

pub use call_service::CallService;
pub use chat_service::ChatService;
pub use notifier::{Broker, BrokerError, Notifier, RedisBroker};
