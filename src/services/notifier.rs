use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("{0}")]
    Other(String),
}

/// Real-time transport seam: publish an arbitrary payload to a named
/// channel. Delivery semantics beyond "attempted once" are not assumed.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), BrokerError>;
}

#[derive(Clone)]
pub struct RedisBroker {
    conn: ConnectionManager,
}

impl RedisBroker {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel, payload.to_string())
            .await?;
        Ok(())
    }
}

/// Best-effort fan-out shared by the chat and call services.
///
/// Publish failures are logged and swallowed: the durable write that
/// triggered the event has already committed, and a lost notification must
/// not roll it back or fail the request.
#[derive(Clone)]
pub struct Notifier {
    broker: Arc<dyn Broker>,
}

impl Notifier {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    pub async fn publish(&self, channel: &str, payload: serde_json::Value) {
        if let Err(e) = self.broker.publish(channel, payload).await {
            tracing::warn!(%channel, error = %e, "broker publish failed");
        }
    }
}
