use std::sync::Arc;

use dialog_service::repository::{PgCallRepository, PgMessageRepository, PgUserDirectory};
use dialog_service::services::{CallService, ChatService, Notifier, RedisBroker};
use dialog_service::state::AppState;
use dialog_service::{config, db, error, logging, routes};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();

    let cfg = config::Config::from_env()?;

    let db = db::init_pool(&cfg.database_url, cfg.db_max_connections)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    // Embedded migrations are idempotent; a schema mismatch is fatal.
    db::MIGRATOR
        .run(&db)
        .await
        .map_err(|e| error::AppError::StartServer(format!("migrations: {e}")))?;

    let broker = RedisBroker::connect(&cfg.redis_url)
        .await
        .map_err(|e| error::AppError::StartServer(format!("redis: {e}")))?;
    let notifier = Notifier::new(Arc::new(broker));

    let users = Arc::new(PgUserDirectory::new(db.clone()));
    let messages = Arc::new(PgMessageRepository::new(db.clone()));
    let calls = Arc::new(PgCallRepository::new(db.clone()));

    let state = AppState {
        chat: Arc::new(ChatService::new(
            users.clone(),
            messages.clone(),
            messages,
            notifier.clone(),
        )),
        calls: Arc::new(CallService::new(users, calls, notifier)),
    };

    let app = routes::router(state);

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting dialog-service");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;

    Ok(())
}
