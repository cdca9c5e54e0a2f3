use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::AppResult;
use crate::repository::UserDirectory;

/// Read-only view of the users table. The table itself is owned by the user
/// service; this service only checks existence for peer validation.
#[derive(Clone)]
pub struct PgUserDirectory {
    db: Pool<Postgres>,
}

impl PgUserDirectory {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn exists(&self, user_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        Ok(exists)
    }
}
