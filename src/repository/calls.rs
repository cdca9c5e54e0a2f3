use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::domain::call::{Call, CallStatus};
use crate::error::AppResult;
use crate::repository::{CallRepository, StatusTransition};

#[derive(Clone)]
pub struct PgCallRepository {
    db: Pool<Postgres>,
}

impl PgCallRepository {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

const CALL_COLUMNS: &str =
    "id, caller_id, peer_id, status, offer, answer, created_at, updated_at";

/// Advisory-lock key for a user: the leading 8 bytes of the UUID. Collisions
/// only cost extra serialization, never correctness.
fn lock_key(user_id: Uuid) -> i64 {
    let b = user_id.as_bytes();
    i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}

#[async_trait]
impl CallRepository for PgCallRepository {
    async fn create(&self, call: &Call) -> AppResult<bool> {
        // Postgres cannot enforce the four-way role intersection with a
        // unique index, so admission is serialized per participant:
        // transaction-scoped advisory locks on both user IDs (taken in key
        // order so two admissions never deadlock), then a conditional insert
        // in the same transaction.
        let mut tx = self.db.begin().await?;

        let mut keys = [lock_key(call.caller_id), lock_key(call.peer_id)];
        keys.sort_unstable();

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(keys[0])
            .execute(&mut *tx)
            .await?;
        if keys[1] != keys[0] {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(keys[1])
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query(
            "INSERT INTO calls \
             (id, caller_id, peer_id, status, offer, answer, created_at, updated_at) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8 \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM calls \
                 WHERE status = 'request' \
                   AND (caller_id = $2 OR caller_id = $3 OR peer_id = $2 OR peer_id = $3))",
        )
        .bind(call.id)
        .bind(call.caller_id)
        .bind(call.peer_id)
        .bind(call.status)
        .bind(&call.offer)
        .bind(&call.answer)
        .bind(call.created_at)
        .bind(call.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_with_status(&self, id: Uuid, status: CallStatus) -> AppResult<Option<Call>> {
        let query = format!("SELECT {CALL_COLUMNS} FROM calls WHERE id = $1 AND status = $2");

        let call = sqlx::query_as::<_, Call>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.db)
            .await?;

        Ok(call)
    }

    async fn find_last_for_user(
        &self,
        user_id: Uuid,
        status: CallStatus,
    ) -> AppResult<Option<Call>> {
        let query = format!(
            "SELECT {CALL_COLUMNS} FROM calls \
             WHERE (caller_id = $1 OR peer_id = $1) AND status = $2 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );

        let call = sqlx::query_as::<_, Call>(&query)
            .bind(user_id)
            .bind(status)
            .fetch_optional(&self.db)
            .await?;

        Ok(call)
    }

    async fn update_status(
        &self,
        id: Uuid,
        transition: StatusTransition,
    ) -> AppResult<Option<Call>> {
        let previous: Vec<String> = transition
            .previous
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let query = format!(
            "UPDATE calls \
             SET status = $2, answer = COALESCE($3, answer), updated_at = now() \
             WHERE id = $1 \
               AND status::text = ANY($4) \
               AND ($5::uuid IS NULL OR peer_id = $5) \
               AND ($6::uuid IS NULL OR caller_id = $6 OR peer_id = $6) \
             RETURNING {CALL_COLUMNS}"
        );

        let updated = sqlx::query_as::<_, Call>(&query)
            .bind(id)
            .bind(transition.new_status)
            .bind(&transition.answer)
            .bind(&previous)
            .bind(transition.required_peer)
            .bind(transition.required_participant)
            .fetch_optional(&self.db)
            .await?;

        Ok(updated)
    }
}
