use super::util::is_dup_key;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlConnection, MySqlPool, Row};

fn persistence(e: sqlx::Error) -> LedgerError {
    LedgerError::Persistence(e.to_string())
}

/// Ledger backed by the `refresh_tokens` table.
///
/// `replace` and `rotate` run in one transaction each. In `rotate` the
/// delete of the presented row takes its row lock first, so a second rotation
/// of the same token blocks, then sees zero affected rows and is refused.
pub struct MySqlRefreshLedger {
    pool: MySqlPool,
}

impl MySqlRefreshLedger {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshLedger { pool }
    }

    fn row_to_entry(row: MySqlRow) -> Result<RefreshLedgerEntry, LedgerError> {
        Ok(RefreshLedgerEntry {
            user_id: row.try_get::<UserId, _>("user_id").map_err(persistence)?,
            hashed_token: row.try_get("hashed_token").map_err(persistence)?,
            created_at: row.try_get("created_at").map_err(persistence)?,
            expires_at: row.try_get("expires_at").map_err(persistence)?,
        })
    }

    async fn insert_on(
        conn: &mut MySqlConnection,
        entry: &RefreshLedgerEntry,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
INSERT INTO refresh_tokens (user_id, hashed_token, created_at, expires_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(entry.user_id)
        .bind(&entry.hashed_token)
        .bind(entry.created_at)
        .bind(entry.expires_at)
        .execute(conn)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                LedgerError::DuplicateKey
            } else {
                persistence(e)
            }
        })?;

        Ok(())
    }

    async fn delete_all_on(conn: &mut MySqlConnection, user_id: UserId) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(conn)
            .await
            .map_err(persistence)?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl RefreshLedger for MySqlRefreshLedger {
    async fn insert(
        &self,
        user_id: UserId,
        token: &SignedToken,
    ) -> Result<RefreshLedgerEntry, LedgerError> {
        let entry = RefreshLedgerEntry::for_token(user_id, token, Utc::now());
        let mut conn = self.pool.acquire().await.map_err(persistence)?;
        Self::insert_on(&mut *conn, &entry).await?;
        Ok(entry)
    }

    async fn lookup(&self, user_id: UserId, raw: &str) -> Result<RefreshLedgerEntry, LedgerError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, hashed_token, created_at, expires_at
FROM refresh_tokens
WHERE user_id = ? AND hashed_token = ?
"#,
        )
        .bind(user_id)
        .bind(digest_refresh_token(raw))
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        row_opt
            .map(Self::row_to_entry)
            .transpose()?
            .ok_or(LedgerError::NotFound)
    }

    async fn delete_all(&self, user_id: UserId) -> Result<u64, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(persistence)?;
        Self::delete_all_on(&mut *conn, user_id).await
    }

    async fn replace(
        &self,
        user_id: UserId,
        token: &SignedToken,
    ) -> Result<RefreshLedgerEntry, LedgerError> {
        let entry = RefreshLedgerEntry::for_token(user_id, token, Utc::now());

        let mut tx = self.pool.begin().await.map_err(persistence)?;
        Self::delete_all_on(&mut *tx, user_id).await?;
        Self::insert_on(&mut *tx, &entry).await?;
        tx.commit().await.map_err(persistence)?;

        Ok(entry)
    }

    async fn rotate(
        &self,
        user_id: UserId,
        presented: &str,
        next: &SignedToken,
    ) -> Result<RefreshLedgerEntry, LedgerError> {
        let entry = RefreshLedgerEntry::for_token(user_id, next, Utc::now());

        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let consumed = sqlx::query(
            "DELETE FROM refresh_tokens WHERE user_id = ? AND hashed_token = ?",
        )
        .bind(user_id)
        .bind(digest_refresh_token(presented))
        .execute(&mut *tx)
        .await
        .map_err(persistence)?
        .rows_affected();

        if consumed == 0 {
            tx.rollback().await.map_err(persistence)?;
            return Err(LedgerError::NotFound);
        }

        Self::delete_all_on(&mut *tx, user_id).await?;
        Self::insert_on(&mut *tx, &entry).await?;
        tx.commit().await.map_err(persistence)?;

        Ok(entry)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;

        Ok(result.rows_affected())
    }
}
