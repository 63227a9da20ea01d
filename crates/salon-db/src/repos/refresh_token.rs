use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRow {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    /// Unrevoked and not yet expired
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    pub async fn create(
        pool: &PgPool,
        token_hash: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO refresh_token (token_id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await
        .context("Failed to create refresh token")?;
        Ok(())
    }

    pub async fn get_by_hash(pool: &PgPool, hash: &str) -> Result<Option<RefreshTokenRow>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT token_id, user_id, token_hash, expires_at, revoked, created_at FROM refresh_token WHERE token_hash = $1",
        )
        .bind(hash)
        .fetch_optional(pool)
        .await
        .context("Failed to get refresh token")?;
        Ok(row)
    }

    /// Atomically revoke `old_hash` and store `new_hash` for the same user.
    ///
    /// Returns the owning user id, or `None` if the old token was unknown,
    /// already revoked or expired (nothing is written in that case).
    pub async fn rotate(
        pool: &PgPool,
        old_hash: &str,
        new_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Uuid>> {
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        let user_id: Option<Uuid> = sqlx::query_scalar(
            r#"UPDATE refresh_token SET revoked = TRUE
               WHERE token_hash = $1 AND NOT revoked AND expires_at > NOW()
               RETURNING user_id"#,
        )
        .bind(old_hash)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to revoke rotated refresh token")?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        sqlx::query(
            "INSERT INTO refresh_token (token_id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .context("Failed to store rotated refresh token")?;

        tx.commit()
            .await
            .context("Failed to commit refresh token rotation")?;
        Ok(Some(user_id))
    }

    /// Mark a token revoked. Returns whether an active token was revoked.
    pub async fn revoke(pool: &PgPool, hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE refresh_token SET revoked = TRUE WHERE token_hash = $1 AND NOT revoked",
        )
        .bind(hash)
        .execute(pool)
        .await
        .context("Failed to revoke refresh token")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_token SET revoked = TRUE WHERE user_id = $1 AND NOT revoked",
        )
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to revoke all refresh tokens for user")?;
        Ok(result.rows_affected())
    }
}
