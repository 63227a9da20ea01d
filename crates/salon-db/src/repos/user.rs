use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use salon_common::models::user::User;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const USER_COLUMNS: &str = "user_id, name, email, password_hash, is_admin, haircut_count, used_discount_thresholds, created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub haircut_count: i32,
    pub used_discount_thresholds: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            is_admin: row.is_admin,
            haircut_count: row.haircut_count,
            used_discount_thresholds: row.used_discount_thresholds,
            created_at: row.created_at,
        }
    }
}

pub struct UserRepo;

impl UserRepo {
    /// Insert a user. Returns `None` when the email is already registered.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        name: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"INSERT INTO "user" (user_id, name, email, password_hash, is_admin)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (email) DO NOTHING
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_optional(pool)
        .await
        .context("Failed to create user")?;
        Ok(row)
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" WHERE email = $1"#
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;
        Ok(row)
    }

    pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" WHERE user_id = $1"#
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by id")?;
        Ok(row)
    }

    /// Count one visit and optionally consume a discount threshold.
    ///
    /// The increment happens in SQL so concurrent bookings never lose a
    /// visit. The threshold is appended only if the pre-increment count has
    /// reached it and it is not already present.
    pub async fn record_visit(
        conn: &mut PgConnection,
        user_id: Uuid,
        mark_threshold: Option<i32>,
    ) -> Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"UPDATE "user"
               SET haircut_count = haircut_count + 1,
                   used_discount_thresholds = CASE
                       WHEN $2::INTEGER IS NOT NULL
                            AND haircut_count >= $2
                            AND NOT ($2 = ANY(used_discount_thresholds))
                       THEN array_append(used_discount_thresholds, $2)
                       ELSE used_discount_thresholds
                   END
               WHERE user_id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(mark_threshold)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to record visit")?
        .with_context(|| format!("User {} disappeared while recording visit", user_id))?;
        Ok(row)
    }

    pub async fn set_admin(pool: &PgPool, user_id: Uuid, is_admin: bool) -> Result<bool> {
        let result = sqlx::query(r#"UPDATE "user" SET is_admin = $2 WHERE user_id = $1"#)
            .bind(user_id)
            .bind(is_admin)
            .execute(pool)
            .await
            .context("Failed to update admin flag")?;
        Ok(result.rows_affected() > 0)
    }
}
