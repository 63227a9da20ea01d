use crate::repos::user::{UserRepo, UserRow};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use salon_common::models::booking::{Booking, BookingOwner, BookingStatus, BookingWithOwner};
use sqlx::PgPool;
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "b.booking_id, b.user_id, b.barber, b.service, b.date, b.time, b.email, b.phone, b.status, b.notes, b.created_at, b.updated_at";

/// Booking row from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub barber: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub email: String,
    pub phone: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking row joined with its owner's name and email
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingWithOwnerRow {
    #[sqlx(flatten)]
    pub booking: BookingRow,
    pub owner_name: String,
    pub owner_email: String,
}

impl TryFrom<BookingRow> for Booking {
    type Error = anyhow::Error;

    fn try_from(row: BookingRow) -> Result<Self> {
        let status: BookingStatus = row
            .status
            .parse()
            .with_context(|| format!("Booking {} has a corrupt status", row.booking_id))?;
        Ok(Booking {
            booking_id: row.booking_id,
            user_id: row.user_id,
            barber: row.barber,
            service: row.service,
            date: row.date,
            time: row.time,
            email: row.email,
            phone: row.phone,
            status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<BookingWithOwnerRow> for BookingWithOwner {
    type Error = anyhow::Error;

    fn try_from(row: BookingWithOwnerRow) -> Result<Self> {
        let owner = BookingOwner {
            user_id: row.booking.user_id,
            name: row.owner_name,
            email: row.owner_email,
        };
        Ok(BookingWithOwner {
            booking: row.booking.try_into()?,
            owner,
        })
    }
}

/// Fields for a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub barber: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub email: String,
    pub phone: String,
}

/// Repository for booking operations
pub struct BookingRepo;

impl BookingRepo {
    /// Create a confirmed booking and count the owner's visit in one transaction.
    ///
    /// Returns the updated owner, the new booking and the threshold this
    /// booking actually consumed. A requested threshold that was already
    /// used, or not yet reached, is left alone and reported as `None`.
    pub async fn create(
        pool: &PgPool,
        booking: &NewBooking,
        mark_threshold: Option<i32>,
    ) -> Result<(UserRow, BookingRow, Option<i32>)> {
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        // Row lock serializes concurrent bookings for the same user
        let used_before: Vec<i32> = sqlx::query_scalar(
            r#"SELECT used_discount_thresholds FROM "user" WHERE user_id = $1 FOR UPDATE"#,
        )
        .bind(booking.user_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock booking owner")?
        .with_context(|| format!("User {} not found", booking.user_id))?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            WITH b AS (
                INSERT INTO booking (booking_id, user_id, barber, service, date, time, email, phone, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'confirmed')
                RETURNING *
            )
            SELECT {BOOKING_COLUMNS} FROM b
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(booking.user_id)
        .bind(&booking.barber)
        .bind(&booking.service)
        .bind(booking.date)
        .bind(booking.time)
        .bind(&booking.email)
        .bind(&booking.phone)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create booking")?;

        let user = UserRepo::record_visit(&mut *tx, booking.user_id, mark_threshold).await?;
        let consumed = mark_threshold
            .filter(|t| user.used_discount_thresholds.contains(t) && !used_before.contains(t));

        tx.commit()
            .await
            .context("Failed to commit booking transaction")?;
        Ok((user, row, consumed))
    }

    pub async fn get(pool: &PgPool, booking_id: Uuid) -> Result<Option<BookingRow>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking b WHERE b.booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get booking")?;
        Ok(row)
    }

    pub async fn get_with_owner(
        pool: &PgPool,
        booking_id: Uuid,
    ) -> Result<Option<BookingWithOwnerRow>> {
        let row = sqlx::query_as::<_, BookingWithOwnerRow>(&format!(
            r#"SELECT {BOOKING_COLUMNS}, u.name AS owner_name, u.email AS owner_email
               FROM booking b JOIN "user" u ON u.user_id = b.user_id
               WHERE b.booking_id = $1"#
        ))
        .bind(booking_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get booking with owner")?;
        Ok(row)
    }

    /// Bookings owned by a user, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<BookingRow>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking b WHERE b.user_id = $1 ORDER BY b.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list bookings for user")?;
        Ok(rows)
    }

    /// Every booking with its owner, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<BookingWithOwnerRow>> {
        let rows = sqlx::query_as::<_, BookingWithOwnerRow>(&format!(
            r#"SELECT {BOOKING_COLUMNS}, u.name AS owner_name, u.email AS owner_email
               FROM booking b JOIN "user" u ON u.user_id = b.user_id
               ORDER BY b.created_at DESC"#
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list bookings")?;
        Ok(rows)
    }

    pub async fn update_status(
        pool: &PgPool,
        booking_id: Uuid,
        status: &str,
        notes: Option<&str>,
    ) -> Result<Option<BookingRow>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            WITH b AS (
                UPDATE booking SET status = $2, notes = $3, updated_at = NOW()
                WHERE booking_id = $1
                RETURNING *
            )
            SELECT {BOOKING_COLUMNS} FROM b
            "#
        ))
        .bind(booking_id)
        .bind(status)
        .bind(notes)
        .fetch_optional(pool)
        .await
        .context("Failed to update booking status")?;
        Ok(row)
    }

    /// Move a booking to a new slot and re-confirm it
    pub async fn reschedule(
        pool: &PgPool,
        booking_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        notes: Option<&str>,
    ) -> Result<Option<BookingRow>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            WITH b AS (
                UPDATE booking
                SET date = $2, time = $3, status = 'confirmed', notes = $4, updated_at = NOW()
                WHERE booking_id = $1
                RETURNING *
            )
            SELECT {BOOKING_COLUMNS} FROM b
            "#
        ))
        .bind(booking_id)
        .bind(date)
        .bind(time)
        .bind(notes)
        .fetch_optional(pool)
        .await
        .context("Failed to reschedule booking")?;
        Ok(row)
    }

    /// Permanently remove a booking. Returns whether a row was deleted.
    pub async fn delete(pool: &PgPool, booking_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM booking WHERE booking_id = $1")
            .bind(booking_id)
            .execute(pool)
            .await
            .context("Failed to delete booking")?;
        Ok(result.rows_affected() > 0)
    }
}
