//! Persistence seam consumed by the booking lifecycle.

use crate::repos::booking::{BookingRepo, NewBooking};
use crate::repos::user::UserRepo;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use salon_common::models::booking::{Booking, BookingStatus, BookingWithOwner};
use salon_common::models::user::User;
use sqlx::PgPool;
use uuid::Uuid;

/// A mutation applied to an existing booking
#[derive(Debug, Clone, PartialEq)]
pub enum BookingUpdate {
    /// Change status only (cancel)
    Status {
        status: BookingStatus,
        notes: String,
    },
    /// Move to a new slot; status returns to `confirmed`
    Reschedule {
        date: NaiveDate,
        time: NaiveTime,
        notes: String,
    },
}

#[async_trait]
pub trait SalonStore: Send + Sync {
    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Insert a confirmed booking, increment the owner's visit count by one
    /// and, if given, consume the discount threshold. All or nothing.
    ///
    /// The third element is the threshold actually consumed.
    async fn create_booking(
        &self,
        booking: &NewBooking,
        mark_threshold: Option<i32>,
    ) -> Result<(User, Booking, Option<i32>)>;

    async fn booking_by_id(&self, booking_id: Uuid) -> Result<Option<BookingWithOwner>>;

    async fn update_booking(
        &self,
        booking_id: Uuid,
        update: &BookingUpdate,
    ) -> Result<Option<Booking>>;

    /// Hard delete. Returns whether the booking existed.
    async fn delete_booking(&self, booking_id: Uuid) -> Result<bool>;

    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>>;

    async fn list_all_bookings(&self) -> Result<Vec<BookingWithOwner>>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalonStore for PgStore {
    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(UserRepo::get_by_id(&self.pool, user_id)
            .await?
            .map(User::from))
    }

    async fn create_booking(
        &self,
        booking: &NewBooking,
        mark_threshold: Option<i32>,
    ) -> Result<(User, Booking, Option<i32>)> {
        let (user, row, consumed) = BookingRepo::create(&self.pool, booking, mark_threshold).await?;
        Ok((user.into(), row.try_into()?, consumed))
    }

    async fn booking_by_id(&self, booking_id: Uuid) -> Result<Option<BookingWithOwner>> {
        BookingRepo::get_with_owner(&self.pool, booking_id)
            .await?
            .map(BookingWithOwner::try_from)
            .transpose()
    }

    async fn update_booking(
        &self,
        booking_id: Uuid,
        update: &BookingUpdate,
    ) -> Result<Option<Booking>> {
        let row = match update {
            BookingUpdate::Status { status, notes } => {
                BookingRepo::update_status(&self.pool, booking_id, status.as_str(), Some(notes.as_str()))
                    .await?
            }
            BookingUpdate::Reschedule { date, time, notes } => {
                BookingRepo::reschedule(&self.pool, booking_id, *date, *time, Some(notes.as_str())).await?
            }
        };
        row.map(Booking::try_from).transpose()
    }

    async fn delete_booking(&self, booking_id: Uuid) -> Result<bool> {
        BookingRepo::delete(&self.pool, booking_id).await
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        BookingRepo::list_for_user(&self.pool, user_id)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn list_all_bookings(&self) -> Result<Vec<BookingWithOwner>> {
        BookingRepo::list_all(&self.pool)
            .await?
            .into_iter()
            .map(BookingWithOwner::try_from)
            .collect()
    }
}
