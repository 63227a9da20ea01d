//! In-memory `SalonStore` for unit tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use salon_common::models::booking::{Booking, BookingOwner, BookingStatus, BookingWithOwner};
use salon_common::models::user::User;
use salon_db::{BookingUpdate, NewBooking, SalonStore};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    // Insertion order; listings reverse it to get newest first
    bookings: Vec<Booking>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, email: &str, is_admin: bool) -> User {
        self.add_user_with_visits(email, is_admin, 0, &[])
    }

    pub fn add_user_with_visits(
        &self,
        email: &str,
        is_admin: bool,
        haircut_count: i32,
        used: &[i32],
    ) -> User {
        let user = User {
            user_id: Uuid::new_v4(),
            name: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
            is_admin,
            haircut_count,
            used_discount_thresholds: used.to_vec(),
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn user(&self, user_id: Uuid) -> Option<User> {
        self.inner
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned()
    }

    fn with_owner(inner: &Inner, booking: &Booking) -> Result<BookingWithOwner> {
        let Some(owner) = inner.users.iter().find(|u| u.user_id == booking.user_id) else {
            bail!("booking {} has no owner", booking.booking_id);
        };
        Ok(BookingWithOwner {
            booking: booking.clone(),
            owner: BookingOwner {
                user_id: owner.user_id,
                name: owner.name.clone(),
                email: owner.email.clone(),
            },
        })
    }
}

#[async_trait]
impl SalonStore for MemoryStore {
    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.user(user_id))
    }

    async fn create_booking(
        &self,
        new: &NewBooking,
        mark_threshold: Option<i32>,
    ) -> Result<(User, Booking, Option<i32>)> {
        let mut inner = self.inner.lock().unwrap();
        let Some(user) = inner.users.iter_mut().find(|u| u.user_id == new.user_id) else {
            bail!("user {} does not exist", new.user_id);
        };
        // Same guard as the SQL update: reached and not yet consumed
        let consumed = mark_threshold.filter(|t| {
            user.haircut_count >= *t && !user.used_discount_thresholds.contains(t)
        });
        user.haircut_count += 1;
        user.used_discount_thresholds.extend(consumed);
        let user = user.clone();

        let now = Utc::now();
        let booking = Booking {
            booking_id: Uuid::new_v4(),
            user_id: new.user_id,
            barber: new.barber.clone(),
            service: new.service.clone(),
            date: new.date,
            time: new.time,
            email: new.email.clone(),
            phone: new.phone.clone(),
            status: BookingStatus::Confirmed,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        inner.bookings.push(booking.clone());
        Ok((user, booking, consumed))
    }

    async fn booking_by_id(&self, booking_id: Uuid) -> Result<Option<BookingWithOwner>> {
        let inner = self.inner.lock().unwrap();
        inner
            .bookings
            .iter()
            .find(|b| b.booking_id == booking_id)
            .map(|b| Self::with_owner(&inner, b))
            .transpose()
    }

    async fn update_booking(
        &self,
        booking_id: Uuid,
        update: &BookingUpdate,
    ) -> Result<Option<Booking>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(booking) = inner
            .bookings
            .iter_mut()
            .find(|b| b.booking_id == booking_id)
        else {
            return Ok(None);
        };
        match update {
            BookingUpdate::Status { status, notes } => {
                booking.status = *status;
                booking.notes = Some(notes.clone());
            }
            BookingUpdate::Reschedule { date, time, notes } => {
                booking.date = *date;
                booking.time = *time;
                booking.status = BookingStatus::Confirmed;
                booking.notes = Some(notes.clone());
            }
        }
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn delete_booking(&self, booking_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.bookings.len();
        inner.bookings.retain(|b| b.booking_id != booking_id);
        Ok(inner.bookings.len() != before)
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .rev()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_bookings(&self) -> Result<Vec<BookingWithOwner>> {
        let inner = self.inner.lock().unwrap();
        inner
            .bookings
            .iter()
            .rev()
            .map(|b| Self::with_owner(&inner, b))
            .collect()
    }
}
