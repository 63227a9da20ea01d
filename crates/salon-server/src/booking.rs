//! Booking lifecycle: create, cancel, reschedule, delete and listings.
//!
//! Every operation takes the already-resolved acting [`User`] and a
//! [`SalonStore`]. Authorization is decided here, not in the handlers.

use crate::config::BookingsConfig;
use crate::error::ApiError;
use salon_common::loyalty::eligible_threshold;
use salon_common::models::booking::{Booking, BookingStats, BookingStatus, BookingWithOwner};
use salon_common::models::user::User;
use salon_common::validation::{validate_schedule, BookingInput};
use salon_db::{BookingUpdate, NewBooking, SalonStore};
use serde::Serialize;
use uuid::Uuid;

const BOOKING_NOT_FOUND: &str = "Booking not found";
const NOT_OWNER: &str = "Not authorized to modify this booking";
const ADMIN_REQUIRED: &str = "Admin access required";

/// Result of a successful booking creation
#[derive(Debug, Clone, Serialize)]
pub struct BookingCreated {
    /// Owner after the visit was counted
    pub user: User,
    pub booking: Booking,
    /// Loyalty threshold consumed by this booking
    pub threshold_used: Option<i32>,
}

/// Admin dashboard listing
#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub bookings: Vec<BookingWithOwner>,
    /// Counted over all bookings, regardless of the status filter
    pub stats: BookingStats,
}

/// Create a confirmed booking for `user` and count the visit.
///
/// When the client applied a discount (`discount > 0`) and a loyalty
/// threshold is currently eligible, that threshold is consumed in the same
/// transaction.
#[tracing::instrument(skip(store, user, input), fields(user_id = %user.user_id))]
pub async fn create(
    store: &dyn SalonStore,
    user: &User,
    input: &BookingInput,
    discount: Option<f64>,
) -> Result<BookingCreated, ApiError> {
    let valid = input.validate()?;

    let applied = discount.is_some_and(|d| d > 0.0);
    let mark = eligible_threshold(user.haircut_count, &user.used_discount_thresholds)
        .filter(|_| applied);

    let new = NewBooking {
        user_id: user.user_id,
        barber: valid.barber,
        service: valid.service,
        date: valid.date,
        time: valid.time,
        email: valid.email,
        phone: valid.phone,
    };
    // `None` back when a concurrent booking consumed the threshold first
    let (updated, booking, threshold_used) = store.create_booking(&new, mark).await?;

    tracing::info!(
        booking_id = %booking.booking_id,
        haircut_count = updated.haircut_count,
        ?threshold_used,
        "Booking created"
    );

    Ok(BookingCreated {
        user: updated,
        booking,
        threshold_used,
    })
}

/// Cancel a booking. Owner or admin only; cancelling twice is allowed.
#[tracing::instrument(skip(store, user), fields(user_id = %user.user_id))]
pub async fn cancel(
    store: &dyn SalonStore,
    user: &User,
    booking_id: Uuid,
    notes: Option<&str>,
) -> Result<Booking, ApiError> {
    let existing = store
        .booking_by_id(booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found(BOOKING_NOT_FOUND))?;

    if !user.owns_or_admin(existing.booking.user_id) {
        return Err(ApiError::forbidden(NOT_OWNER));
    }

    let notes = non_blank(notes).map(str::to_string).unwrap_or_else(|| {
        if user.is_admin {
            "Cancelled by administrator".to_string()
        } else {
            "Cancelled by user".to_string()
        }
    });

    let booking = store
        .update_booking(
            booking_id,
            &BookingUpdate::Status {
                status: BookingStatus::Cancelled,
                notes,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found(BOOKING_NOT_FOUND))?;

    tracing::info!(%booking_id, "Booking cancelled");
    Ok(booking)
}

/// Move a booking to a new date and time. The booking becomes `confirmed`
/// again, including when it had been cancelled.
///
/// Only the owner may reschedule unless `policy.admin_can_reschedule` is set.
#[tracing::instrument(skip(store, policy, user), fields(user_id = %user.user_id))]
pub async fn reschedule(
    store: &dyn SalonStore,
    policy: &BookingsConfig,
    user: &User,
    booking_id: Uuid,
    date: Option<&str>,
    time: Option<&str>,
    notes: Option<&str>,
) -> Result<Booking, ApiError> {
    let (date, time) = validate_schedule(date, time)?;

    let existing = store
        .booking_by_id(booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found(BOOKING_NOT_FOUND))?;
    let existing = existing.booking;

    let permitted = existing.user_id == user.user_id
        || (user.is_admin && policy.admin_can_reschedule);
    if !permitted {
        return Err(ApiError::forbidden(NOT_OWNER));
    }

    let notes = non_blank(notes).map(str::to_string).unwrap_or_else(|| {
        format!(
            "Rescheduled from {} {}",
            existing.date.format("%Y-%m-%d"),
            existing.time.format("%H:%M")
        )
    });

    let booking = store
        .update_booking(booking_id, &BookingUpdate::Reschedule { date, time, notes })
        .await?
        .ok_or_else(|| ApiError::not_found(BOOKING_NOT_FOUND))?;

    tracing::info!(%booking_id, %date, %time, "Booking rescheduled");
    Ok(booking)
}

/// Permanently remove a booking. Admin only.
#[tracing::instrument(skip(store, user), fields(user_id = %user.user_id))]
pub async fn admin_delete(
    store: &dyn SalonStore,
    user: &User,
    booking_id: Uuid,
) -> Result<(), ApiError> {
    if !user.is_admin {
        return Err(ApiError::forbidden(ADMIN_REQUIRED));
    }

    if !store.delete_booking(booking_id).await? {
        return Err(ApiError::not_found(BOOKING_NOT_FOUND));
    }

    tracing::info!(%booking_id, "Booking deleted");
    Ok(())
}

/// The caller's own bookings, newest first
pub async fn list_for_user(store: &dyn SalonStore, user: &User) -> Result<Vec<Booking>, ApiError> {
    Ok(store.list_bookings_for_user(user.user_id).await?)
}

/// Every booking with its owner, optionally filtered by status. Admin only.
#[tracing::instrument(skip(store, user), fields(user_id = %user.user_id))]
pub async fn admin_overview(
    store: &dyn SalonStore,
    user: &User,
    status: Option<BookingStatus>,
) -> Result<AdminOverview, ApiError> {
    if !user.is_admin {
        return Err(ApiError::forbidden(ADMIN_REQUIRED));
    }

    let all = store.list_all_bookings().await?;
    let stats = BookingStats::from_bookings(all.iter().map(|b| &b.booking));
    let bookings = match status {
        Some(status) => all
            .into_iter()
            .filter(|b| b.booking.status == status)
            .collect(),
        None => all,
    };

    Ok(AdminOverview { bookings, stats })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
