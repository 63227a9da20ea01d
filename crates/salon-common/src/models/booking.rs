use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking status.
///
/// `Confirmed -> Cancelled` is the normal terminal path. Rescheduling always
/// re-enters `Confirmed`; `Rescheduled` is accepted when read back from
/// storage but never written by the lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Rescheduled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rescheduled => "rescheduled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "rescheduled" => Ok(BookingStatus::Rescheduled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A salon appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub barber: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub email: String,
    pub phone: String,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner summary attached to bookings in admin listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingOwner {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Booking with its owning user attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingWithOwner {
    #[serde(flatten)]
    pub booking: Booking,
    pub owner: BookingOwner,
}

/// Dashboard counters over a set of bookings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingStats {
    pub total: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub rescheduled: usize,
    pub by_service: BTreeMap<String, usize>,
}

impl BookingStats {
    pub fn from_bookings<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        let mut stats = BookingStats::default();
        for booking in bookings {
            stats.total += 1;
            match booking.status {
                BookingStatus::Confirmed => stats.confirmed += 1,
                BookingStatus::Cancelled => stats.cancelled += 1,
                BookingStatus::Rescheduled => stats.rescheduled += 1,
            }
            *stats.by_service.entry(booking.service.clone()).or_default() += 1;
        }
        stats
    }
}
