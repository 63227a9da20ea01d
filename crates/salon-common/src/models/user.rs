use crate::loyalty::LoyaltyStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User model (safe for client responses -- no password_hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub haircut_count: i32,
    /// Loyalty thresholds already redeemed, drawn from {3, 6, 10}
    pub used_discount_thresholds: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Current loyalty standing derived from the visit counter
    pub fn loyalty(&self) -> LoyaltyStatus {
        LoyaltyStatus::for_visits(self.haircut_count, &self.used_discount_thresholds)
    }

    /// Whether this user may act on a booking owned by `owner_id`
    pub fn owns_or_admin(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin
    }
}
