//! Loyalty discount rules.
//!
//! Two independent mechanisms read the same visit counter:
//!
//! * [`eligible_threshold`] decides which one-shot threshold a booking may
//!   consume. Each of 3, 6 and 10 can be consumed once per user.
//! * [`discount_percent`] is the advertised percentage band shown to the
//!   client. It does not consult the used thresholds, so the two can drift:
//!   a client who skipped the discount at visit 3 still sees the 10% band at
//!   visit 4 while threshold 3 stays unconsumed.

use serde::{Deserialize, Serialize};

/// Discount thresholds in priority order (highest first)
pub const DISCOUNT_THRESHOLDS: [i32; 3] = [10, 6, 3];

/// The threshold a booking made now would consume, if any.
///
/// Picks the highest threshold the visit count has reached that is not in
/// `used`. Only one threshold is ever active at a time.
pub fn eligible_threshold(visits: i32, used: &[i32]) -> Option<i32> {
    DISCOUNT_THRESHOLDS
        .into_iter()
        .find(|threshold| visits >= *threshold && !used.contains(threshold))
}

/// Advertised discount percentage for a visit count.
///
/// 3-5 visits: 10%, 6-9 visits: 15%, 10+ visits: 20%.
pub fn discount_percent(visits: i32) -> u32 {
    match visits {
        v if v >= 10 => 20,
        v if v >= 6 => 15,
        v if v >= 3 => 10,
        _ => 0,
    }
}

/// Loyalty summary attached to user payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyStatus {
    pub haircut_count: i32,
    pub used_discount_thresholds: Vec<i32>,
    pub eligible_threshold: Option<i32>,
    pub discount_percent: u32,
}

impl LoyaltyStatus {
    pub fn for_visits(visits: i32, used: &[i32]) -> Self {
        let mut used_sorted = used.to_vec();
        used_sorted.sort_unstable();
        Self {
            haircut_count: visits,
            used_discount_thresholds: used_sorted,
            eligible_threshold: eligible_threshold(visits, used),
            discount_percent: discount_percent(visits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_threshold_below_three() {
        assert_eq!(eligible_threshold(0, &[]), None);
        assert_eq!(eligible_threshold(2, &[]), None);
    }

    #[test]
    fn test_threshold_exactly_reached() {
        assert_eq!(eligible_threshold(3, &[]), Some(3));
        assert_eq!(eligible_threshold(6, &[]), Some(6));
        assert_eq!(eligible_threshold(10, &[]), Some(10));
    }

    #[test]
    fn test_highest_threshold_wins() {
        // 12 visits qualify for all three; only 10 is active
        assert_eq!(eligible_threshold(12, &[]), Some(10));
        assert_eq!(eligible_threshold(7, &[]), Some(6));
    }

    #[test]
    fn test_used_thresholds_fall_through() {
        assert_eq!(eligible_threshold(12, &[10]), Some(6));
        assert_eq!(eligible_threshold(12, &[10, 6]), Some(3));
        assert_eq!(eligible_threshold(12, &[3, 6, 10]), None);
    }

    #[test]
    fn test_used_lower_threshold_does_not_unlock_next() {
        // threshold 3 consumed, 6 not reached yet
        assert_eq!(eligible_threshold(4, &[3]), None);
        assert_eq!(eligible_threshold(5, &[3]), None);
        assert_eq!(eligible_threshold(6, &[3]), Some(6));
    }

    #[test]
    fn test_discount_percent_bands() {
        assert_eq!(discount_percent(0), 0);
        assert_eq!(discount_percent(2), 0);
        assert_eq!(discount_percent(3), 10);
        assert_eq!(discount_percent(5), 10);
        assert_eq!(discount_percent(6), 15);
        assert_eq!(discount_percent(9), 15);
        assert_eq!(discount_percent(10), 20);
        assert_eq!(discount_percent(42), 20);
    }

    #[test]
    fn test_band_independent_of_used_thresholds() {
        let status = LoyaltyStatus::for_visits(4, &[]);
        assert_eq!(status.discount_percent, 10);
        assert_eq!(status.eligible_threshold, Some(3));

        let status = LoyaltyStatus::for_visits(4, &[3]);
        assert_eq!(status.discount_percent, 10);
        assert_eq!(status.eligible_threshold, None);
    }

    #[test]
    fn test_status_sorts_used_thresholds() {
        let status = LoyaltyStatus::for_visits(11, &[10, 3]);
        assert_eq!(status.used_discount_thresholds, vec![3, 10]);
        assert_eq!(status.eligible_threshold, Some(6));
    }
}
