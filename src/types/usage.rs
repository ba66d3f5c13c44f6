//! Per-user daily usage counter
//!
//! Mutated only by `QuotaTracker::commit`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Generations made on `last_usage_date`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub daily_count: u32,
    /// UTC date of the last successful generation, `None` before the first
    pub last_usage_date: Option<NaiveDate>,
}

impl UsageRecord {
    pub fn new(daily_count: u32, last_usage_date: NaiveDate) -> Self {
        Self {
            daily_count,
            last_usage_date: Some(last_usage_date),
        }
    }

    /// Count as seen on `today`: a stale date reads as zero
    pub fn count_on(&self, today: NaiveDate) -> u32 {
        if self.last_usage_date == Some(today) {
            self.daily_count
        } else {
            0
        }
    }
}

/// Read model for "x / limit used today"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub used_today: u32,
    /// `None` means unbounded
    pub daily_limit: Option<u32>,
    pub remaining: Option<u32>,
}

impl QuotaStatus {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}
