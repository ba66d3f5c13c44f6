//! Quota Tracker: per-user daily counters and tier ceilings
//!
//! The check reads a stale `last_usage_date` as a zero count, so
//! check-then-commit needs a single write. Only `commit` produces a new
//! `UsageRecord`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use crate::{FREE_DAILY_LIMIT, FREE_MAX_AMOUNT};
use crate::types::{QuotaError, QuotaStatus, UsageRecord, UserTier};

/// Tier ceilings, overridable from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaPolicy {
    /// Generations per UTC day for Free users
    pub free_daily_limit: u32,
    /// Highest configurable `max_amount` for Free users
    pub free_max_amount: f64,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free_daily_limit: FREE_DAILY_LIMIT,
            free_max_amount: FREE_MAX_AMOUNT,
        }
    }
}

impl QuotaPolicy {
    /// Daily ceiling for a tier, `None` when unbounded
    pub fn daily_limit(&self, tier: UserTier) -> Option<u32> {
        match tier {
            UserTier::Free => Some(self.free_daily_limit),
            UserTier::Pro => None,
        }
    }

    /// Amount ceiling for a tier, `None` when unbounded
    pub fn max_amount(&self, tier: UserTier) -> Option<f64> {
        match tier {
            UserTier::Free => Some(self.free_max_amount),
            UserTier::Pro => None,
        }
    }
}

/// Permission to generate once on `day`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedSlot {
    pub day: NaiveDate,
    /// Count the check saw, after the logical reset
    pub used_before: u32,
}

/// Quota tracker
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaTracker {
    policy: QuotaPolicy,
}

impl QuotaTracker {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Check whether one more generation is allowed at `now`
    pub fn check_and_reserve(
        &self,
        tier: UserTier,
        usage: &UsageRecord,
        now: DateTime<Utc>,
    ) -> Result<ReservedSlot, QuotaError> {
        let today = now.date_naive();
        let used_before = usage.count_on(today);

        if let Some(limit) = self.policy.daily_limit(tier) {
            if used_before >= limit {
                return Err(QuotaError::DailyLimitReached { limit });
            }
        }

        Ok(ReservedSlot {
            day: today,
            used_before,
        })
    }

    /// Record one generation at `now`
    pub fn commit(&self, usage: &UsageRecord, now: DateTime<Utc>) -> UsageRecord {
        let today = now.date_naive();
        if usage.last_usage_date == Some(today) {
            UsageRecord::new(usage.daily_count.saturating_add(1), today)
        } else {
            UsageRecord::new(1, today)
        }
    }

    /// Streak after a generation on `today`, given the previous usage date
    ///
    /// Yesterday extends the streak, today leaves it alone, anything else
    /// (including first use) restarts it at 1.
    pub fn next_streak(&self, last_usage_date: Option<NaiveDate>, today: NaiveDate, streak: u32) -> u32 {
        match last_usage_date {
            Some(last) if last == today => streak,
            Some(last) if today.signed_duration_since(last) == Duration::days(1) => {
                streak.saturating_add(1)
            }
            _ => 1,
        }
    }

    /// Usage summary as of `now`
    pub fn status(&self, tier: UserTier, usage: &UsageRecord, now: DateTime<Utc>) -> QuotaStatus {
        let used_today = usage.count_on(now.date_naive());
        let daily_limit = self.policy.daily_limit(tier);
        QuotaStatus {
            used_today,
            daily_limit,
            remaining: daily_limit.map(|limit| limit.saturating_sub(used_today)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
