//! Per-user and community aggregates

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{Category, ManifestationEvent};

/// Monotonic per-user totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateStats {
    /// Sum of every amount ever generated, kept to cents
    pub total_manifested: f64,
    /// Successful generations
    pub sessions_count: u64,
    /// Days in a row with at least one generation
    pub consecutive_days: u32,
    pub total_code_views: u64,
    /// Mirrors `UsageRecord::daily_count`
    pub daily_usage: u32,
}

impl AggregateStats {
    /// Fold one generated event in
    pub fn record(&self, event: &ManifestationEvent, daily_usage: u32, consecutive_days: u32) -> Self {
        Self {
            total_manifested: round_cents(self.total_manifested + event.amount),
            sessions_count: self.sessions_count + 1,
            consecutive_days,
            total_code_views: self.total_code_views,
            daily_usage,
        }
    }
}

/// Round to two decimal places
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One line of a user's generation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub amount: f64,
    pub sender: String,
    pub bank: String,
    pub category: Category,
    pub code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&ManifestationEvent> for NotificationEntry {
    fn from(event: &ManifestationEvent) -> Self {
        Self {
            amount: event.amount,
            sender: event.sender.clone(),
            bank: event.bank.clone(),
            category: event.category,
            code: event.code.as_ref().map(|c| c.code.clone()),
            timestamp: event.generated_at,
        }
    }
}

/// Totals across all users
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityStats {
    pub total_users: u64,
    pub total_manifested: f64,
    pub notifications_sent: u64,
}
