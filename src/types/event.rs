//! Manifestation events and their categories

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::GrabovoiCode;

/// Kind of incoming money a notification pretends to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Instant,
    Investment,
    Cashback,
    Bonus,
}

impl Category {
    /// Every category, in catalog order
    pub const ALL: [Category; 4] = [
        Category::Instant,
        Category::Investment,
        Category::Cashback,
        Category::Bonus,
    ];

    /// Stable key used in settings and storage
    pub fn key(&self) -> &'static str {
        match self {
            Category::Instant => "instant",
            Category::Investment => "investment",
            Category::Cashback => "cashback",
            Category::Bonus => "bonus",
        }
    }

    /// Display label shown on the notification
    pub fn label(&self) -> &'static str {
        match self {
            Category::Instant => "⚡ Instant Transfer",
            Category::Investment => "📈 Investment Return",
            Category::Cashback => "💰 Cashback Reward",
            Category::Bonus => "🎁 Bonus Payment",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One synthesized notification of incoming funds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestationEvent {
    /// Two-decimal amount inside the user's range
    pub amount: f64,
    pub sender: String,
    pub bank: String,
    pub category: Category,
    /// Present only for Pro users with codes enabled
    pub code: Option<GrabovoiCode>,
    pub generated_at: DateTime<Utc>,
}

impl ManifestationEvent {
    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        let code = self
            .code
            .as_ref()
            .map(|c| c.code.as_str())
            .unwrap_or("-");
        format!(
            "amount={:.2} | sender={} | bank={} | category={} | code={} | at={}",
            self.amount,
            self.sender,
            self.bank,
            self.category.key(),
            code,
            self.generated_at.to_rfc3339()
        )
    }
}
