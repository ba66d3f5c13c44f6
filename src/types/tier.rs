//! Subscription tier supplied by the auth layer

use serde::{Deserialize, Serialize};

/// A user's subscription level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    /// Daily quota and capped amounts, Pro toggles inert
    Free,
    /// No daily ceiling, all toggles honoured
    Pro,
}

impl UserTier {
    /// Map the auth layer's `is_pro` flag
    pub fn from_is_pro(is_pro: bool) -> Self {
        if is_pro {
            UserTier::Pro
        } else {
            UserTier::Free
        }
    }

    pub fn is_pro(&self) -> bool {
        matches!(self, UserTier::Pro)
    }

    /// Parse the header/CLI spelling (`free` | `pro`, any case)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Some(UserTier::Free),
            "pro" => Some(UserTier::Pro),
            _ => None,
        }
    }

    /// Get emoji for tier
    pub fn emoji(&self) -> &'static str {
        match self {
            UserTier::Free => "🌱",
            UserTier::Pro => "👑",
        }
    }
}

impl std::fmt::Display for UserTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UserTier::Free => "FREE",
            UserTier::Pro => "PRO",
        };
        write!(f, "{}", name)
    }
}
