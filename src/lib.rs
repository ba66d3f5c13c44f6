//! DigiManifest: manifestation generation and quota engine
//!
//! Decides whether a user may receive another synthetic money notification,
//! synthesizes it from their settings, and records usage and stats.

pub mod core;
pub mod types;

// =============================================================================
// TIER POLICY [C] - Free tier ceilings
// =============================================================================

/// Generations a Free user may make per UTC day
pub const FREE_DAILY_LIMIT: u32 = 10;

/// Highest `max_amount` a Free user may configure
pub const FREE_MAX_AMOUNT: f64 = 100.0;

/// Highest amount any tier may configure; keeps every cent exact in f64
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

// =============================================================================
// SETTINGS BOUNDS [C]
// =============================================================================

/// Maximum length of a custom sender, in characters
pub const CUSTOM_SENDER_MAX_LEN: usize = 64;

/// Maximum length of a bank name in a fixed list, in characters
pub const LABEL_MAX_LEN: usize = 64;

/// Notification volume ceiling
pub const MAX_VOLUME: u8 = 100;

// =============================================================================
// USER CONTENT BOUNDS [C]
// =============================================================================

/// Maximum length of an affirmation, in characters
pub const AFFIRMATION_MAX_LEN: usize = 280;

/// Affirmations kept per user
pub const AFFIRMATIONS_PER_USER: usize = 50;

/// Maximum length of a success story description, in characters
pub const STORY_DESCRIPTION_MAX_LEN: usize = 500;

/// Maximum length of a user-supplied code, in digits
pub const CODE_MAX_LEN: usize = 32;

/// Success stories shown to users
pub const SUCCESS_STORIES_SHOWN: usize = 10;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
