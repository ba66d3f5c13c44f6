//! Generation settings owned by a user
//!
//! Stored exactly as the user saved them. Pro-only toggles survive a
//! downgrade and are only ignored at synthesis time.

use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::types::Category;
use crate::FREE_MAX_AMOUNT;

/// Default lower bound, as shipped to new users
pub const DEFAULT_MIN_AMOUNT: f64 = 10.0;

/// Default notification cadence (15 minutes)
pub const DEFAULT_FREQUENCY_SECONDS: u32 = 900;

/// Default notification volume
pub const DEFAULT_VOLUME: u8 = 50;

/// Where the sender label comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderMode {
    /// Drawn from the built-in sender catalog
    Random,
    /// Echo `custom_sender`
    Custom,
}

/// Which banks a notification may claim to come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankSelection {
    Random,
    FixedList(BTreeSet<String>),
}

/// Which categories a notification may carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestationType {
    Random,
    FixedCategory(BTreeSet<Category>),
}

/// User-tunable generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub min_amount: f64,
    pub max_amount: f64,
    /// Advisory cadence; scheduling happens outside the engine
    pub frequency_seconds: u32,
    pub sender_mode: SenderMode,
    pub custom_sender: Option<String>,
    pub bank_selection: BankSelection,
    pub manifestation_type: ManifestationType,
    pub sound_enabled: bool,
    pub volume: u8,
    /// Pro only
    pub grabovoi_enabled: bool,
    /// Pro only
    pub subliminal_enabled: bool,
    pub spaced_repetition: bool,
    pub circadian_optimized: bool,
    pub twenty_one_day_cycle: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            min_amount: DEFAULT_MIN_AMOUNT,
            max_amount: FREE_MAX_AMOUNT,
            frequency_seconds: DEFAULT_FREQUENCY_SECONDS,
            sender_mode: SenderMode::Random,
            custom_sender: None,
            bank_selection: BankSelection::Random,
            manifestation_type: ManifestationType::Random,
            sound_enabled: true,
            volume: DEFAULT_VOLUME,
            grabovoi_enabled: false,
            subliminal_enabled: false,
            spaced_repetition: false,
            circadian_optimized: false,
            twenty_one_day_cycle: false,
        }
    }
}

impl GenerationSettings {
    /// Settings with the given amount range and defaults elsewhere
    pub fn with_range(min_amount: f64, max_amount: f64) -> Self {
        Self {
            min_amount,
            max_amount,
            ..Self::default()
        }
    }
}
