//! Event Synthesizer: turns validated settings into one notification
//!
//! Draw order is fixed (amount, sender, bank, category, code) so a seeded
//! generator reproduces the same event. The only time input is the
//! `generated_at` passed in by the caller.

use chrono::{DateTime, Utc};
use rand::Rng;
use crate::types::{
    BankSelection, Category, ConfigurationError, GenerationSettings, GrabovoiCatalog,
    GrabovoiCode, ManifestationEvent, ManifestationType, SenderMode, UserTier,
};

/// Sender names for `SenderMode::Random`
pub const SENDERS: [&str; 24] = [
    "Universe",
    "Abundance Source",
    "Wealth Generator",
    "Money Magnet",
    "Fortune Flow",
    "Prosperity Portal",
    "Golden Gateway",
    "Success Stream",
    "Manifest Hub",
    "Wealth Wizard",
    "Fortune Frequency",
    "Money Miracle",
    "Abundant Harvest Co.",
    "Infinite Supply Trust",
    "Cosmic Credit Union",
    "Lucky Star Holdings",
    "Open Door Ventures",
    "Overflow Dividends",
    "Serendipity Partners",
    "Golden Hour Capital",
    "Blessing Brokerage",
    "Windfall Collective",
    "Harmony Payments",
    "Evergreen Returns",
];

/// Bank labels for `BankSelection::Random`
pub const BANKS: [&str; 27] = [
    "Chase Bank",
    "Bank of America",
    "Wells Fargo",
    "Citibank",
    "Capital One",
    "US Bank",
    "PNC Bank",
    "TD Bank",
    "Truist Bank",
    "Charles Schwab",
    "Goldman Sachs",
    "American Express",
    "Discover Bank",
    "Ally Bank",
    "Marcus by Goldman Sachs",
    "PayPal",
    "Venmo",
    "Cash App",
    "Zelle",
    "Apple Pay",
    "Google Pay",
    "Coinbase",
    "Robinhood",
    "E*TRADE",
    "Fidelity",
    "Vanguard",
    "Universe",
];

/// Event synthesizer
#[derive(Debug, Default, Clone, Copy)]
pub struct EventSynthesizer;

impl EventSynthesizer {
    /// Create new synthesizer
    pub fn new() -> Self {
        Self
    }

    /// Produce one event
    ///
    /// `settings` must already be the effective settings for `tier`.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        settings: &GenerationSettings,
        tier: UserTier,
        catalog: &GrabovoiCatalog,
        rng: &mut R,
        generated_at: DateTime<Utc>,
    ) -> Result<ManifestationEvent, ConfigurationError> {
        let amount = self.draw_amount(settings, rng)?;
        let sender = self.draw_sender(settings, rng);
        let bank = self.draw_bank(&settings.bank_selection, rng)?;
        let category = self.draw_category(&settings.manifestation_type, rng)?;

        // Pro-only toggle is inert on Free
        let code = if tier.is_pro() && settings.grabovoi_enabled {
            Some(self.draw_code(catalog, rng))
        } else {
            None
        };

        Ok(ManifestationEvent {
            amount,
            sender,
            bank,
            category,
            code,
            generated_at,
        })
    }

    /// Uniform over whole cents in [min, max]
    fn draw_amount<R: Rng + ?Sized>(
        &self,
        settings: &GenerationSettings,
        rng: &mut R,
    ) -> Result<f64, ConfigurationError> {
        let min_cents = to_cents(settings.min_amount);
        let max_cents = to_cents(settings.max_amount);
        if min_cents == 0 || min_cents > max_cents {
            return Err(ConfigurationError::InvalidRange {
                min: settings.min_amount,
                max: settings.max_amount,
            });
        }
        let cents = rng.gen_range(min_cents..=max_cents);
        Ok(cents as f64 / 100.0)
    }

    fn draw_sender<R: Rng + ?Sized>(&self, settings: &GenerationSettings, rng: &mut R) -> String {
        match (settings.sender_mode, settings.custom_sender.as_deref()) {
            (SenderMode::Custom, Some(custom)) if !custom.is_empty() => custom.to_string(),
            _ => pick(&SENDERS, rng).to_string(),
        }
    }

    fn draw_bank<R: Rng + ?Sized>(
        &self,
        selection: &BankSelection,
        rng: &mut R,
    ) -> Result<String, ConfigurationError> {
        match selection {
            BankSelection::Random => Ok(pick(&BANKS, rng).to_string()),
            BankSelection::FixedList(banks) => {
                if banks.is_empty() {
                    return Err(ConfigurationError::EmptySet("bank_selection"));
                }
                let index = rng.gen_range(0..banks.len());
                banks
                    .iter()
                    .nth(index)
                    .cloned()
                    .ok_or(ConfigurationError::EmptySet("bank_selection"))
            }
        }
    }

    fn draw_category<R: Rng + ?Sized>(
        &self,
        selection: &ManifestationType,
        rng: &mut R,
    ) -> Result<Category, ConfigurationError> {
        match selection {
            ManifestationType::Random => Ok(*pick(&Category::ALL, rng)),
            ManifestationType::FixedCategory(categories) => {
                if categories.is_empty() {
                    return Err(ConfigurationError::EmptySet("manifestation_type"));
                }
                let index = rng.gen_range(0..categories.len());
                categories
                    .iter()
                    .nth(index)
                    .copied()
                    .ok_or(ConfigurationError::EmptySet("manifestation_type"))
            }
        }
    }

    /// Independent of the day's selected code
    fn draw_code<R: Rng + ?Sized>(&self, catalog: &GrabovoiCatalog, rng: &mut R) -> GrabovoiCode {
        pick(catalog.codes(), rng).clone()
    }
}

/// Uniform pick from a non-empty slice
fn pick<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

/// Whole cents, saturating at zero for negative or NaN input
fn to_cents(amount: f64) -> u64 {
    (amount * 100.0).round() as u64
}

// =============================================================================
// TESTS
// =============================================================================
