//! Core types for DigiManifest

mod tier;
mod settings;
mod usage;
mod event;
mod stats;
mod catalog;
mod social;
mod error;

pub use tier::UserTier;
pub use settings::{
    GenerationSettings, SenderMode, BankSelection, ManifestationType,
    DEFAULT_MIN_AMOUNT, DEFAULT_FREQUENCY_SECONDS, DEFAULT_VOLUME,
};
pub use usage::{UsageRecord, QuotaStatus};
pub use event::{Category, ManifestationEvent};
pub use stats::{AggregateStats, NotificationEntry, CommunityStats, round_cents};
pub use catalog::{GrabovoiCode, GrabovoiCatalog, is_numeric_code};
pub use social::{CustomAffirmation, AffirmationDraft, SuccessStory, StoryDraft, PublicStory};
pub use error::{
    ValidationError, QuotaError, ConfigurationError, RepositoryError,
    GenerationError, SettingsError, SubmissionError, StartupError,
};
