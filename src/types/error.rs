//! Error taxonomy
//!
//! Validation and quota errors are expected and surfaced verbatim to the
//! caller. Configuration errors are fatal at load. Generation errors are
//! what `ManifestationOrchestrator::generate` reports.

use crate::types::UserTier;

/// A proposed settings draft was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing or unusable field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    #[error("field '{field}' exceeds the {tier} tier limit of {limit}")]
    TierLimitExceeded {
        field: &'static str,
        tier: UserTier,
        limit: f64,
    },
}

impl ValidationError {
    /// Machine-readable kind for API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::OutOfRange { .. } => "out_of_range",
            Self::TierLimitExceeded { .. } => "tier_limit_exceeded",
        }
    }
}

/// The caller may not generate right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QuotaError {
    #[error("daily limit of {limit} manifestations reached, upgrade to Pro for unlimited")]
    DailyLimitReached { limit: u32 },
}

/// Static configuration is unusable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("selection set '{0}' is empty")]
    EmptySet(&'static str),

    #[error("code catalog is empty")]
    EmptyCatalog,

    #[error("catalog code '{0}' is not a numeric sequence")]
    InvalidCode(String),

    #[error("amount range {min:.2}..{max:.2} is empty or non-positive")]
    InvalidRange { min: f64, max: f64 },
}

/// Storage collaborator failure
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a failed `generate`
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    QuotaExceeded(#[from] QuotaError),

    #[error("stored settings are invalid: {0}")]
    InvalidSettings(String),

    #[error("could not record manifestation: {0}")]
    PersistenceFailure(#[from] RepositoryError),
}

impl GenerationError {
    /// Machine-readable kind for API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::InvalidSettings(_) => "invalid_settings",
            Self::PersistenceFailure(_) => "persistence_failure",
        }
    }
}

impl From<ValidationError> for GenerationError {
    fn from(e: ValidationError) -> Self {
        GenerationError::InvalidSettings(e.to_string())
    }
}

impl From<ConfigurationError> for GenerationError {
    fn from(e: ConfigurationError) -> Self {
        GenerationError::InvalidSettings(e.to_string())
    }
}

/// Outcome of a failed settings save
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("could not save settings: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Outcome of a failed affirmation or story submission
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("could not save submission: {0}")]
    Persistence(#[from] RepositoryError),
}

/// The engine could not be brought up
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("could not load catalog: {0}")]
    Repository(#[from] RepositoryError),
}
