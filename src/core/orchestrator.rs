//! Manifestation Orchestrator: "generate a manifestation for user U"
//!
//! Per call:
//! - CheckQuota → Synthesize → CommitQuota + UpdateStats → Return
//! - quota rejection short-circuits before anything is written
//! - stored settings that are unsafe fail closed as InvalidSettings
//! - usage and stats are committed together or not at all
//!
//! Calls for one user are serialized by a per-user lock held from the
//! quota check through the commit. Different users never contend.
//! The commit is the only step that survives a dropped caller.

use std::collections::HashMap;
use std::sync::Arc;
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use crate::core::clock::{Clock, SystemClock};
use crate::core::daily_code::code_of_day;
use crate::core::quota::{QuotaPolicy, QuotaTracker};
use crate::core::repository::Repository;
use crate::core::social::{affirmation_from_draft, story_from_draft};
use crate::core::synthesizer::EventSynthesizer;
use crate::core::validator::SettingsValidator;
use crate::{AFFIRMATIONS_PER_USER, SUCCESS_STORIES_SHOWN};
use crate::types::{
    AffirmationDraft, AggregateStats, CommunityStats, CustomAffirmation, GenerationError,
    GenerationSettings, GrabovoiCatalog, GrabovoiCode, ManifestationEvent, NotificationEntry,
    QuotaStatus, RepositoryError, SettingsError, StartupError, StoryDraft, SubmissionError,
    SuccessStory, UserTier, ValidationError,
};

/// Idle per-user locks are pruned once the table grows past this
const LOCK_TABLE_PRUNE_AT: usize = 1024;

/// The engine's single entry point for callers
#[derive(Clone)]
pub struct ManifestationOrchestrator {
    repository: Arc<dyn Repository>,
    catalog: GrabovoiCatalog,
    validator: SettingsValidator,
    quota: QuotaTracker,
    synthesizer: EventSynthesizer,
    rng: Arc<Mutex<Pcg64>>,
    clock: Arc<dyn Clock>,
    user_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ManifestationOrchestrator {
    /// Build with an already-loaded catalog, wall clock and entropy-seeded RNG
    pub fn new(repository: Arc<dyn Repository>, catalog: GrabovoiCatalog, policy: QuotaPolicy) -> Self {
        Self {
            repository,
            catalog,
            validator: SettingsValidator::new(policy),
            quota: QuotaTracker::new(policy),
            synthesizer: EventSynthesizer::new(),
            rng: Arc::new(Mutex::new(Pcg64::from_entropy())),
            clock: Arc::new(SystemClock),
            user_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Load the catalog once from the repository and build the engine
    ///
    /// An empty or malformed catalog aborts startup.
    pub async fn start(repository: Arc<dyn Repository>, policy: QuotaPolicy) -> Result<Self, StartupError> {
        let codes = repository.load_catalog().await?;
        let catalog = GrabovoiCatalog::new(codes)?;
        info!(codes = catalog.len(), "code catalog loaded");
        Ok(Self::new(repository, catalog, policy))
    }

    /// Use a fixed seed for reproducible synthesis
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(Pcg64::seed_from_u64(seed)));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &GrabovoiCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &QuotaPolicy {
        self.quota.policy()
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Generate one manifestation for `user_id`
    pub async fn generate(&self, user_id: &str, tier: UserTier) -> Result<ManifestationEvent, GenerationError> {
        let (event, _) = self.generate_with_status(user_id, tier).await?;
        Ok(event)
    }

    /// Generate, returning the quota as left by this commit
    ///
    /// Dropping the future before the commit starts leaves nothing
    /// written. Once started, the commit runs to completion on its own
    /// task while still holding the user's lock, so it is never torn.
    pub async fn generate_with_status(
        &self,
        user_id: &str,
        tier: UserTier,
    ) -> Result<(ManifestationEvent, QuotaStatus), GenerationError> {
        let guard = self.user_lock(user_id).await.lock_owned().await;

        let now = self.clock.now();

        // CheckQuota
        let usage = self.repository.load_usage(user_id).await?;
        let slot = self.quota.check_and_reserve(tier, &usage, now).map_err(|e| {
            info!(user_id, %tier, used = usage.daily_count, "daily limit reached");
            e
        })?;

        // Synthesize
        let stored = self.repository.load_settings(user_id).await?;
        let settings = self.validator.effective_settings(tier, &stored).map_err(|e| {
            warn!(user_id, error = %e, "stored settings rejected");
            e
        })?;
        let event = {
            let mut rng = self.rng.lock().await;
            self.synthesizer
                .synthesize(&settings, tier, &self.catalog, &mut *rng, now)
                .map_err(|e| {
                    warn!(user_id, error = %e, "stored settings cannot be synthesized");
                    e
                })?
        };

        // CommitQuota + UpdateStats
        let next_usage = self.quota.commit(&usage, now);
        let stats = self.repository.load_stats(user_id).await?;
        let streak = self.quota.next_streak(usage.last_usage_date, slot.day, stats.consecutive_days);
        let next_stats = stats.record(&event, next_usage.daily_count, streak);

        let repository = Arc::clone(&self.repository);
        let owner = user_id.to_string();
        let entry = NotificationEntry::from(&event);
        let commit = tokio::spawn(async move {
            let _guard = guard;
            repository
                .commit_generation(&owner, &usage, &next_usage, &next_stats, &entry)
                .await
        });
        commit
            .await
            .map_err(|e| RepositoryError::Unavailable(format!("commit task aborted: {}", e)))
            .and_then(|result| result)
            .map_err(|e| {
                error!(user_id, error = %e, "manifestation commit failed");
                e
            })?;

        debug!(
            user_id,
            amount = event.amount,
            daily_count = next_usage.daily_count,
            streak,
            "manifestation generated"
        );
        Ok((event, self.quota.status(tier, &next_usage, now)))
    }

    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        if locks.len() >= LOCK_TABLE_PRUNE_AT {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(user_id.to_string()).or_default().clone()
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Validate a draft without storing it
    pub fn validate_settings(
        &self,
        tier: UserTier,
        draft: GenerationSettings,
    ) -> Result<GenerationSettings, ValidationError> {
        self.validator.validate(tier, draft)
    }

    /// Validate and persist a draft, returning what was stored
    pub async fn save_settings(
        &self,
        user_id: &str,
        tier: UserTier,
        draft: GenerationSettings,
    ) -> Result<GenerationSettings, SettingsError> {
        let settings = self.validator.validate(tier, draft)?;

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        self.repository.save_settings(user_id, &settings).await?;

        debug!(user_id, %tier, "settings saved");
        Ok(settings)
    }

    pub async fn settings(&self, user_id: &str) -> Result<GenerationSettings, RepositoryError> {
        self.repository.load_settings(user_id).await
    }

    // =========================================================================
    // Read models
    // =========================================================================

    /// Stored stats with `daily_usage` as of today
    pub async fn stats(&self, user_id: &str) -> Result<AggregateStats, RepositoryError> {
        let mut stats = self.repository.load_stats(user_id).await?;
        let usage = self.repository.load_usage(user_id).await?;
        stats.daily_usage = usage.count_on(self.today());
        Ok(stats)
    }

    pub async fn quota_status(&self, user_id: &str, tier: UserTier) -> Result<QuotaStatus, RepositoryError> {
        let usage = self.repository.load_usage(user_id).await?;
        Ok(self.quota.status(tier, &usage, self.clock.now()))
    }

    /// Most recent generations, newest first
    pub async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<NotificationEntry>, RepositoryError> {
        self.repository.recent_notifications(user_id, limit).await
    }

    pub async fn community_stats(&self) -> Result<CommunityStats, RepositoryError> {
        self.repository.community_totals().await
    }

    // =========================================================================
    // User content
    // =========================================================================

    /// The caller's affirmations, oldest first
    pub async fn affirmations(&self, user_id: &str) -> Result<Vec<CustomAffirmation>, RepositoryError> {
        self.repository.load_affirmations(user_id).await
    }

    /// Validate and append an affirmation, up to `AFFIRMATIONS_PER_USER`
    pub async fn add_affirmation(
        &self,
        user_id: &str,
        draft: AffirmationDraft,
    ) -> Result<CustomAffirmation, SubmissionError> {
        let affirmation = affirmation_from_draft(draft, self.clock.now())?;

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        let mut affirmations = self.repository.load_affirmations(user_id).await?;
        if affirmations.len() >= AFFIRMATIONS_PER_USER {
            return Err(ValidationError::OutOfRange {
                field: "affirmations",
                reason: format!("at most {} per user", AFFIRMATIONS_PER_USER),
            }
            .into());
        }
        affirmations.push(affirmation.clone());
        self.repository.save_affirmations(user_id, &affirmations).await?;

        debug!(user_id, count = affirmations.len(), "affirmation added");
        Ok(affirmation)
    }

    /// Most recent stories from every user
    pub async fn success_stories(&self) -> Result<Vec<SuccessStory>, RepositoryError> {
        self.repository.recent_success_stories(SUCCESS_STORIES_SHOWN).await
    }

    pub async fn submit_success_story(
        &self,
        user_id: &str,
        draft: StoryDraft,
    ) -> Result<SuccessStory, SubmissionError> {
        let story = story_from_draft(user_id, draft, self.clock.now())?;
        self.repository.add_success_story(&story).await?;

        info!(user_id, amount = story.amount, "success story submitted");
        Ok(story)
    }

    // =========================================================================
    // Codes
    // =========================================================================

    /// Today's code, identical for every user
    pub fn code_of_day(&self) -> GrabovoiCode {
        code_of_day(&self.catalog, self.today())
    }

    pub fn code_of_day_on(&self, date: NaiveDate) -> GrabovoiCode {
        code_of_day(&self.catalog, date)
    }

    /// Today's code, counted as one view for `user_id`
    pub async fn record_code_view(&self, user_id: &str) -> Result<GrabovoiCode, RepositoryError> {
        let code = self.code_of_day();

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        let mut stats = self.repository.load_stats(user_id).await?;
        stats.total_code_views += 1;
        self.repository.save_stats(user_id, &stats).await?;

        Ok(code)
    }

    /// Current UTC calendar date
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }
}

impl std::fmt::Debug for ManifestationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestationOrchestrator")
            .field("catalog", &self.catalog.len())
            .field("policy", self.quota.policy())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
