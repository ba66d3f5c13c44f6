//! Repository seam to the persistence collaborator
//!
//! Absent users read as defaults. `commit_generation` is the only write on
//! the generation path; backends that can write usage and stats together
//! should override it. Success stories are shared across users and kept
//! up to `STORY_CAPACITY`, oldest dropped first.

use std::collections::HashMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, warn};
use crate::types::{
    AggregateStats, CommunityStats, CustomAffirmation, GenerationSettings, GrabovoiCatalog,
    GrabovoiCode, NotificationEntry, RepositoryError, SuccessStory, UsageRecord, round_cents,
};

/// Generation log entries kept per user
pub const HISTORY_CAPACITY: usize = 200;

/// Success stories retained in storage
pub const STORY_CAPACITY: usize = 1000;

/// Storage interface consumed by the orchestrator
#[async_trait]
pub trait Repository: Send + Sync {
    async fn load_settings(&self, user_id: &str) -> Result<GenerationSettings, RepositoryError>;

    async fn save_settings(
        &self,
        user_id: &str,
        settings: &GenerationSettings,
    ) -> Result<(), RepositoryError>;

    async fn load_usage(&self, user_id: &str) -> Result<UsageRecord, RepositoryError>;

    async fn save_usage(&self, user_id: &str, usage: &UsageRecord) -> Result<(), RepositoryError>;

    async fn load_stats(&self, user_id: &str) -> Result<AggregateStats, RepositoryError>;

    async fn save_stats(&self, user_id: &str, stats: &AggregateStats) -> Result<(), RepositoryError>;

    async fn append_notification(
        &self,
        user_id: &str,
        entry: &NotificationEntry,
    ) -> Result<(), RepositoryError>;

    /// Newest first, at most `limit`
    async fn recent_notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<NotificationEntry>, RepositoryError>;

    async fn community_totals(&self) -> Result<CommunityStats, RepositoryError>;

    /// Oldest first
    async fn load_affirmations(&self, user_id: &str) -> Result<Vec<CustomAffirmation>, RepositoryError>;

    async fn save_affirmations(
        &self,
        user_id: &str,
        affirmations: &[CustomAffirmation],
    ) -> Result<(), RepositoryError>;

    async fn add_success_story(&self, story: &SuccessStory) -> Result<(), RepositoryError>;

    /// Newest `created_at` first, at most `limit`
    async fn recent_success_stories(&self, limit: usize) -> Result<Vec<SuccessStory>, RepositoryError>;

    /// Called once at startup
    async fn load_catalog(&self) -> Result<Vec<GrabovoiCode>, RepositoryError> {
        Ok(GrabovoiCatalog::builtin().codes().to_vec())
    }

    /// Write usage and stats for one generation, all or nothing
    ///
    /// Writes usage then stats; if stats fail, `previous` usage is written
    /// back before the error is returned. The log append happens after the
    /// commit and does not fail it.
    ///
    /// If the rollback write also fails, the new usage stays stored without
    /// matching stats and only an error is logged. This default cannot
    /// promise the prior state survives a failed commit; backends able to
    /// write both records in one step should override it.
    async fn commit_generation(
        &self,
        user_id: &str,
        previous: &UsageRecord,
        usage: &UsageRecord,
        stats: &AggregateStats,
        entry: &NotificationEntry,
    ) -> Result<(), RepositoryError> {
        self.save_usage(user_id, usage).await?;

        if let Err(e) = self.save_stats(user_id, stats).await {
            if let Err(rollback) = self.save_usage(user_id, previous).await {
                error!(user_id, error = %rollback, "usage rollback failed after stats write error");
            }
            return Err(e);
        }

        if let Err(e) = self.append_notification(user_id, entry).await {
            warn!(user_id, error = %e, "notification log append failed");
        }

        Ok(())
    }
}

/// Everything stored for one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub user_id: String,
    pub settings: GenerationSettings,
    pub usage: UsageRecord,
    pub stats: AggregateStats,
    /// Oldest first, capped at `HISTORY_CAPACITY`
    pub history: Vec<NotificationEntry>,
    pub affirmations: Vec<CustomAffirmation>,
}

impl UserRecord {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Self::default()
        }
    }

    /// Append to the log, dropping the oldest entries past capacity
    pub fn push_history(&mut self, entry: NotificationEntry) {
        self.history.push(entry);
        if self.history.len() > HISTORY_CAPACITY {
            let excess = self.history.len() - HISTORY_CAPACITY;
            self.history.drain(0..excess);
        }
    }

    pub fn recent(&self, limit: usize) -> Vec<NotificationEntry> {
        self.history.iter().rev().take(limit).cloned().collect()
    }
}

/// Fold per-user stats into community totals
pub fn sum_community<'a>(records: impl Iterator<Item = &'a UserRecord>) -> CommunityStats {
    let mut totals = CommunityStats::default();
    for record in records {
        totals.total_users += 1;
        totals.total_manifested += record.stats.total_manifested;
        totals.notifications_sent += record.stats.sessions_count;
    }
    totals.total_manifested = round_cents(totals.total_manifested);
    totals
}

/// Append a story, dropping the oldest past `STORY_CAPACITY`
pub fn push_story(stories: &mut Vec<SuccessStory>, story: SuccessStory) {
    stories.push(story);
    if stories.len() > STORY_CAPACITY {
        let excess = stories.len() - STORY_CAPACITY;
        stories.drain(0..excess);
    }
}

/// Newest first; ties keep the later submission first
pub fn newest_stories(stories: &[SuccessStory], limit: usize) -> Vec<SuccessStory> {
    let mut recent: Vec<SuccessStory> = stories.iter().rev().cloned().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(limit);
    recent
}

/// Process-local repository
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<String, UserRecord>>,
    stories: RwLock<Vec<SuccessStory>>,
    catalog: Option<Vec<GrabovoiCode>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a specific catalog from `load_catalog`
    pub fn with_catalog(codes: Vec<GrabovoiCode>) -> Self {
        Self {
            catalog: Some(codes),
            ..Self::default()
        }
    }

    async fn read<T>(&self, user_id: &str, f: impl FnOnce(&UserRecord) -> T) -> T {
        let users = self.users.read().await;
        match users.get(user_id) {
            Some(record) => f(record),
            None => f(&UserRecord::new(user_id)),
        }
    }

    async fn write(&self, user_id: &str, f: impl FnOnce(&mut UserRecord)) {
        let mut users = self.users.write().await;
        let record = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord::new(user_id));
        f(record);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn load_settings(&self, user_id: &str) -> Result<GenerationSettings, RepositoryError> {
        Ok(self.read(user_id, |r| r.settings.clone()).await)
    }

    async fn save_settings(
        &self,
        user_id: &str,
        settings: &GenerationSettings,
    ) -> Result<(), RepositoryError> {
        self.write(user_id, |r| r.settings = settings.clone()).await;
        Ok(())
    }

    async fn load_usage(&self, user_id: &str) -> Result<UsageRecord, RepositoryError> {
        Ok(self.read(user_id, |r| r.usage).await)
    }

    async fn save_usage(&self, user_id: &str, usage: &UsageRecord) -> Result<(), RepositoryError> {
        self.write(user_id, |r| r.usage = *usage).await;
        Ok(())
    }

    async fn load_stats(&self, user_id: &str) -> Result<AggregateStats, RepositoryError> {
        Ok(self.read(user_id, |r| r.stats).await)
    }

    async fn save_stats(&self, user_id: &str, stats: &AggregateStats) -> Result<(), RepositoryError> {
        self.write(user_id, |r| r.stats = *stats).await;
        Ok(())
    }

    async fn append_notification(
        &self,
        user_id: &str,
        entry: &NotificationEntry,
    ) -> Result<(), RepositoryError> {
        self.write(user_id, |r| r.push_history(entry.clone())).await;
        Ok(())
    }

    async fn recent_notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<NotificationEntry>, RepositoryError> {
        Ok(self.read(user_id, |r| r.recent(limit)).await)
    }

    async fn community_totals(&self) -> Result<CommunityStats, RepositoryError> {
        let users = self.users.read().await;
        Ok(sum_community(users.values()))
    }

    async fn load_affirmations(&self, user_id: &str) -> Result<Vec<CustomAffirmation>, RepositoryError> {
        Ok(self.read(user_id, |r| r.affirmations.clone()).await)
    }

    async fn save_affirmations(
        &self,
        user_id: &str,
        affirmations: &[CustomAffirmation],
    ) -> Result<(), RepositoryError> {
        self.write(user_id, |r| r.affirmations = affirmations.to_vec()).await;
        Ok(())
    }

    async fn add_success_story(&self, story: &SuccessStory) -> Result<(), RepositoryError> {
        push_story(&mut *self.stories.write().await, story.clone());
        Ok(())
    }

    async fn recent_success_stories(&self, limit: usize) -> Result<Vec<SuccessStory>, RepositoryError> {
        Ok(newest_stories(&self.stories.read().await, limit))
    }

    async fn load_catalog(&self) -> Result<Vec<GrabovoiCode>, RepositoryError> {
        match &self.catalog {
            Some(codes) => Ok(codes.clone()),
            None => Ok(GrabovoiCatalog::builtin().codes().to_vec()),
        }
    }

    async fn commit_generation(
        &self,
        user_id: &str,
        _previous: &UsageRecord,
        usage: &UsageRecord,
        stats: &AggregateStats,
        entry: &NotificationEntry,
    ) -> Result<(), RepositoryError> {
        self.write(user_id, |r| {
            r.usage = *usage;
            r.stats = *stats;
            r.push_history(entry.clone());
        })
        .await;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
