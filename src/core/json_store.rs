//! JSON file repository
//!
//! One pretty-printed document per user under `<dir>/users/`, named by the
//! SHA-256 of the user id. Every write replaces the whole document through
//! a temp file and rename, so usage and stats always land together.
//! Success stories live in `<dir>/stories.json`. An optional
//! `<dir>/catalog.json` overrides the built-in code list.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use serde::Serialize;
use crate::core::repository::{
    newest_stories, push_story, sum_community, Repository, UserRecord,
};
use crate::types::{
    AggregateStats, CommunityStats, CustomAffirmation, GenerationSettings, GrabovoiCatalog,
    GrabovoiCode, NotificationEntry, RepositoryError, SuccessStory, UsageRecord,
};

/// File-backed repository
#[derive(Debug)]
pub struct JsonFileRepository {
    dir: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileRepository {
    /// Open (and create if needed) a data directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dir = dir.into();
        std::fs::create_dir_all(dir.join("users"))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn user_path(&self, user_id: &str) -> PathBuf {
        let digest: [u8; 32] = Sha256::digest(user_id.as_bytes()).into();
        let name: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        self.dir.join("users").join(format!("{}.json", name))
    }

    async fn load_record(&self, user_id: &str) -> Result<UserRecord, RepositoryError> {
        load_record_file(&self.user_path(user_id), user_id).await
    }

    async fn save_record(&self, record: &UserRecord) -> Result<(), RepositoryError> {
        write_json(&self.user_path(&record.user_id), record).await
    }

    fn stories_path(&self) -> PathBuf {
        self.dir.join("stories.json")
    }

    async fn load_stories(&self) -> Result<Vec<SuccessStory>, RepositoryError> {
        match tokio::fs::read_to_string(self.stories_path()).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserRecord) + Send,
    ) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.load_record(user_id).await?;
        f(&mut record);
        self.save_record(&record).await
    }
}

/// Replace `path` through a temp file and rename
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RepositoryError> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Load a user document, defaulting when absent
async fn load_record_file(path: &Path, user_id: &str) -> Result<UserRecord, RepositoryError> {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => Ok(serde_json::from_str(&json)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UserRecord::new(user_id)),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Repository for JsonFileRepository {
    async fn load_settings(&self, user_id: &str) -> Result<GenerationSettings, RepositoryError> {
        Ok(self.load_record(user_id).await?.settings)
    }

    async fn save_settings(
        &self,
        user_id: &str,
        settings: &GenerationSettings,
    ) -> Result<(), RepositoryError> {
        let settings = settings.clone();
        self.update(user_id, move |r| r.settings = settings).await
    }

    async fn load_usage(&self, user_id: &str) -> Result<UsageRecord, RepositoryError> {
        Ok(self.load_record(user_id).await?.usage)
    }

    async fn save_usage(&self, user_id: &str, usage: &UsageRecord) -> Result<(), RepositoryError> {
        let usage = *usage;
        self.update(user_id, move |r| r.usage = usage).await
    }

    async fn load_stats(&self, user_id: &str) -> Result<AggregateStats, RepositoryError> {
        Ok(self.load_record(user_id).await?.stats)
    }

    async fn save_stats(&self, user_id: &str, stats: &AggregateStats) -> Result<(), RepositoryError> {
        let stats = *stats;
        self.update(user_id, move |r| r.stats = stats).await
    }

    async fn append_notification(
        &self,
        user_id: &str,
        entry: &NotificationEntry,
    ) -> Result<(), RepositoryError> {
        let entry = entry.clone();
        self.update(user_id, move |r| r.push_history(entry)).await
    }

    async fn recent_notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<NotificationEntry>, RepositoryError> {
        Ok(self.load_record(user_id).await?.recent(limit))
    }

    async fn community_totals(&self) -> Result<CommunityStats, RepositoryError> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(self.dir.join("users")).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let json = tokio::fs::read_to_string(&path).await?;
            records.push(serde_json::from_str::<UserRecord>(&json)?);
        }
        Ok(sum_community(records.iter()))
    }

    async fn load_affirmations(&self, user_id: &str) -> Result<Vec<CustomAffirmation>, RepositoryError> {
        Ok(self.load_record(user_id).await?.affirmations)
    }

    async fn save_affirmations(
        &self,
        user_id: &str,
        affirmations: &[CustomAffirmation],
    ) -> Result<(), RepositoryError> {
        let affirmations = affirmations.to_vec();
        self.update(user_id, move |r| r.affirmations = affirmations).await
    }

    async fn add_success_story(&self, story: &SuccessStory) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut stories = self.load_stories().await?;
        push_story(&mut stories, story.clone());
        write_json(&self.stories_path(), &stories).await
    }

    async fn recent_success_stories(&self, limit: usize) -> Result<Vec<SuccessStory>, RepositoryError> {
        Ok(newest_stories(&self.load_stories().await?, limit))
    }

    async fn load_catalog(&self) -> Result<Vec<GrabovoiCode>, RepositoryError> {
        let path = self.dir.join("catalog.json");
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(GrabovoiCatalog::builtin().codes().to_vec())
            }
            Err(e) => Err(e.into()),
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
        let (usage, stats, entry) = (*usage, *stats, entry.clone());
        self.update(user_id, move |r| {
            r.usage = usage;
            r.stats = stats;
            r.push_history(entry);
        })
        .await
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "digimanifest_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn test_round_trip_user_document() {
        let dir = temp_dir("round_trip");
        let repo = JsonFileRepository::open(&dir).unwrap();

        let settings = GenerationSettings::with_range(5.0, 50.0);
        repo.save_settings("alice", &settings).await.unwrap();
        let usage = UsageRecord::new(3, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        repo.save_usage("alice", &usage).await.unwrap();

        // Fresh handle reads what the first wrote
        let reopened = JsonFileRepository::open(&dir).unwrap();
        assert_eq!(reopened.load_settings("alice").await.unwrap(), settings);
        assert_eq!(reopened.load_usage("alice").await.unwrap(), usage);
        assert_eq!(reopened.load_stats("bob").await.unwrap(), AggregateStats::default());

        let totals = reopened.community_totals().await.unwrap();
        assert_eq!(totals.total_users, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_catalog_file_override() {
        let dir = temp_dir("catalog");
        let repo = JsonFileRepository::open(&dir).unwrap();
        assert_eq!(repo.load_catalog().await.unwrap().len(), 6);

        std::fs::write(dir.join("catalog.json"), r#"[{"code": "777", "label": "Lucky"}]"#).unwrap();
        let codes = repo.load_catalog().await.unwrap();
        assert_eq!(codes, vec![GrabovoiCode::new("777", "Lucky")]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_stories_and_affirmations_persist() {
        let dir = temp_dir("social");
        let repo = JsonFileRepository::open(&dir).unwrap();
        assert!(repo.recent_success_stories(10).await.unwrap().is_empty());

        let at = Utc.with_ymd_and_hms(2024, 7, 4, 12, 0, 0).unwrap();
        let story = SuccessStory {
            user_id: "alice".to_string(),
            amount: 42.0,
            code: "5207418".to_string(),
            description: Some("Refund".to_string()),
            created_at: at,
        };
        repo.add_success_story(&story).await.unwrap();
        let affirmation = CustomAffirmation {
            text: "Abundance".to_string(),
            code: "426499".to_string(),
            created_at: at,
        };
        repo.save_affirmations("alice", &[affirmation.clone()]).await.unwrap();

        let reopened = JsonFileRepository::open(&dir).unwrap();
        assert_eq!(reopened.recent_success_stories(10).await.unwrap(), vec![story]);
        assert_eq!(reopened.load_affirmations("alice").await.unwrap(), vec![affirmation]);

        // Stories file is not mistaken for a user document
        assert_eq!(reopened.community_totals().await.unwrap().total_users, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = temp_dir("corrupt");
        let repo = JsonFileRepository::open(&dir).unwrap();
        std::fs::write(repo.user_path("eve"), "{ not json").unwrap();

        assert!(matches!(
            repo.load_usage("eve").await,
            Err(RepositoryError::Serialization(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
