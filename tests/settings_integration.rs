//! Integration tests for settings
//!
//! Tests validation and persistence of generation settings

use std::sync::Arc;

use pretty_assertions::assert_eq;

use digimanifest::core::{InMemoryRepository, ManifestationOrchestrator, QuotaPolicy};
use digimanifest::types::{
    BankSelection, GenerationSettings, GrabovoiCatalog, ManifestationType, SenderMode,
    SettingsError, UserTier, ValidationError,
};

fn orchestrator() -> ManifestationOrchestrator {
    ManifestationOrchestrator::new(
        Arc::new(InMemoryRepository::new()),
        GrabovoiCatalog::builtin(),
        QuotaPolicy::default(),
    )
}

#[test]
fn test_min_above_max_is_out_of_range() {
    let result = orchestrator().validate_settings(UserTier::Pro, GenerationSettings::with_range(50.0, 10.0));
    assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
}

#[test]
fn test_free_max_above_ceiling_is_tier_limit() {
    let result = orchestrator().validate_settings(UserTier::Free, GenerationSettings::with_range(10.0, 150.0));
    assert!(matches!(
        result,
        Err(ValidationError::TierLimitExceeded { field: "max_amount", tier: UserTier::Free, .. })
    ));

    // Same draft is fine for Pro
    assert!(orchestrator()
        .validate_settings(UserTier::Pro, GenerationSettings::with_range(10.0, 150.0))
        .is_ok());
}

#[test]
fn test_custom_sender_requires_a_name() {
    let draft = GenerationSettings {
        sender_mode: SenderMode::Custom,
        custom_sender: Some("   ".to_string()),
        ..GenerationSettings::default()
    };
    let result = orchestrator().validate_settings(UserTier::Free, draft);
    assert_eq!(result, Err(ValidationError::MissingField { field: "custom_sender" }));
}

#[test]
fn test_defaults_are_valid_for_every_tier() {
    for tier in [UserTier::Free, UserTier::Pro] {
        let validated = orchestrator()
            .validate_settings(tier, GenerationSettings::default())
            .unwrap();
        assert_eq!(validated, GenerationSettings::default());
    }
}

#[test]
fn test_pro_toggles_accepted_for_free() {
    let draft = GenerationSettings {
        grabovoi_enabled: true,
        subliminal_enabled: true,
        spaced_repetition: true,
        circadian_optimized: true,
        twenty_one_day_cycle: true,
        ..GenerationSettings::default()
    };
    let validated = orchestrator().validate_settings(UserTier::Free, draft.clone()).unwrap();
    assert_eq!(validated, draft);
}

#[tokio::test]
async fn test_save_then_read_back_normalized() {
    let orchestrator = orchestrator();
    let draft = GenerationSettings {
        min_amount: 12.346,
        max_amount: 80.0,
        sender_mode: SenderMode::Custom,
        custom_sender: Some(" Aunt May ".to_string()),
        bank_selection: BankSelection::FixedList(
            [" Chase ".to_string(), "".to_string()].into_iter().collect(),
        ),
        ..GenerationSettings::default()
    };

    let saved = orchestrator.save_settings("u", UserTier::Free, draft).await.unwrap();
    assert_eq!(saved.min_amount, 12.35);
    assert_eq!(saved.custom_sender.as_deref(), Some("Aunt May"));
    assert_eq!(
        saved.bank_selection,
        BankSelection::FixedList(["Chase".to_string()].into_iter().collect())
    );

    assert_eq!(orchestrator.settings("u").await.unwrap(), saved);
}

#[tokio::test]
async fn test_rejected_save_keeps_previous_settings() {
    let orchestrator = orchestrator();
    let first = orchestrator
        .save_settings("u", UserTier::Free, GenerationSettings::with_range(5.0, 25.0))
        .await
        .unwrap();

    let bad = GenerationSettings {
        manifestation_type: ManifestationType::FixedCategory(Default::default()),
        ..GenerationSettings::default()
    };
    let result = orchestrator.save_settings("u", UserTier::Free, bad).await;
    assert!(matches!(
        result,
        Err(SettingsError::Invalid(ValidationError::MissingField { field: "manifestation_type" }))
    ));

    assert_eq!(orchestrator.settings("u").await.unwrap(), first);
}

#[tokio::test]
async fn test_unknown_user_reads_defaults() {
    let orchestrator = orchestrator();
    assert_eq!(orchestrator.settings("ghost").await.unwrap(), GenerationSettings::default());
    let stats = orchestrator.stats("ghost").await.unwrap();
    assert_eq!(stats.sessions_count, 0);
    assert_eq!(stats.daily_usage, 0);
}
