//! Settings Validator: normalizes and bounds-checks generation settings
//!
//! Rules:
//! - amounts finite, positive, at most `MAX_AMOUNT`, rounded to cents, min ≤ max
//! - Free tier: max ≤ policy ceiling (rejected, never clamped)
//! - frequency > 0, volume ≤ 100
//! - Custom sender: trimmed, non-empty, ≤ 64 chars
//! - fixed bank/category sets non-empty
//! - Pro-only toggles are accepted for every tier

use std::collections::BTreeSet;
use crate::{CUSTOM_SENDER_MAX_LEN, LABEL_MAX_LEN, MAX_AMOUNT, MAX_VOLUME};
use crate::core::quota::QuotaPolicy;
use crate::types::{
    round_cents, BankSelection, GenerationSettings, ManifestationType, SenderMode,
    UserTier, ValidationError,
};

/// Settings validator
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsValidator {
    policy: QuotaPolicy,
}

impl SettingsValidator {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self { policy }
    }

    /// Validate a draft for `tier`, returning the normalized settings to persist
    pub fn validate(
        &self,
        tier: UserTier,
        draft: GenerationSettings,
    ) -> Result<GenerationSettings, ValidationError> {
        let mut settings = draft;

        settings.min_amount = normalize_amount("min_amount", settings.min_amount)?;
        settings.max_amount = normalize_amount("max_amount", settings.max_amount)?;
        check_range(&settings)?;

        if let Some(limit) = self.policy.max_amount(tier) {
            if settings.max_amount > limit {
                return Err(ValidationError::TierLimitExceeded {
                    field: "max_amount",
                    tier,
                    limit,
                });
            }
        }

        if settings.frequency_seconds == 0 {
            return Err(ValidationError::OutOfRange {
                field: "frequency_seconds",
                reason: "must be positive".to_string(),
            });
        }

        if settings.volume > MAX_VOLUME {
            return Err(ValidationError::OutOfRange {
                field: "volume",
                reason: format!("must be at most {}", MAX_VOLUME),
            });
        }

        settings.custom_sender = settings
            .custom_sender
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if settings.sender_mode == SenderMode::Custom {
            let usable = settings
                .custom_sender
                .as_ref()
                .map(|s| s.chars().count() <= CUSTOM_SENDER_MAX_LEN)
                .unwrap_or(false);
            if !usable {
                return Err(ValidationError::MissingField { field: "custom_sender" });
            }
        }

        settings.bank_selection = match settings.bank_selection {
            BankSelection::Random => BankSelection::Random,
            BankSelection::FixedList(banks) => BankSelection::FixedList(normalize_banks(banks)?),
        };

        if let ManifestationType::FixedCategory(categories) = &settings.manifestation_type {
            if categories.is_empty() {
                return Err(ValidationError::MissingField { field: "manifestation_type" });
            }
        }

        Ok(settings)
    }

    /// Settings to synthesize from, given what is stored
    ///
    /// Stored settings are not re-validated, only checked for unsafe
    /// bounds. A Free user whose stored maximum predates a downgrade gets
    /// the tier ceiling instead.
    pub fn effective_settings(
        &self,
        tier: UserTier,
        stored: &GenerationSettings,
    ) -> Result<GenerationSettings, ValidationError> {
        let mut settings = stored.clone();

        if !positive_finite(settings.min_amount) {
            return Err(out_of_range("min_amount", "must be a positive number"));
        }
        if !positive_finite(settings.max_amount) {
            return Err(out_of_range("max_amount", "must be a positive number"));
        }
        if settings.max_amount > MAX_AMOUNT {
            return Err(above_ceiling("max_amount"));
        }

        if let Some(limit) = self.policy.max_amount(tier) {
            settings.max_amount = settings.max_amount.min(limit);
        }
        check_range(&settings)?;

        Ok(settings)
    }
}

fn positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn out_of_range(field: &'static str, reason: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field,
        reason: reason.to_string(),
    }
}

/// Round to cents and require a positive result
pub(crate) fn normalize_amount(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(out_of_range(field, "must be a finite number"));
    }
    if value > MAX_AMOUNT {
        return Err(above_ceiling(field));
    }
    let rounded = round_cents(value);
    if rounded <= 0.0 {
        return Err(out_of_range(field, "must be positive"));
    }
    Ok(rounded)
}

fn above_ceiling(field: &'static str) -> ValidationError {
    ValidationError::OutOfRange {
        field,
        reason: format!("must be at most {:.2}", MAX_AMOUNT),
    }
}

fn check_range(settings: &GenerationSettings) -> Result<(), ValidationError> {
    if settings.min_amount > settings.max_amount {
        return Err(ValidationError::OutOfRange {
            field: "min_amount",
            reason: format!(
                "{:.2} exceeds max_amount {:.2}",
                settings.min_amount, settings.max_amount
            ),
        });
    }
    Ok(())
}

fn normalize_banks(banks: BTreeSet<String>) -> Result<BTreeSet<String>, ValidationError> {
    let mut normalized = BTreeSet::new();
    for bank in banks {
        let name = bank.trim();
        if name.is_empty() {
            continue;
        }
        if name.chars().count() > LABEL_MAX_LEN {
            return Err(ValidationError::OutOfRange {
                field: "bank_selection",
                reason: format!("bank names are limited to {} characters", LABEL_MAX_LEN),
            });
        }
        normalized.insert(name.to_string());
    }

    if normalized.is_empty() {
        return Err(ValidationError::MissingField { field: "bank_selection" });
    }
    Ok(normalized)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use pretty_assertions::assert_eq;

    fn validator() -> SettingsValidator {
        SettingsValidator::default()
    }

    #[test]
    fn test_default_settings_valid_for_both_tiers() {
        let v = validator();
        assert!(v.validate(UserTier::Free, GenerationSettings::default()).is_ok());
        assert!(v.validate(UserTier::Pro, GenerationSettings::default()).is_ok());
    }

    #[test]
    fn test_min_above_max_rejected() {
        let result = validator().validate(UserTier::Pro, GenerationSettings::with_range(50.0, 10.0));
        assert!(matches!(
            result,
            Err(ValidationError::OutOfRange { field: "min_amount", .. })
        ));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let v = validator();
        for (min, max) in [(0.0, 10.0), (-5.0, 10.0), (0.001, 10.0)] {
            let result = v.validate(UserTier::Pro, GenerationSettings::with_range(min, max));
            assert!(
                matches!(result, Err(ValidationError::OutOfRange { field: "min_amount", .. })),
                "min={} should be rejected",
                min
            );
        }

        let result = v.validate(UserTier::Pro, GenerationSettings::with_range(1.0, f64::NAN));
        assert!(matches!(
            result,
            Err(ValidationError::OutOfRange { field: "max_amount", .. })
        ));
    }

    #[test]
    fn test_free_tier_max_ceiling() {
        let result = validator().validate(UserTier::Free, GenerationSettings::with_range(10.0, 150.0));
        assert_eq!(
            result,
            Err(ValidationError::TierLimitExceeded {
                field: "max_amount",
                tier: UserTier::Free,
                limit: 100.0,
            })
        );

        // Exactly at the ceiling is fine
        assert!(validator()
            .validate(UserTier::Free, GenerationSettings::with_range(10.0, 100.0))
            .is_ok());
    }

    #[test]
    fn test_pro_has_no_max_ceiling() {
        let settings = validator()
            .validate(UserTier::Pro, GenerationSettings::with_range(10.0, 5000.0))
            .unwrap();
        assert_eq!(settings.max_amount, 5000.0);
    }

    #[test]
    fn test_amount_ceiling_applies_to_pro() {
        let v = validator();
        let at_ceiling = v
            .validate(UserTier::Pro, GenerationSettings::with_range(MAX_AMOUNT, MAX_AMOUNT))
            .unwrap();
        assert_eq!(at_ceiling.max_amount, MAX_AMOUNT);

        for (min, max) in [(10.0, MAX_AMOUNT + 1.0), (1e20, 1e20)] {
            let result = v.validate(UserTier::Pro, GenerationSettings::with_range(min, max));
            assert!(
                matches!(result, Err(ValidationError::OutOfRange { .. })),
                "({}, {}) should be rejected",
                min,
                max
            );
        }

        // Stored values past the ceiling fail closed
        assert!(v
            .effective_settings(UserTier::Pro, &GenerationSettings::with_range(1e20, 1e20))
            .is_err());
        assert!(v
            .effective_settings(UserTier::Pro, &GenerationSettings::with_range(1.0, MAX_AMOUNT))
            .is_ok());
    }

    #[test]
    fn test_amounts_rounded_to_cents() {
        let settings = validator()
            .validate(UserTier::Pro, GenerationSettings::with_range(10.004, 20.456))
            .unwrap();
        assert_eq!(settings.min_amount, 10.0);
        assert_eq!(settings.max_amount, 20.46);
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let draft = GenerationSettings {
            frequency_seconds: 0,
            ..GenerationSettings::default()
        };
        assert!(matches!(
            validator().validate(UserTier::Free, draft),
            Err(ValidationError::OutOfRange { field: "frequency_seconds", .. })
        ));
    }

    #[test]
    fn test_volume_ceiling() {
        let draft = GenerationSettings {
            volume: 101,
            ..GenerationSettings::default()
        };
        assert!(matches!(
            validator().validate(UserTier::Free, draft),
            Err(ValidationError::OutOfRange { field: "volume", .. })
        ));
    }

    #[test]
    fn test_custom_sender_required() {
        let v = validator();
        for sender in [None, Some(""), Some("   ")] {
            let draft = GenerationSettings {
                sender_mode: SenderMode::Custom,
                custom_sender: sender.map(String::from),
                ..GenerationSettings::default()
            };
            assert_eq!(
                v.validate(UserTier::Free, draft),
                Err(ValidationError::MissingField { field: "custom_sender" })
            );
        }
    }

    #[test]
    fn test_custom_sender_length() {
        let v = validator();
        let ok = GenerationSettings {
            sender_mode: SenderMode::Custom,
            custom_sender: Some(format!("  {}  ", "a".repeat(64))),
            ..GenerationSettings::default()
        };
        let settings = v.validate(UserTier::Free, ok).unwrap();
        assert_eq!(settings.custom_sender.as_deref().map(str::len), Some(64));

        let too_long = GenerationSettings {
            sender_mode: SenderMode::Custom,
            custom_sender: Some("a".repeat(65)),
            ..GenerationSettings::default()
        };
        assert_eq!(
            v.validate(UserTier::Free, too_long),
            Err(ValidationError::MissingField { field: "custom_sender" })
        );
    }

    #[test]
    fn test_pro_toggles_accepted_on_free() {
        let draft = GenerationSettings {
            grabovoi_enabled: true,
            subliminal_enabled: true,
            ..GenerationSettings::default()
        };
        let settings = validator().validate(UserTier::Free, draft).unwrap();
        assert!(settings.grabovoi_enabled);
        assert!(settings.subliminal_enabled);
    }

    #[test]
    fn test_bank_list_normalized() {
        let banks: BTreeSet<String> = [" Chase Bank ", "", "Ally Bank"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let draft = GenerationSettings {
            bank_selection: BankSelection::FixedList(banks),
            ..GenerationSettings::default()
        };
        let settings = validator().validate(UserTier::Free, draft).unwrap();

        let expected: BTreeSet<String> = ["Ally Bank", "Chase Bank"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(settings.bank_selection, BankSelection::FixedList(expected));
    }

    #[test]
    fn test_empty_sets_rejected() {
        let v = validator();
        let banks = GenerationSettings {
            bank_selection: BankSelection::FixedList(BTreeSet::new()),
            ..GenerationSettings::default()
        };
        assert_eq!(
            v.validate(UserTier::Free, banks),
            Err(ValidationError::MissingField { field: "bank_selection" })
        );

        let categories = GenerationSettings {
            manifestation_type: ManifestationType::FixedCategory(BTreeSet::new()),
            ..GenerationSettings::default()
        };
        assert_eq!(
            v.validate(UserTier::Free, categories),
            Err(ValidationError::MissingField { field: "manifestation_type" })
        );

        let one = GenerationSettings {
            manifestation_type: ManifestationType::FixedCategory(
                [Category::Bonus].into_iter().collect(),
            ),
            ..GenerationSettings::default()
        };
        assert!(v.validate(UserTier::Free, one).is_ok());
    }

    #[test]
    fn test_effective_settings_clamp_after_downgrade() {
        let stored = GenerationSettings::with_range(10.0, 1000.0);
        let effective = validator().effective_settings(UserTier::Free, &stored).unwrap();
        assert_eq!(effective.max_amount, 100.0);

        let pro = validator().effective_settings(UserTier::Pro, &stored).unwrap();
        assert_eq!(pro.max_amount, 1000.0);
    }

    #[test]
    fn test_effective_settings_fail_closed() {
        let v = validator();
        assert!(v
            .effective_settings(UserTier::Pro, &GenerationSettings::with_range(50.0, 10.0))
            .is_err());
        assert!(v
            .effective_settings(UserTier::Pro, &GenerationSettings::with_range(-1.0, 10.0))
            .is_err());
        // Range entirely above the Free ceiling cannot be honoured
        assert!(v
            .effective_settings(UserTier::Free, &GenerationSettings::with_range(500.0, 1000.0))
            .is_err());
    }
}
