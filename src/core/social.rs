//! User content: custom affirmations and success stories
//!
//! Rules:
//! - text trimmed, non-empty, ≤ 280 chars
//! - code: digits only, ≤ 32
//! - story amount as for settings (positive, finite, cents, ≤ `MAX_AMOUNT`)
//! - story description optional; blank reads as absent, ≤ 500 chars
//!
//! Submissions are stamped with the caller and the engine clock, never
//! with client-supplied values.

use chrono::{DateTime, Utc};
use crate::{AFFIRMATION_MAX_LEN, CODE_MAX_LEN, STORY_DESCRIPTION_MAX_LEN};
use crate::core::validator::normalize_amount;
use crate::types::{
    is_numeric_code, AffirmationDraft, CustomAffirmation, StoryDraft, SuccessStory,
    ValidationError,
};

/// Validate an affirmation draft
pub fn affirmation_from_draft(
    draft: AffirmationDraft,
    now: DateTime<Utc>,
) -> Result<CustomAffirmation, ValidationError> {
    let text = bounded_text("text", &draft.text, AFFIRMATION_MAX_LEN)?
        .ok_or(ValidationError::MissingField { field: "text" })?;
    let code = checked_code(&draft.code)?;

    Ok(CustomAffirmation {
        text,
        code,
        created_at: now,
    })
}

/// Validate a story draft submitted by `user_id`
pub fn story_from_draft(
    user_id: &str,
    draft: StoryDraft,
    now: DateTime<Utc>,
) -> Result<SuccessStory, ValidationError> {
    let amount = draft
        .amount
        .ok_or(ValidationError::MissingField { field: "amount" })?;
    let amount = normalize_amount("amount", amount)?;
    let code = checked_code(&draft.code)?;
    let description = match draft.description {
        Some(text) => bounded_text("description", &text, STORY_DESCRIPTION_MAX_LEN)?,
        None => None,
    };

    Ok(SuccessStory {
        user_id: user_id.to_string(),
        amount,
        code,
        description,
        created_at: now,
    })
}

/// Trimmed text, `None` when blank
fn bounded_text(
    field: &'static str,
    text: &str,
    max_len: usize,
) -> Result<Option<String>, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::OutOfRange {
            field,
            reason: format!("must be at most {} characters", max_len),
        });
    }
    Ok(Some(trimmed.to_string()))
}

fn checked_code(code: &str) -> Result<String, ValidationError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::MissingField { field: "code" });
    }
    if code.len() > CODE_MAX_LEN || !is_numeric_code(code) {
        return Err(ValidationError::OutOfRange {
            field: "code",
            reason: format!("must be 1 to {} digits", CODE_MAX_LEN),
        });
    }
    Ok(code.to_string())
}

// =============================================================================
// TESTS
// =============================================================================
