//! User-authored content: custom affirmations and success stories

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A personal affirmation paired with a code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAffirmation {
    pub text: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

/// Incoming affirmation, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AffirmationDraft {
    pub text: String,
    pub code: String,
}

/// A reported result, shared with every user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessStory {
    pub user_id: String,
    pub amount: f64,
    pub code: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Incoming story, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoryDraft {
    pub amount: Option<f64>,
    pub code: String,
    pub description: Option<String>,
}

/// What other users see of a story
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicStory {
    pub amount: f64,
    pub code: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&SuccessStory> for PublicStory {
    fn from(story: &SuccessStory) -> Self {
        Self {
            amount: story.amount,
            code: story.code.clone(),
            description: story.description.clone(),
            created_at: story.created_at,
        }
    }
}
