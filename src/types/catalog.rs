//! Grabovoi code catalog
//!
//! Loaded once at startup and shared read-only by the daily code selector
//! and the synthesizer. Cloning is a reference-count bump.

use std::sync::Arc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::types::ConfigurationError;

lazy_static! {
    static ref RE_NUMERIC_CODE: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// True for a non-empty run of ASCII digits
pub fn is_numeric_code(code: &str) -> bool {
    RE_NUMERIC_CODE.is_match(code)
}

/// A numeric code with its label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrabovoiCode {
    pub code: String,
    pub label: String,
}

impl GrabovoiCode {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Immutable, ordered, non-empty code catalog
#[derive(Debug, Clone)]
pub struct GrabovoiCatalog {
    codes: Arc<[GrabovoiCode]>,
}

impl GrabovoiCatalog {
    /// Build a catalog, rejecting empty lists and non-numeric codes
    pub fn new(codes: Vec<GrabovoiCode>) -> Result<Self, ConfigurationError> {
        if codes.is_empty() {
            return Err(ConfigurationError::EmptyCatalog);
        }

        if let Some(bad) = codes.iter().find(|c| !is_numeric_code(&c.code)) {
            return Err(ConfigurationError::InvalidCode(bad.code.clone()));
        }

        Ok(Self { codes: codes.into() })
    }

    /// The six money codes the service ships with
    pub fn builtin() -> Self {
        let codes: Vec<GrabovoiCode> = BUILTIN_CODES
            .iter()
            .map(|(code, label)| GrabovoiCode::new(*code, *label))
            .collect();
        Self { codes: codes.into() }
    }

    pub fn codes(&self) -> &[GrabovoiCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Always false for a constructed catalog
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GrabovoiCode> {
        self.codes.get(index)
    }

    pub fn contains(&self, code: &GrabovoiCode) -> bool {
        self.codes.iter().any(|c| c == code)
    }
}

const BUILTIN_CODES: [(&str, &str); 6] = [
    ("5207418", "Unexpected Money"),
    ("426499", "Immediate Money"),
    ("318612518714", "Constant Flow"),
    ("199621147", "Money Magnet"),
    ("51849617", "Financial Independence"),
    ("9707411", "Business Success"),
];

// =============================================================================
// TESTS
// =============================================================================
