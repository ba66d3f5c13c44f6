//! Daily Code Selector: one code per calendar date for everyone
//!
//! index = SHA-256("YYYY-MM-DD")[0..8] as big-endian u64, mod catalog size.
//! Pure and lock-free; no persisted state.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use crate::types::{GrabovoiCatalog, GrabovoiCode};

/// Catalog index for `date`
///
/// A constructed catalog is never empty, so the modulus is never zero.
pub fn daily_index(catalog: &GrabovoiCatalog, date: NaiveDate) -> usize {
    debug_assert!(!catalog.is_empty());
    let digest = hash_date(date);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[0..8]);
    (u64::from_be_bytes(head) % catalog.len() as u64) as usize
}

/// The code of the day
pub fn code_of_day(catalog: &GrabovoiCatalog, date: NaiveDate) -> GrabovoiCode {
    catalog.codes()[daily_index(catalog, date)].clone()
}

/// SHA-256 of the ISO calendar date
fn hash_date(date: NaiveDate) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.finalize().into()
}

// =============================================================================
// TESTS
// =============================================================================
