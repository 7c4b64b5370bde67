//! Revocation entry entity and token id rules.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::RevocationError;

/// Longest token id accepted by the revocation gate
pub const MAX_TOKEN_ID_LENGTH: usize = 128;

static TOKEN_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

/// A revoked token id together with the moment it stops mattering
///
/// This is also the on-disk record of the file store:
/// `{"id": "...", "expires_at": 1700000000, "created_at": 1699996400}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEntry {
    /// Token identifier (`jti`)
    pub id: String,

    /// Unix timestamp after which the entry is semantically absent
    pub expires_at: i64,

    /// Unix timestamp of insertion
    pub created_at: i64,
}

impl RevocationEntry {
    /// Creates a new entry
    pub fn new(id: impl Into<String>, expires_at: i64, created_at: i64) -> Self {
        Self {
            id: id.into(),
            expires_at,
            created_at,
        }
    }

    /// `true` while the entry still revokes its token
    pub fn is_live_at(&self, now: i64) -> bool {
        self.expires_at > now
    }

    /// Seconds until expiry, zero once expired
    pub fn remaining_ttl(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }
}

/// Check that an id is usable as a file name, cache key and primary key
pub fn validate_token_id(id: &str) -> Result<(), RevocationError> {
    if id.is_empty() {
        return Err(RevocationError::MissingTokenId);
    }
    if id.len() > MAX_TOKEN_ID_LENGTH {
        return Err(RevocationError::InvalidTokenId {
            id: id.chars().take(16).collect(),
            reason: format!("longer than {} characters", MAX_TOKEN_ID_LENGTH),
        });
    }
    if !TOKEN_ID_PATTERN.is_match(id) {
        return Err(RevocationError::InvalidTokenId {
            id: id.to_string(),
            reason: "only ASCII letters, digits, '-' and '_' are allowed".to_string(),
        });
    }
    Ok(())
}
