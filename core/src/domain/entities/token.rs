//! Token claims for signed revocable tokens.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims managed by the token service; overridden if present in a payload
pub const RESERVED_CLAIMS: [&str; 6] = ["iss", "aud", "iat", "nbf", "exp", "jti"];

/// Claims structure for the JWT payload
///
/// Standard claims are typed; everything else the caller supplied is kept in
/// `custom` and serialized at the top level of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Issued at timestamp
    pub iat: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// JWT ID (revocation key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Caller-supplied claims
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Claims {
    /// Creates claims for a new token
    ///
    /// # Arguments
    ///
    /// * `payload` - Custom claims; reserved keys in it are discarded
    /// * `issued_at` - Unix timestamp used for `iat` and `nbf`
    /// * `ttl_seconds` - Lifetime added to `issued_at` for `exp`
    /// * `issuer` / `audience` - Omitted from the payload when empty
    pub fn new(
        mut payload: Map<String, Value>,
        issued_at: i64,
        ttl_seconds: i64,
        issuer: &str,
        audience: &str,
    ) -> Self {
        for key in RESERVED_CLAIMS {
            payload.remove(key);
        }

        Self {
            iss: non_empty(issuer),
            aud: non_empty(audience),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at + ttl_seconds,
            jti: Some(generate_jti()),
            custom: payload,
        }
    }

    /// Checks if the claims have expired at `now`
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Generates a fresh token id: 16 random bytes as 32 lowercase hex characters
pub fn generate_jti() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
