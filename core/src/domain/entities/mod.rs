//! Domain entities representing revocation records and token claims.

pub mod revocation;
pub mod token;

// Re-export commonly used types
pub use revocation::{validate_token_id, RevocationEntry, MAX_TOKEN_ID_LENGTH};
pub use token::{generate_jti, Claims, RESERVED_CLAIMS};
