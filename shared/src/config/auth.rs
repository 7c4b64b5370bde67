//! JWT signing configuration

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

const DEFAULT_SECRET: &str = "your-secret-key-change-in-production";

/// JWT authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// JWT secret key for signing tokens
    pub secret: String,

    /// Algorithm for JWT signing (default: HS256)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// JWT issuer claim (empty disables issuer validation)
    #[serde(default)]
    pub issuer: String,

    /// JWT audience claim (empty disables audience validation)
    #[serde(default)]
    pub audience: String,

    /// Clock skew tolerated when validating `exp`/`nbf`, in seconds
    #[serde(default)]
    pub leeway: u64,

    /// Lifetime of issued tokens in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl: i64,

    /// Reject tokens when the revocation store cannot be consulted
    #[serde(default = "default_fail_closed")]
    pub fail_closed: bool,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            algorithm: default_algorithm(),
            issuer: String::new(),
            audience: String::new(),
            leeway: 0,
            token_ttl: default_token_ttl(),
            fail_closed: default_fail_closed(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set the issuer and audience claims
    pub fn with_issuer(mut self, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self.audience = audience.into();
        self
    }

    /// Set the validation leeway in seconds
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }

    /// Validate the signing settings
    pub fn validate(&self) -> ConfigResult<()> {
        if self.secret.is_empty() {
            return Err(ConfigError::Missing {
                field: "jwt.secret".to_string(),
            });
        }
        if self.token_ttl <= 0 {
            return Err(ConfigError::invalid("jwt.token_ttl", "must be positive"));
        }
        Ok(())
    }
}

fn default_algorithm() -> String {
    String::from("HS256")
}

fn default_token_ttl() -> i64 {
    3600 // 1 hour
}

fn default_fail_closed() -> bool {
    true
}
