//! Configuration for the token service

use jsonwebtoken::Algorithm;
use std::str::FromStr;

use tg_shared::JwtConfig;

use crate::errors::{DomainError, DomainResult};

/// What to do with a token when the revocation store cannot be consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationCheckPolicy {
    /// Reject the token with the storage error
    #[default]
    FailClosed,
    /// Log a warning and accept the token
    FailOpen,
}

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// JWT signing algorithm (HMAC family only)
    pub algorithm: Algorithm,
    /// Issuer claim; empty disables issuer validation
    pub issuer: String,
    /// Audience claim; empty disables audience validation
    pub audience: String,
    /// Tolerated clock skew in seconds
    pub leeway: u64,
    /// Default token lifetime in seconds
    pub token_ttl: i64,
    /// Behaviour on revocation store errors
    pub revocation_policy: RevocationCheckPolicy,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            algorithm: Algorithm::HS256,
            issuer: String::new(),
            audience: String::new(),
            leeway: 60,
            token_ttl: 3600,
            revocation_policy: RevocationCheckPolicy::FailClosed,
        }
    }
}

impl TokenServiceConfig {
    /// Build from the shared JWT settings
    pub fn from_jwt_config(config: &JwtConfig) -> DomainResult<Self> {
        let algorithm = Algorithm::from_str(&config.algorithm).map_err(|_| {
            DomainError::configuration(format!("unknown JWT algorithm '{}'", config.algorithm))
        })?;

        let service_config = Self {
            jwt_secret: config.secret.clone(),
            algorithm,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            leeway: config.leeway,
            token_ttl: config.token_ttl,
            revocation_policy: if config.fail_closed {
                RevocationCheckPolicy::FailClosed
            } else {
                RevocationCheckPolicy::FailOpen
            },
        };
        service_config.validate()?;
        Ok(service_config)
    }

    /// Set the revocation check policy
    pub fn with_policy(mut self, policy: RevocationCheckPolicy) -> Self {
        self.revocation_policy = policy;
        self
    }

    /// Set the issuer and audience claims
    pub fn with_issuer(mut self, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self.audience = audience.into();
        self
    }

    /// Check the settings the service depends on
    pub fn validate(&self) -> DomainResult<()> {
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(DomainError::configuration(format!(
                "unsupported JWT algorithm {:?}: only HS256, HS384 and HS512 are supported",
                self.algorithm
            )));
        }
        if self.jwt_secret.is_empty() {
            return Err(DomainError::configuration("JWT secret must not be empty"));
        }
        if self.token_ttl <= 0 {
            return Err(DomainError::configuration("token TTL must be positive"));
        }
        Ok(())
    }
}
