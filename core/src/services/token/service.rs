//! Main token service implementation

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::clock::{system_clock, SharedClock};
use crate::domain::entities::token::Claims;
use crate::errors::{DomainError, DomainResult, RevocationError, TokenError};
use crate::services::revocation::RevocationGate;

use super::config::{RevocationCheckPolicy, TokenServiceConfig};

/// Service issuing signed tokens and enforcing their revocation
pub struct TokenService {
    gate: RevocationGate,
    config: TokenServiceConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: SharedClock,
}

impl TokenService {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `gate` - Revocation gate consulted on every decode
    /// * `config` - Token service configuration
    ///
    /// # Returns
    ///
    /// A new `TokenService` instance or a configuration error
    pub fn new(gate: RevocationGate, config: TokenServiceConfig) -> DomainResult<Self> {
        Self::with_clock(gate, config, system_clock())
    }

    /// Creates a token service whose `iat`/`nbf`/`exp` come from `clock`
    pub fn with_clock(
        gate: RevocationGate,
        config: TokenServiceConfig,
        clock: SharedClock,
    ) -> DomainResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.leeway = config.leeway;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        if !config.issuer.is_empty() {
            validation.set_issuer(&[config.issuer.as_str()]);
        }
        if config.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&[config.audience.as_str()]);
        }

        Ok(Self {
            gate,
            config,
            encoding_key,
            decoding_key,
            validation,
            clock,
        })
    }

    /// The revocation gate this service consults
    pub fn gate(&self) -> &RevocationGate {
        &self.gate
    }

    /// Issues a signed token
    ///
    /// # Arguments
    ///
    /// * `payload` - Custom claims; `iss`, `aud`, `iat`, `nbf`, `exp` and `jti` are always set by the service
    /// * `ttl_seconds` - Lifetime override; the configured TTL is used when `None`
    pub fn issue(&self, payload: Map<String, Value>, ttl_seconds: Option<i64>) -> DomainResult<String> {
        let ttl = ttl_seconds.unwrap_or(self.config.token_ttl);
        let claims = Claims::new(
            payload,
            self.clock.now(),
            ttl,
            &self.config.issuer,
            &self.config.audience,
        );

        let token = encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::TokenGenerationFailed {
                message: e.to_string(),
            })?;

        debug!(jti = ?claims.jti, exp = claims.exp, "Token issued");
        Ok(token)
    }

    /// Verifies a token and checks that it has not been revoked
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - The token is authentic, current and not revoked
    /// * `Err(DomainError::Token)` - Signature, format, expiry or revocation failure
    /// * `Err(DomainError::Storage)` - The revocation store failed under the fail-closed policy
    pub async fn decode(&self, token: &str) -> DomainResult<Claims> {
        let claims = self.verify(token, &self.validation)?;

        if let Some(jti) = claims.jti.as_deref() {
            self.check_revocation(jti).await?;
        }

        Ok(claims)
    }

    /// Whether the token would decode successfully
    pub async fn validate(&self, token: &str) -> bool {
        self.decode(token).await.is_ok()
    }

    /// Revokes the presented token and issues a replacement
    ///
    /// The replacement carries the same custom claims and a fresh `jti`.
    pub async fn refresh(&self, token: &str, ttl_seconds: Option<i64>) -> DomainResult<String> {
        let claims = self.decode(token).await?;

        if let Some(jti) = claims.jti.as_deref() {
            self.gate.revoke(jti, claims.exp).await?;
        }

        self.issue(claims.custom, ttl_seconds)
    }

    /// Revokes a token by its `jti`
    ///
    /// The signature is verified but expiry is not, so an expired token can
    /// still be revoked.
    pub async fn revoke(&self, token: &str) -> DomainResult<()> {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;
        validation.validate_nbf = false;

        let claims = self.verify(token, &validation)?;
        let jti = claims.jti.as_deref().ok_or(RevocationError::MissingTokenId)?;

        self.gate.revoke(jti, claims.exp).await
    }

    /// Removes expired revocation entries
    pub async fn cleanup(&self) -> DomainResult<usize> {
        self.gate.sweep().await
    }

    fn verify(&self, token: &str, validation: &Validation) -> DomainResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, validation).map_err(TokenError::from)?;
        Ok(data.claims)
    }

    async fn check_revocation(&self, jti: &str) -> DomainResult<()> {
        match self.gate.is_revoked(jti).await {
            Ok(true) => Err(TokenError::TokenRevoked.into()),
            Ok(false) => Ok(()),
            Err(DomainError::Storage(err)) => match self.config.revocation_policy {
                RevocationCheckPolicy::FailClosed => {
                    warn!(jti = %jti, error = %err, "Revocation check failed, rejecting token");
                    Err(DomainError::Storage(err))
                }
                RevocationCheckPolicy::FailOpen => {
                    warn!(jti = %jti, error = %err, "Revocation check failed, accepting token");
                    Ok(())
                }
            },
            Err(err) => Err(err),
        }
    }
}
