//! Authentication service
//!
//! Coordinates the challenge/response handshake: nonce issuance, nonce
//! checks, signature recovery, identity resolution and token minting.
//! A challenge is consumed only once every check has passed, so a failed
//! attempt can be retried with the same nonce until it expires.

use std::sync::Arc;
use thiserror::Error;

use crate::models::{NonceResponse, ProfileResponse, TokenResponse};

use super::crypto::{normalize_address, recover_signer, validate_address, CryptoError};
use super::identity::{IdentityError, IdentityQuery, IdentityResolver};
use super::jwt::{Claims, JwtError, TokenIssuer};
use super::nonce::{NonceError, NonceStore};

/// Auth service errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No challenge found for this address")]
    NoChallenge,

    #[error("Challenge expired")]
    ChallengeExpired,

    #[error("Signed message does not contain the challenge nonce")]
    MalformedChallengeUsage,

    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("User not found or inactive")]
    NotFound,

    #[error("Token error: {0}")]
    Token(String),
}

/// What a caller may learn about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input, fixable by the client
    Validation,
    /// Missing or expired challenge, the handshake must restart
    ChallengeLifecycle,
    /// Signature or identity rejected
    Authentication,
    Internal,
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AuthError::InvalidAddress(_) | AuthError::Validation(_) => ErrorCategory::Validation,
            AuthError::NoChallenge | AuthError::ChallengeExpired => {
                ErrorCategory::ChallengeLifecycle
            }
            AuthError::MalformedChallengeUsage
            | AuthError::SignatureInvalid(_)
            | AuthError::Unauthorized(_)
            | AuthError::NotFound => ErrorCategory::Authentication,
            AuthError::Token(_) => ErrorCategory::Internal,
        }
    }
}

impl From<NonceError> for AuthError {
    fn from(e: NonceError) -> Self {
        match e {
            NonceError::InvalidAddress(reason) => AuthError::InvalidAddress(reason),
            NonceError::NoChallenge => AuthError::NoChallenge,
            NonceError::ChallengeExpired => AuthError::ChallengeExpired,
            NonceError::MalformedChallengeUsage => AuthError::MalformedChallengeUsage,
        }
    }
}

impl From<CryptoError> for AuthError {
    fn from(e: CryptoError) -> Self {
        AuthError::SignatureInvalid(e.to_string())
    }
}

impl From<IdentityError> for AuthError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::NotFound => AuthError::NotFound,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        AuthError::Token(e.to_string())
    }
}

/// Authentication service
pub struct AuthService {
    nonce_store: Arc<dyn NonceStore>,
    resolver: IdentityResolver,
    token_issuer: TokenIssuer,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        nonce_store: Arc<dyn NonceStore>,
        resolver: IdentityResolver,
        token_issuer: TokenIssuer,
    ) -> Self {
        Self {
            nonce_store,
            resolver,
            token_issuer,
        }
    }

    /// Issue a challenge nonce for `address`
    pub fn issue_challenge(&self, address: &str) -> Result<NonceResponse, AuthError> {
        let nonce = self.nonce_store.issue(address).map_err(|e| {
            tracing::debug!(%address, error = %e, "Challenge request rejected");
            AuthError::from(e)
        })?;

        Ok(NonceResponse { nonce })
    }

    /// Exchange a signed challenge for an access token
    pub async fn redeem_challenge(
        &self,
        address: &str,
        signature: &str,
        message: &str,
    ) -> Result<TokenResponse, AuthError> {
        validate_address(address).map_err(|e| AuthError::InvalidAddress(e.to_string()))?;

        let challenge = self.nonce_store.check(address, message).map_err(|e| {
            tracing::info!(%address, reason = %e, "Challenge check failed");
            AuthError::from(e)
        })?;

        let signer = recover_signer(message, signature).map_err(|e| {
            tracing::info!(%address, reason = %e, "Signature recovery failed");
            AuthError::from(e)
        })?;

        if normalize_address(&signer) != challenge.address {
            tracing::warn!(%address, %signer, "Signer does not match challenged address");
            return Err(AuthError::Unauthorized(
                "Signature verification failed".to_string(),
            ));
        }

        let identity = self
            .resolver
            .resolve(&IdentityQuery::by_address(&signer))
            .await
            .map_err(|e| {
                tracing::info!(%address, reason = %e, "Identity resolution failed");
                AuthError::from(e)
            })?;

        let minted = self.token_issuer.mint(&identity, &signer)?;

        // Lost races (double redeem, concurrent re-issue) fail here and the
        // minted token is dropped.
        self.nonce_store
            .consume(address, &challenge.nonce)
            .map_err(|e| {
                tracing::info!(%address, reason = %e, "Challenge consumed concurrently");
                AuthError::from(e)
            })?;

        tracing::info!(
            address = %signer,
            user_id = %identity.id,
            role = identity.role.as_str(),
            "Wallet authenticated"
        );

        Ok(TokenResponse {
            access_token: minted.token,
            token_type: "Bearer".to_string(),
            expires_in: minted.expires_in,
        })
    }

    /// Current profile for a token holder
    ///
    /// Tries the resolver with the token's user ID first. If nothing
    /// resolves, the token claims are returned as they are.
    pub async fn profile(&self, claims: &Claims) -> ProfileResponse {
        let query = IdentityQuery {
            address: &claims.address,
            user_id: Some(claims.user_id),
        };

        match self.resolver.resolve(&query).await {
            Ok(identity) => ProfileResponse {
                id: identity.id,
                first_name: identity.first_name,
                last_name: identity.last_name,
                role: identity.role,
                address: identity.wallet_address.clone(),
                wallet_address: identity.wallet_address,
                authenticated: true,
            },
            Err(e) => {
                tracing::warn!(
                    user_id = %claims.user_id,
                    reason = %e,
                    "Profile lookup failed, answering from token claims"
                );
                ProfileResponse {
                    id: claims.user_id,
                    first_name: claims.first_name.clone(),
                    last_name: claims.last_name.clone(),
                    role: claims.role,
                    address: claims.address.clone(),
                    wallet_address: claims.address.clone(),
                    authenticated: true,
                }
            }
        }
    }

    /// Drop expired challenges
    pub fn sweep_expired(&self) -> usize {
        self.nonce_store.sweep_expired()
    }

    /// Token issuer (for the bearer extractor)
    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.token_issuer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            AuthError::InvalidAddress("x".to_string()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AuthError::ChallengeExpired.category(),
            ErrorCategory::ChallengeLifecycle
        );
        assert_eq!(
            AuthError::NoChallenge.category(),
            ErrorCategory::ChallengeLifecycle
        );
        assert_eq!(
            AuthError::SignatureInvalid("x".to_string()).category(),
            ErrorCategory::Authentication
        );
        assert_eq!(AuthError::NotFound.category(), ErrorCategory::Authentication);
        assert_eq!(
            AuthError::Token("x".to_string()).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_nonce_errors_keep_their_meaning() {
        assert_eq!(AuthError::from(NonceError::NoChallenge), AuthError::NoChallenge);
        assert_eq!(
            AuthError::from(NonceError::MalformedChallengeUsage),
            AuthError::MalformedChallengeUsage
        );
        assert_eq!(
            AuthError::from(IdentityError::NotFound),
            AuthError::NotFound
        );
    }
}
