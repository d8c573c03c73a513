//! JWT access token issuance and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::clock::MAX_TTL_SECONDS;
use crate::models::{Identity, UserRole};

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,
}

/// JWT claims carried by access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (recovered signer address)
    pub sub: String,
    /// Recovered signer address
    pub address: String,
    /// Identity ID in the users table
    pub user_id: Uuid,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    /// Wallet address as stored on the identity
    pub wallet_address: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// A freshly minted token and its lifetime
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: i64,
}

/// Mints and validates HS256 access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl TokenIssuer {
    /// Create an issuer signing with `secret`
    ///
    /// # Arguments
    /// * `secret` - HMAC secret shared with token verifiers
    /// * `ttl_seconds` - Token time-to-live in seconds
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// Mint a token for an authorized identity
    ///
    /// `signer` is the address recovered from the signature; it becomes the
    /// token subject while `wallet_address` keeps the identity's stored casing.
    pub fn mint(&self, identity: &Identity, signer: &str) -> Result<AccessToken, JwtError> {
        if self.ttl_seconds.unsigned_abs() > MAX_TTL_SECONDS as u64 {
            return Err(JwtError::EncodingFailed(format!(
                "token lifetime of {}s is out of range",
                self.ttl_seconds
            )));
        }

        let now = Utc::now();
        let exp = now
            .checked_add_signed(Duration::seconds(self.ttl_seconds))
            .ok_or_else(|| JwtError::EncodingFailed("expiry overflows".to_string()))?;

        let claims = Claims {
            sub: signer.to_string(),
            address: signer.to_string(),
            user_id: identity.id,
            role: identity.role,
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            wallet_address: identity.wallet_address.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))?;

        Ok(AccessToken {
            token,
            expires_in: self.ttl_seconds,
        })
    }

    /// Verify and decode a token
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::DecodingFailed(e.to_string()),
            })
    }
}
