//! Challenge nonce store
//!
//! Holds at most one outstanding challenge per address. Challenges expire
//! after a fixed TTL and are single use. Every operation takes the store
//! lock for its whole read-check-write sequence, so issuing and redeeming
//! for the same address never interleave.

use chrono::Duration;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::clock::{Clock, SystemClock, MAX_TTL_SECONDS};
use super::crypto::{normalize_address, validate_address};
use crate::models::Challenge;

/// Default challenge lifetime (5 minutes)
pub const DEFAULT_NONCE_TTL_SECONDS: i64 = 300;

/// Random bytes per nonce, hex encoded on the wire
const NONCE_BYTES: usize = 32;

/// Nonce store errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NonceError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("No challenge found for this address")]
    NoChallenge,

    #[error("Challenge expired")]
    ChallengeExpired,

    #[error("Signed message does not contain the challenge nonce")]
    MalformedChallengeUsage,
}

/// Storage for outstanding challenges
pub trait NonceStore: Send + Sync {
    /// Issue a fresh nonce for `address`, replacing any previous one
    fn issue(&self, address: &str) -> Result<String, NonceError>;

    /// Validate `presented_message` against the stored challenge and consume it
    fn redeem(&self, address: &str, presented_message: &str) -> Result<(), NonceError>;

    /// Same checks as [`NonceStore::redeem`] without consuming the challenge.
    /// An expired challenge is still removed.
    fn check(&self, address: &str, presented_message: &str) -> Result<Challenge, NonceError>;

    /// Remove the challenge for `address` only if it still holds `nonce`
    fn consume(&self, address: &str, nonce: &str) -> Result<(), NonceError>;

    /// Drop every expired challenge, returning how many were removed
    fn sweep_expired(&self) -> usize;

    /// Number of outstanding challenges
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct StoredNonce {
    nonce: String,
    issued_at: chrono::DateTime<chrono::Utc>,
}

/// Process-local nonce store behind a single mutex
pub struct InMemoryNonceStore {
    entries: Mutex<HashMap<String, StoredNonce>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl InMemoryNonceStore {
    /// Create a store using the wall clock
    pub fn new(ttl_seconds: i64) -> Self {
        Self::with_clock(ttl_seconds, Arc::new(SystemClock))
    }

    /// Create a store reading time from `clock`
    ///
    /// The TTL is capped at [`MAX_TTL_SECONDS`].
    pub fn with_clock(ttl_seconds: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(ttl_seconds.clamp(0, MAX_TTL_SECONDS)),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredNonce>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, entry: &StoredNonce, now: chrono::DateTime<chrono::Utc>) -> bool {
        now - entry.issued_at > self.ttl
    }

    /// Presence, freshness and inclusion checks on a locked map
    fn check_locked(
        &self,
        entries: &mut HashMap<String, StoredNonce>,
        key: &str,
        presented_message: &str,
    ) -> Result<Challenge, NonceError> {
        let entry = entries.get(key).ok_or(NonceError::NoChallenge)?;

        if self.is_expired(entry, self.clock.now()) {
            entries.remove(key);
            tracing::debug!(address = %key, "Expired challenge removed");
            return Err(NonceError::ChallengeExpired);
        }

        if !presented_message.contains(&entry.nonce) {
            return Err(NonceError::MalformedChallengeUsage);
        }

        Ok(Challenge {
            address: key.to_string(),
            nonce: entry.nonce.clone(),
            issued_at: entry.issued_at,
        })
    }
}

impl Default for InMemoryNonceStore {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_TTL_SECONDS)
    }
}

impl NonceStore for InMemoryNonceStore {
    fn issue(&self, address: &str) -> Result<String, NonceError> {
        validate_address(address).map_err(|e| NonceError::InvalidAddress(e.to_string()))?;

        let nonce = generate_secure_nonce();
        let key = normalize_address(address);
        let now = self.clock.now();

        let mut entries = self.lock();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let replaced = entries
            .insert(
                key.clone(),
                StoredNonce {
                    nonce: nonce.clone(),
                    issued_at: now,
                },
            )
            .is_some();

        tracing::debug!(address = %key, replaced, outstanding = entries.len(), "Challenge issued");

        Ok(nonce)
    }

    fn redeem(&self, address: &str, presented_message: &str) -> Result<(), NonceError> {
        let key = normalize_address(address);
        let mut entries = self.lock();
        self.check_locked(&mut entries, &key, presented_message)?;
        entries.remove(&key);
        Ok(())
    }

    fn check(&self, address: &str, presented_message: &str) -> Result<Challenge, NonceError> {
        let key = normalize_address(address);
        let mut entries = self.lock();
        self.check_locked(&mut entries, &key, presented_message)
    }

    fn consume(&self, address: &str, nonce: &str) -> Result<(), NonceError> {
        let key = normalize_address(address);
        let mut entries = self.lock();

        let entry = match entries.get(&key) {
            Some(entry) if entry.nonce == nonce => entry,
            _ => return Err(NonceError::NoChallenge),
        };

        if self.is_expired(entry, self.clock.now()) {
            entries.remove(&key);
            return Err(NonceError::ChallengeExpired);
        }

        entries.remove(&key);
        Ok(())
    }

    fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Generate a nonce from the OS random source
fn generate_secure_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
