//! Identity resolution
//!
//! Maps a verified address to an active identity by walking an ordered list
//! of lookups: the remote profile provider (when a user ID is known), then
//! the local store by exact address, then the local store ignoring case.
//! The first active match wins.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::crypto::normalize_address;
use super::profile::ProfileProvider;
use crate::models::Identity;

/// Identity store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Identity resolution errors
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("No active identity for this address")]
    NotFound,
}

/// Local store of identities, filtered to active ones
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Active identity whose address equals `address` exactly
    async fn find_active_by_address(&self, address: &str) -> Result<Option<Identity>, StoreError>;

    /// Active identity whose address equals `address` ignoring case
    async fn find_active_by_address_ci(
        &self,
        address: &str,
    ) -> Result<Option<Identity>, StoreError>;
}

/// Identity store held in memory
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<Vec<Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self {
            identities: RwLock::new(identities),
        }
    }

    pub fn insert(&self, identity: Identity) {
        self.identities
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(identity);
    }

    fn find(&self, matches: impl Fn(&Identity) -> bool) -> Option<Identity> {
        self.identities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|identity| identity.is_active && matches(identity))
            .cloned()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_active_by_address(&self, address: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.find(|identity| identity.wallet_address == address))
    }

    async fn find_active_by_address_ci(
        &self,
        address: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let wanted = normalize_address(address);
        Ok(self.find(|identity| normalize_address(&identity.wallet_address) == wanted))
    }
}

/// What the resolver is asked to authorize
#[derive(Debug, Clone, Copy)]
pub struct IdentityQuery<'a> {
    pub address: &'a str,
    /// User ID from an earlier session, enables the remote lookup
    pub user_id: Option<Uuid>,
}

impl<'a> IdentityQuery<'a> {
    pub fn by_address(address: &'a str) -> Self {
        Self {
            address,
            user_id: None,
        }
    }
}

/// One step of the resolution chain
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, query: &IdentityQuery<'_>) -> Result<Option<Identity>, StoreError>;
}

/// Remote profile provider by user ID
///
/// Provider failures and timeouts are logged and reported as absence.
pub struct ProfileLookup {
    provider: Arc<dyn ProfileProvider>,
    timeout: Duration,
}

impl ProfileLookup {
    pub fn new(provider: Arc<dyn ProfileProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl IdentityLookup for ProfileLookup {
    fn name(&self) -> &'static str {
        "profile_provider"
    }

    async fn lookup(&self, query: &IdentityQuery<'_>) -> Result<Option<Identity>, StoreError> {
        let Some(user_id) = query.user_id else {
            return Ok(None);
        };

        let profile = match tokio::time::timeout(self.timeout, self.provider.get_profile(user_id))
            .await
        {
            Ok(Ok(profile)) => profile,
            Ok(Err(e)) => {
                tracing::warn!(%user_id, error = %e, "Profile provider unavailable, falling back");
                return Ok(None);
            }
            Err(_) => {
                tracing::warn!(
                    %user_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Profile provider timed out, falling back"
                );
                return Ok(None);
            }
        };

        let identity = match Identity::try_from(profile) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "Unusable profile, falling back");
                return Ok(None);
            }
        };

        if normalize_address(&identity.wallet_address) != normalize_address(query.address) {
            tracing::warn!(%user_id, "Profile address does not match query address");
            return Ok(None);
        }

        Ok(Some(identity))
    }
}

/// Local store by exact address
pub struct ExactAddressLookup {
    store: Arc<dyn IdentityStore>,
}

impl ExactAddressLookup {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityLookup for ExactAddressLookup {
    fn name(&self) -> &'static str {
        "local_exact"
    }

    async fn lookup(&self, query: &IdentityQuery<'_>) -> Result<Option<Identity>, StoreError> {
        self.store.find_active_by_address(query.address).await
    }
}

/// Local store by address, ignoring case
pub struct CaseInsensitiveAddressLookup {
    store: Arc<dyn IdentityStore>,
}

impl CaseInsensitiveAddressLookup {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityLookup for CaseInsensitiveAddressLookup {
    fn name(&self) -> &'static str {
        "local_case_insensitive"
    }

    async fn lookup(&self, query: &IdentityQuery<'_>) -> Result<Option<Identity>, StoreError> {
        self.store.find_active_by_address_ci(query.address).await
    }
}

/// Ordered chain of identity lookups
pub struct IdentityResolver {
    lookups: Vec<Box<dyn IdentityLookup>>,
}

impl IdentityResolver {
    pub fn new(lookups: Vec<Box<dyn IdentityLookup>>) -> Self {
        Self { lookups }
    }

    /// Standard chain: remote provider if configured, then local exact,
    /// then local case-insensitive
    pub fn standard(
        store: Arc<dyn IdentityStore>,
        provider: Option<Arc<dyn ProfileProvider>>,
        provider_timeout: Duration,
    ) -> Self {
        let mut lookups: Vec<Box<dyn IdentityLookup>> = Vec::with_capacity(3);
        if let Some(provider) = provider {
            lookups.push(Box::new(ProfileLookup::new(provider, provider_timeout)));
        }
        lookups.push(Box::new(ExactAddressLookup::new(store.clone())));
        lookups.push(Box::new(CaseInsensitiveAddressLookup::new(store)));
        Self::new(lookups)
    }

    /// Resolve `query` to an active identity
    ///
    /// Store errors are logged and do not stop the chain. An exhausted chain
    /// is `NotFound` whatever the reason.
    pub async fn resolve(&self, query: &IdentityQuery<'_>) -> Result<Identity, IdentityError> {
        for lookup in &self.lookups {
            match lookup.lookup(query).await {
                Ok(Some(identity)) if identity.is_active => {
                    tracing::debug!(
                        address = %query.address,
                        strategy = lookup.name(),
                        "Identity resolved"
                    );
                    return Ok(identity);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(
                        address = %query.address,
                        strategy = lookup.name(),
                        error = %e,
                        "Identity lookup failed"
                    );
                }
            }
        }

        Err(IdentityError::NotFound)
    }
}
