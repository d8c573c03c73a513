//! Remote profile provider
//!
//! The users service owns profile data. It is reached over HTTP by user ID
//! and may be slow or down, so callers treat any error as "unavailable".

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Identity, UserRole};

/// Profile provider errors
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile request failed: {0}")]
    Request(String),

    #[error("Profile not found")]
    NotFound,

    #[error("Profile service returned status {0}")]
    Status(u16),

    #[error("Invalid profile payload: {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for ProfileError {
    fn from(e: reqwest::Error) -> Self {
        ProfileError::Request(e.to_string())
    }
}

/// Profile as served by the users service
///
/// The users service exposes its entity columns as-is, so `prenom` and
/// `nom` are accepted for the first and last name. A payload without
/// `isActive` is treated as inactive.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    #[serde(alias = "prenom")]
    pub first_name: String,
    #[serde(alias = "nom")]
    pub last_name: String,
    pub role: String,
    pub wallet_address: String,
    #[serde(default)]
    pub is_active: bool,
}

impl TryFrom<Profile> for Identity {
    type Error = ProfileError;

    fn try_from(profile: Profile) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&profile.role).ok_or_else(|| {
            ProfileError::InvalidPayload(format!("unknown role '{}'", profile.role))
        })?;

        Ok(Identity {
            id: profile.id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            role,
            wallet_address: profile.wallet_address,
            is_active: profile.is_active,
        })
    }
}

/// Lookup of profiles by user ID
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Profile, ProfileError>;
}

/// Profile provider backed by the users service REST API
#[derive(Clone)]
pub struct HttpProfileProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProfileProvider {
    /// Create a provider for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProfileError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn profile_url(&self, user_id: Uuid) -> String {
        format!("{}/api/users/{}", self.base_url, user_id)
    }
}

#[async_trait]
impl ProfileProvider for HttpProfileProvider {
    async fn get_profile(&self, user_id: Uuid) -> Result<Profile, ProfileError> {
        let response = self.client.get(self.profile_url(user_id)).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProfileError::NotFound);
        }
        if !status.is_success() {
            return Err(ProfileError::Status(status.as_u16()));
        }

        response
            .json::<Profile>()
            .await
            .map_err(|e| ProfileError::InvalidPayload(e.to_string()))
    }
}
