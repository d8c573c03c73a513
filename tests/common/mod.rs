//! Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::Duration;
use k256::ecdsa::SigningKey;
use std::sync::Arc;
use uuid::Uuid;

use wallet_auth_server::auth::{
    address_from_verifying_key, personal_message_hash, AuthService, IdentityResolver,
    InMemoryIdentityStore, InMemoryNonceStore, ManualClock, TokenIssuer,
    DEFAULT_NONCE_TTL_SECONDS,
};
use wallet_auth_server::models::{Identity, UserRole};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const TOKEN_TTL_SECONDS: i64 = 3600;

/// A wallet able to sign like `personal_sign`
pub struct Wallet {
    key: SigningKey,
}

impl Wallet {
    pub fn new(seed: u8) -> Self {
        Self {
            key: SigningKey::from_slice(&[seed; 32]).expect("valid scalar"),
        }
    }

    /// EIP-55 checksummed address
    pub fn address(&self) -> String {
        address_from_verifying_key(self.key.verifying_key())
    }

    pub fn sign(&self, message: &str) -> String {
        let digest = personal_message_hash(message);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&digest)
            .expect("signing failed");

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }
}

pub fn identity_for(address: &str, role: UserRole) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        role,
        wallet_address: address.to_string(),
        is_active: true,
    }
}

pub fn login_message(nonce: &str) -> String {
    format!("Login nonce: {}", nonce)
}

/// Auth service over in-memory stores and a manual clock
pub struct Harness {
    pub service: Arc<AuthService>,
    pub clock: Arc<ManualClock>,
    pub identities: Arc<InMemoryIdentityStore>,
}

impl Harness {
    pub fn new(identities: Vec<Identity>) -> Self {
        let clock = Arc::new(ManualClock::default());
        let identities = Arc::new(InMemoryIdentityStore::new(identities));

        let service = AuthService::new(
            Arc::new(InMemoryNonceStore::with_clock(
                DEFAULT_NONCE_TTL_SECONDS,
                clock.clone(),
            )),
            IdentityResolver::standard(
                identities.clone(),
                None,
                std::time::Duration::from_secs(1),
            ),
            TokenIssuer::new(JWT_SECRET, TOKEN_TTL_SECONDS),
        );

        Self {
            service: Arc::new(service),
            clock,
            identities,
        }
    }

    pub fn expire_challenges(&self) {
        self.clock
            .advance(Duration::seconds(DEFAULT_NONCE_TTL_SECONDS + 1));
    }
}

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(JWT_SECRET, TOKEN_TTL_SECONDS)
}
