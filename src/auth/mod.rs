//! Authentication module
//!
//! Provides wallet-based authentication using Ethereum-style addresses.
//! - Challenge-response authentication with single-use nonces
//! - EIP-191 signature recovery
//! - Layered identity resolution (profile service, then local store)
//! - JWT access token issuance

mod clock;
mod crypto;
mod identity;
mod jwt;
mod nonce;
mod profile;
mod service;

pub use clock::{Clock, ManualClock, SystemClock, MAX_TTL_SECONDS};
pub use crypto::{
    address_from_verifying_key, is_valid_address, normalize_address, personal_message_hash,
    recover_signer, to_checksum_address, validate_address, CryptoError,
};
pub use identity::{
    CaseInsensitiveAddressLookup, ExactAddressLookup, IdentityError, IdentityLookup,
    IdentityQuery, IdentityResolver, IdentityStore, InMemoryIdentityStore, ProfileLookup,
    StoreError,
};
pub use jwt::{AccessToken, Claims, JwtError, TokenIssuer};
pub use nonce::{InMemoryNonceStore, NonceError, NonceStore, DEFAULT_NONCE_TTL_SECONDS};
pub use profile::{HttpProfileProvider, Profile, ProfileError, ProfileProvider};
pub use service::{AuthError, AuthService, ErrorCategory};
