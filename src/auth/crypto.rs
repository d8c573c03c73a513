//! Ethereum personal-message signature recovery
//!
//! Recovers the signer of an EIP-191 `personal_sign` message and derives
//! its account address. Also validates and checksums addresses (EIP-55).

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Errors that can occur during signature recovery
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address checksum")]
    InvalidChecksum,

    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("Public key recovery failed")]
    RecoveryFailed,
}

/// Length of an `r || s || v` signature
const SIGNATURE_LEN: usize = 65;

/// Recover the address that signed `message` with `personal_sign`
///
/// # Arguments
/// * `message` - The exact message the wallet signed
/// * `signature_hex` - Hex-encoded 65 byte signature, `0x` prefix optional
///
/// # Returns
/// * `Ok(address)` in EIP-55 checksum form
/// * `Err(CryptoError)` for any malformed or unrecoverable signature
pub fn recover_signer(message: &str, signature_hex: &str) -> Result<String, CryptoError> {
    let sig_bytes = hex::decode(strip_hex_prefix(signature_hex.trim()))
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    if sig_bytes.len() != SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignatureFormat(format!(
            "Expected {} bytes, got {}",
            SIGNATURE_LEN,
            sig_bytes.len()
        )));
    }

    let (rs, v) = sig_bytes.split_at(64);
    let recovery_id = match v[0] {
        0 | 27 => RecoveryId::new(false, false),
        1 | 28 => RecoveryId::new(true, false),
        other => return Err(CryptoError::InvalidRecoveryId(other)),
    };

    let signature = Signature::from_slice(rs)
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    let digest = personal_message_hash(message);
    let verifying_key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_from_verifying_key(&verifying_key))
}

/// Hash a message the way `personal_sign` does:
/// `keccak256("\x19Ethereum Signed Message:\n" || len || message)`
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    keccak256(prefixed.as_bytes())
}

/// Derive the checksummed account address of a public key
pub fn address_from_verifying_key(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    // skip the 0x04 tag of the uncompressed encoding
    let hash = keccak256(&point.as_bytes()[1..]);
    checksum_hex(&hex::encode(&hash[12..]))
}

/// Check that `address` is `0x` followed by 40 hex digits
///
/// All-lowercase and all-uppercase forms are accepted as is. Mixed case
/// must carry a valid EIP-55 checksum.
pub fn validate_address(address: &str) -> Result<(), CryptoError> {
    let body = address.strip_prefix("0x").ok_or_else(|| {
        CryptoError::InvalidAddressFormat("Address must start with 0x".to_string())
    })?;

    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CryptoError::InvalidAddressFormat(
            "Address must be 40 hex digits".to_string(),
        ));
    }

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && checksum_hex(&body.to_ascii_lowercase()) != address {
        return Err(CryptoError::InvalidChecksum);
    }

    Ok(())
}

/// Whether `address` is a well-formed account address
pub fn is_valid_address(address: &str) -> bool {
    validate_address(address).is_ok()
}

/// Convert a valid address to its EIP-55 checksum form
pub fn to_checksum_address(address: &str) -> Result<String, CryptoError> {
    validate_address(address)?;
    Ok(checksum_hex(&address[2..].to_ascii_lowercase()))
}

/// Canonical key used for every address comparison
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Apply EIP-55 casing to 40 lowercase hex digits, returning `0x`-prefixed
fn checksum_hex(lower: &str) -> String {
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");

    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }

    out
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use k256::ecdsa::SigningKey;

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_checksum_known_vectors() {
        assert_eq!(
            to_checksum_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        assert_eq!(
            to_checksum_address("0xFB6916095CA1DF60BB79CE92CE3EA74C37C5D359").unwrap(),
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
        );
    }

    #[test]
    fn test_validate_address() {
        assert!(is_valid_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(is_valid_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(is_valid_address("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"));

        // wrong casing on one letter
        assert_eq!(
            validate_address("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
            Err(CryptoError::InvalidChecksum)
        );
        assert!(matches!(
            validate_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(CryptoError::InvalidAddressFormat(_))
        ));
        assert!(!is_valid_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1bea"));
        assert!(!is_valid_address("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn test_address_from_private_key_one() {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = SigningKey::from_slice(&secret).unwrap();
        assert_eq!(
            address_of(&key),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_recover_signer_roundtrip() {
        let key = test_key(7);
        let message = "Login nonce: n1";
        let signature = sign_personal(&key, message);

        let recovered = recover_signer(message, &signature).unwrap();
        assert_eq!(recovered, address_of(&key));

        // unprefixed hex is accepted too
        let recovered = recover_signer(message, signature.trim_start_matches("0x")).unwrap();
        assert_eq!(recovered, address_of(&key));
    }

    #[test]
    fn test_recover_signer_other_message_gives_other_address() {
        let key = test_key(7);
        let signature = sign_personal(&key, "Login nonce: n1");

        // recovery still succeeds, but yields an unrelated key
        let recovered = recover_signer("Login nonce: n2", &signature).unwrap();
        assert_ne!(recovered, address_of(&key));
    }

    #[test]
    fn test_recover_signer_rejects_malformed() {
        assert!(matches!(
            recover_signer("m", "0xnothex"),
            Err(CryptoError::InvalidSignatureFormat(_))
        ));
        assert!(matches!(
            recover_signer("m", &format!("0x{}", "11".repeat(64))),
            Err(CryptoError::InvalidSignatureFormat(_))
        ));

        let key = test_key(9);
        let mut signature = sign_personal(&key, "m");
        signature.truncate(signature.len() - 2);
        signature.push_str("05");
        assert_eq!(
            recover_signer("m", &signature),
            Err(CryptoError::InvalidRecoveryId(5))
        );

        // r = s = 0 is not a valid scalar pair
        let zero = format!("0x{}1b", "00".repeat(64));
        assert!(recover_signer("m", &zero).is_err());
    }
}
