//! Deterministic DEK derivation from an identity string.
//!
//! The default [`Sha256Deriver`] computes `SHA-256(UTF-8(identity))`. It needs
//! no key store: the same identity always regenerates the same DEK. The cost is
//! that the plaintext DEK is fully predictable from the identity, so the
//! scheme's confidentiality rests entirely on the wrapped copy and the KEK.
//!
//! [`HmacSha256Deriver`] keeps the same 32-byte, deterministic contract but
//! mixes in an operator-held secret, so knowing the identity is not enough to
//! reproduce the key.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{Dek, DekError};

/// Errors produced while deriving a DEK.
#[derive(Debug, Error)]
pub enum DeriveError {
    /// The HMAC secret was empty or rejected by the MAC.
    #[error("invalid derivation secret")]
    InvalidSecret,

    /// The digest did not fit the DEK size.
    #[error(transparent)]
    Dek(#[from] DekError),
}

/// Produces a fixed-length DEK from an identity.
///
/// Implementations must be deterministic and return exactly
/// [`KEY_LEN`](crate::crypto::KEY_LEN) bytes: the AES-256 codec relies on it.
pub trait DekDeriver: Send + Sync {
    /// Derive the DEK for `identity`.
    fn derive(&self, identity: &str) -> Result<Dek, DeriveError>;
}

/// `DEK = SHA-256(UTF-8(identity))`.
///
/// The empty identity is a valid input and yields `SHA-256("")`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Deriver;

impl DekDeriver for Sha256Deriver {
    fn derive(&self, identity: &str) -> Result<Dek, DeriveError> {
        let digest = Sha256::digest(identity.as_bytes());
        Ok(Dek::from_slice(&digest)?)
    }
}

/// `DEK = HMAC-SHA256(secret, UTF-8(identity))`.
///
/// The secret is zeroized when the deriver is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacSha256Deriver {
    secret: Vec<u8>,
}

impl HmacSha256Deriver {
    /// Create a deriver keyed by `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`DeriveError::InvalidSecret`] if `secret` is empty.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, DeriveError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(DeriveError::InvalidSecret);
        }
        Ok(Self { secret })
    }
}

impl DekDeriver for HmacSha256Deriver {
    fn derive(&self, identity: &str) -> Result<Dek, DeriveError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|_| DeriveError::InvalidSecret)?;
        mac.update(identity.as_bytes());
        Ok(Dek::from_slice(&mac.finalize().into_bytes())?)
    }
}

impl std::fmt::Debug for HmacSha256Deriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HmacSha256Deriver([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // SHA-256("user@example.com")
    const USER_AT_EXAMPLE_DIGEST: [u8; 32] = [
        180, 201, 162, 137, 50, 59, 33, 160, 28, 62, 148, 15, 21, 14, 185, 184, 197, 66, 88, 127,
        26, 191, 216, 240, 225, 204, 31, 252, 94, 71, 85, 20,
    ];

    #[test]
    fn sha256_matches_known_digest() {
        let dek = Sha256Deriver.derive("user@example.com").unwrap();
        assert_eq!(dek.as_bytes(), &USER_AT_EXAMPLE_DIGEST);
    }

    #[test]
    fn sha256_is_deterministic() {
        let a = Sha256Deriver.derive("user@example.com").unwrap();
        let b = Sha256Deriver.derive("user@example.com").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn identities_are_isolated() {
        let a = Sha256Deriver.derive("a@x.com").unwrap();
        let b = Sha256Deriver.derive("b@x.com").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_identity_hashes_like_any_other() {
        let dek = Sha256Deriver.derive("").unwrap();
        assert_eq!(&dek.as_bytes()[..], &Sha256::digest(b"")[..]);
        assert_eq!(dek, Sha256Deriver.derive("").unwrap());

        let keyed = HmacSha256Deriver::new(b"pepper".to_vec()).unwrap();
        let a = keyed.derive("").unwrap();
        assert_eq!(a, keyed.derive("").unwrap());
        assert_ne!(a, dek);
    }

    #[test]
    fn hmac_secret_is_cleared_by_zeroize() {
        let mut keyed = HmacSha256Deriver::new(b"pepper".to_vec()).unwrap();
        keyed.zeroize();
        assert!(keyed.secret.is_empty());
    }

    #[test]
    fn hmac_is_deterministic_and_differs_from_plain_hash() {
        let keyed = HmacSha256Deriver::new(b"pepper".to_vec()).unwrap();
        let a = keyed.derive("user@example.com").unwrap();
        let b = keyed.derive("user@example.com").unwrap();
        assert_eq!(a, b);
        assert_ne!(a.as_bytes(), &USER_AT_EXAMPLE_DIGEST);
    }

    #[test]
    fn hmac_secret_changes_key() {
        let one = HmacSha256Deriver::new(b"one".to_vec()).unwrap();
        let two = HmacSha256Deriver::new(b"two".to_vec()).unwrap();
        assert_ne!(
            one.derive("user@example.com").unwrap(),
            two.derive("user@example.com").unwrap()
        );
    }

    #[test]
    fn hmac_rejects_empty_secret() {
        assert!(matches!(
            HmacSha256Deriver::new(Vec::new()),
            Err(DeriveError::InvalidSecret)
        ));
    }
}
