//! Data Encryption Keys: the zeroizing [`Dek`] buffer and identity-based derivation.
//!
//! # Security invariants
//!
//! - The plaintext DEK is **never** written to disk, logged, or included in traces.
//! - A [`Dek`] lives for the duration of one engine call and is zeroed on drop.

pub mod derive;

pub use derive::{DekDeriver, DeriveError, HmacSha256Deriver, Sha256Deriver};

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::KEY_LEN;

/// Errors produced when turning raw key material into a [`Dek`].
#[derive(Debug, Error)]
pub enum DekError {
    /// The key material has an unexpected length.
    #[error("DEK has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is zeroized to minimise the window
/// during which plaintext key material lives in RAM. Equality is only
/// available to tests, since a derived comparison is not constant-time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Dek(Box<[u8; KEY_LEN]>);

impl Dek {
    /// Copy `key_bytes` into a new [`Dek`].
    ///
    /// # Errors
    ///
    /// Returns [`DekError::InvalidLength`] if the slice is not [`KEY_LEN`] bytes.
    pub fn from_slice(key_bytes: &[u8]) -> Result<Self, DekError> {
        if key_bytes.len() != KEY_LEN {
            return Err(DekError::InvalidLength(key_bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(key_bytes);
        Ok(Self(buf))
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl From<[u8; KEY_LEN]> for Dek {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }
}

impl std::fmt::Debug for Dek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("Dek([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_copies_bytes() {
        let key = vec![0x42u8; KEY_LEN];
        let dek = Dek::from_slice(&key).unwrap();
        assert_eq!(&dek.as_bytes()[..], key.as_slice());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            Dek::from_slice(&[0u8; 16]),
            Err(DekError::InvalidLength(16))
        ));
    }

    #[test]
    fn zeroize_clears_key_bytes() {
        let mut dek = Dek::from([0xA5u8; KEY_LEN]);
        dek.zeroize();
        assert_eq!(dek.as_bytes(), &[0u8; KEY_LEN]);
    }

    #[test]
    fn redacted_in_debug() {
        let dek = Dek::from([0xFFu8; KEY_LEN]);
        let out = format!("{dek:?}");
        assert!(out.contains("REDACTED"));
        assert!(!out.contains("255"));
    }
}
