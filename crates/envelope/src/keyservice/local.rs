//! In-process [`KeyService`] backed by an AES-256-GCM-SIV KEK.
//!
//! Wrapped form: `nonce (12 bytes) || ciphertext+tag`. The algorithm
//! identifier is bound as associated data, so a key wrapped for one
//! [`KeyWrapAlgorithm`] will not unwrap under another, mirroring how a
//! remote KMS rejects a mismatched algorithm.

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, Key, KeyInit, OsRng, Payload},
    Aes256GcmSiv, Nonce,
};
use zeroize::Zeroizing;

use super::{KeyService, KeyServiceError, KeyWrapAlgorithm};
use crate::crypto::KEY_LEN;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
const NONCE_LEN: usize = 12;

/// Byte length of the AES-GCM-SIV authentication tag.
const TAG_LEN: usize = 16;

/// A KEK that lives in process memory.
pub struct LocalKeyService {
    cipher: Aes256GcmSiv,
}

impl LocalKeyService {
    /// Build a key service around an existing 32-byte KEK.
    ///
    /// # Errors
    ///
    /// Returns [`KeyServiceError::Client`] if `kek` is not [`KEY_LEN`] bytes.
    pub fn new(kek: &[u8]) -> Result<Self, KeyServiceError> {
        if kek.len() != KEY_LEN {
            return Err(KeyServiceError::Client(format!(
                "local KEK must be {KEY_LEN} bytes, got {}",
                kek.len()
            )));
        }
        let cipher = Aes256GcmSiv::new_from_slice(kek)
            .map_err(|_| KeyServiceError::Client("invalid local KEK".into()))?;
        Ok(Self { cipher })
    }

    /// Build a key service around a fresh random KEK.
    pub fn generate() -> Self {
        let mut kek = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(kek.as_mut_slice());
        let cipher = Aes256GcmSiv::new(Key::<Aes256GcmSiv>::from_slice(kek.as_slice()));
        Self { cipher }
    }
}

impl KeyService for LocalKeyService {
    fn wrap_key(&self, algorithm: KeyWrapAlgorithm, key: &[u8]) -> Result<Vec<u8>, KeyServiceError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let sealed = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: key,
                    aad: algorithm.as_str().as_bytes(),
                },
            )
            .map_err(|_| KeyServiceError::Rejected)?;

        let mut wrapped = Vec::with_capacity(NONCE_LEN + sealed.len());
        wrapped.extend_from_slice(&nonce_bytes);
        wrapped.extend_from_slice(&sealed);
        Ok(wrapped)
    }

    fn unwrap_key(
        &self,
        algorithm: KeyWrapAlgorithm,
        wrapped_key: &[u8],
    ) -> Result<Vec<u8>, KeyServiceError> {
        if wrapped_key.len() < NONCE_LEN + TAG_LEN {
            return Err(KeyServiceError::Rejected);
        }
        let (nonce, sealed) = wrapped_key.split_at(NONCE_LEN);
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: algorithm.as_str().as_bytes(),
                },
            )
            .map_err(|_| KeyServiceError::Rejected)
    }
}

impl std::fmt::Debug for LocalKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LocalKeyService([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_unwrap_round_trip() {
        let svc = LocalKeyService::generate();
        let dek = [0x42u8; KEY_LEN];
        let wrapped = svc.wrap_key(KeyWrapAlgorithm::RsaOaep, &dek).unwrap();
        assert_ne!(&wrapped[NONCE_LEN..NONCE_LEN + KEY_LEN], &dek[..]);
        let unwrapped = svc.unwrap_key(KeyWrapAlgorithm::RsaOaep, &wrapped).unwrap();
        assert_eq!(unwrapped, dek);
    }

    #[test]
    fn algorithm_mismatch_rejected() {
        let svc = LocalKeyService::generate();
        let wrapped = svc.wrap_key(KeyWrapAlgorithm::RsaOaep, &[7u8; KEY_LEN]).unwrap();
        assert!(matches!(
            svc.unwrap_key(KeyWrapAlgorithm::RsaOaep256, &wrapped),
            Err(KeyServiceError::Rejected)
        ));
    }

    #[test]
    fn other_kek_rejected() {
        let a = LocalKeyService::new(&[1u8; KEY_LEN]).unwrap();
        let b = LocalKeyService::new(&[2u8; KEY_LEN]).unwrap();
        let wrapped = a.wrap_key(KeyWrapAlgorithm::RsaOaep, &[7u8; KEY_LEN]).unwrap();
        assert!(b.unwrap_key(KeyWrapAlgorithm::RsaOaep, &wrapped).is_err());
    }

    #[test]
    fn truncated_wrapped_key_rejected() {
        let svc = LocalKeyService::generate();
        assert!(matches!(
            svc.unwrap_key(KeyWrapAlgorithm::RsaOaep, &[0u8; 10]),
            Err(KeyServiceError::Rejected)
        ));
    }

    #[test]
    fn rejects_short_kek() {
        assert!(matches!(
            LocalKeyService::new(&[0u8; 16]),
            Err(KeyServiceError::Client(_))
        ));
    }
}
