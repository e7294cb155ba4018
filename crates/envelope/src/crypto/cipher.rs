//! AES-256-CBC encryption and decryption of string payloads.
//!
//! Every call to [`sym_encrypt`] draws a fresh 16-byte IV from the OS CSPRNG
//! and prepends it to the ciphertext, so identical plaintexts under the same
//! key produce distinct envelope blobs.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of the CBC initialisation vector, equal to the AES block size.
pub const IV_LEN: usize = 16;

/// AES block size. Ciphertext length is always a non-zero multiple of this.
pub const BLOCK_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// The envelope blob is too short to contain an IV.
    #[error("envelope blob too short: {0} bytes, need at least {IV_LEN}")]
    BlobTooShort(usize),

    /// The ciphertext after the IV is empty or not block aligned.
    #[error("ciphertext length {0} is not a non-zero multiple of {BLOCK_LEN}")]
    MisalignedCiphertext(usize),

    /// PKCS7 padding did not verify after decryption (usually the wrong key).
    #[error("invalid padding")]
    InvalidPadding,

    /// The decrypted bytes are not valid UTF-8.
    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Encrypt `plaintext` under `key`, returning `IV || ciphertext`.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
pub fn sym_encrypt(plaintext: &str, key: &[u8]) -> Result<Vec<u8>, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength);
    }

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|_| CipherError::InvalidKeyLength)?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut blob = Vec::with_capacity(IV_LEN + ciphertext.len());
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt an `IV || ciphertext` blob produced by [`sym_encrypt`].
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] for a key that is not [`KEY_LEN`] bytes,
/// [`CipherError::BlobTooShort`] / [`CipherError::MisalignedCiphertext`] for a
/// malformed blob, [`CipherError::InvalidPadding`] when the padding does not
/// verify, and [`CipherError::InvalidUtf8`] when the plaintext is not text.
pub fn sym_decrypt(blob: &[u8], key: &[u8]) -> Result<String, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength);
    }
    if blob.len() < IV_LEN {
        return Err(CipherError::BlobTooShort(blob.len()));
    }

    let (iv, ciphertext) = blob.split_at(IV_LEN);
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CipherError::MisalignedCiphertext(ciphertext.len()));
    }

    let plaintext = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| CipherError::InvalidKeyLength)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::InvalidPadding)?;

    Ok(String::from_utf8(plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = random_key();
        let blob = sym_encrypt("123-45-6789", &key).unwrap();
        assert_eq!(sym_decrypt(&blob, &key).unwrap(), "123-45-6789");
    }

    #[test]
    fn round_trip_empty_and_multibyte() {
        let key = random_key();
        for text in ["", "héllo wörld ✓", "exactly sixteen!"] {
            let blob = sym_encrypt(text, &key).unwrap();
            assert_eq!(sym_decrypt(&blob, &key).unwrap(), text);
        }
    }

    #[test]
    fn blob_is_iv_plus_padded_blocks() {
        let key = random_key();
        // 16 bytes of plaintext gain a full padding block.
        let blob = sym_encrypt("exactly sixteen!", &key).unwrap();
        assert_eq!(blob.len(), IV_LEN + 2 * BLOCK_LEN);

        let blob = sym_encrypt("", &key).unwrap();
        assert_eq!(blob.len(), IV_LEN + BLOCK_LEN);

        let blob = sym_encrypt("short", &key).unwrap();
        assert_eq!((blob.len() - IV_LEN) % BLOCK_LEN, 0);
    }

    #[test]
    fn fresh_iv_per_call() {
        let key = random_key();
        let a = sym_encrypt("same input", &key).unwrap();
        let b = sym_encrypt("same input", &key).unwrap();
        assert_ne!(a[..IV_LEN], b[..IV_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn short_blob_rejected() {
        let key = random_key();
        assert!(matches!(
            sym_decrypt(&[0u8; 15], &key),
            Err(CipherError::BlobTooShort(15))
        ));
    }

    #[test]
    fn iv_only_blob_rejected() {
        let key = random_key();
        assert!(matches!(
            sym_decrypt(&[0u8; IV_LEN], &key),
            Err(CipherError::MisalignedCiphertext(0))
        ));
    }

    #[test]
    fn truncated_ciphertext_rejected() {
        let key = random_key();
        let blob = sym_encrypt("truncate me please", &key).unwrap();
        assert!(matches!(
            sym_decrypt(&blob[..blob.len() - 1], &key),
            Err(CipherError::MisalignedCiphertext(_))
        ));
    }

    #[test]
    fn wrong_key_does_not_yield_plaintext() {
        let blob = sym_encrypt("secret", &random_key()).unwrap();
        // CBC has no authentication: a wrong key fails on padding or UTF-8
        // almost always, and never reproduces the plaintext.
        match sym_decrypt(&blob, &random_key()) {
            Ok(text) => assert_ne!(text, "secret"),
            Err(e) => assert!(matches!(
                e,
                CipherError::InvalidPadding | CipherError::InvalidUtf8(_)
            )),
        }
    }

    #[test]
    fn invalid_key_length_rejected() {
        let short_key = vec![0u8; 16];
        assert!(matches!(
            sym_encrypt("x", &short_key),
            Err(CipherError::InvalidKeyLength)
        ));
        assert!(matches!(
            sym_decrypt(&[0u8; 32], &short_key),
            Err(CipherError::InvalidKeyLength)
        ));
    }
}
