//! [`EnvelopeEngine`]: DEK provisioning and the encrypt/decrypt data path.
//!
//! # Contract
//!
//! - `generate_encrypted_dek` derives the DEK and wraps it once.
//! - `encrypt` and `decrypt` unwrap the caller's wrapped DEK exactly once,
//!   immediately before symmetric use. The codec only ever sees the
//!   unwrapped 32-byte key.
//! - Every failure inside an operation is reported as one
//!   [`EnvelopeError`] tagged with that operation's [`ErrorType`], with the
//!   original failure kept as its source.

use std::sync::Arc;

use common::{BoxError, EnvelopeError, ErrorType};
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use crate::config::KeyVaultSettings;
use crate::crypto::{sym_decrypt, sym_encrypt};
use crate::dek::{Dek, DekDeriver, Sha256Deriver};
use crate::keyservice::{KeyService, KeyWrapAlgorithm, KmsKeyService};

/// Algorithm used on every wrap/unwrap call. Must match the provisioned KEK.
pub const WRAP_ALGORITHM: KeyWrapAlgorithm = KeyWrapAlgorithm::RsaOaep;

/// Stateless envelope-encryption engine.
///
/// Cheap to share: clone it or put it behind an `Arc`. Safe to call from many
/// threads at once as long as the injected [`KeyService`] is.
#[derive(Clone)]
pub struct EnvelopeEngine {
    key_service: Arc<dyn KeyService>,
    deriver: Arc<dyn DekDeriver>,
}

impl EnvelopeEngine {
    /// Create an engine over `key_service` using SHA-256 DEK derivation.
    pub fn new(key_service: Arc<dyn KeyService>) -> Self {
        Self {
            key_service,
            deriver: Arc::new(Sha256Deriver),
        }
    }

    /// Replace the DEK derivation strategy.
    pub fn with_deriver(mut self, deriver: Arc<dyn DekDeriver>) -> Self {
        self.deriver = deriver;
        self
    }

    /// Validate `settings` and build an engine over a [`KmsKeyService`].
    ///
    /// Settings are checked before any client is built, so invalid settings
    /// never cause a network call.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorType::InvalidConfiguration`] if a setting is blank or
    /// malformed, or if the client cannot be constructed.
    pub fn connect(settings: &KeyVaultSettings) -> Result<Self, EnvelopeError> {
        let build = || -> Result<Self, BoxError> {
            settings.validate()?;
            let kms = KmsKeyService::connect(settings)?;
            Ok(Self::new(Arc::new(kms)))
        };
        build().map_err(|e| {
            EnvelopeError::new(
                ErrorType::InvalidConfiguration,
                "error initializing envelope engine",
                e,
            )
        })
    }

    /// Derive the DEK for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorType::KeyGenerationError`] if derivation fails.
    #[instrument(skip_all)]
    pub fn generate_dek(&self, identity: &str) -> Result<Dek, EnvelopeError> {
        self.deriver.derive(identity).map_err(|e| {
            EnvelopeError::new(ErrorType::KeyGenerationError, "error generating DEK", e)
        })
    }

    /// Derive the DEK for `identity` and wrap it under the KEK.
    ///
    /// The caller owns the returned bytes and passes them back on every
    /// `encrypt`/`decrypt` call.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorType::KeyGenerationError`] if derivation or wrapping fails.
    #[instrument(skip_all, fields(algorithm = %WRAP_ALGORITHM))]
    pub fn generate_encrypted_dek(&self, identity: &str) -> Result<Vec<u8>, EnvelopeError> {
        let run = || -> Result<Vec<u8>, BoxError> {
            let dek = self.deriver.derive(identity)?;
            Ok(self.key_service.wrap_key(WRAP_ALGORITHM, dek.as_bytes())?)
        };
        let wrapped = run().map_err(|e| {
            EnvelopeError::new(
                ErrorType::KeyGenerationError,
                "error generating encrypted DEK",
                e,
            )
        })?;
        debug!(wrapped_len = wrapped.len(), "DEK wrapped");
        Ok(wrapped)
    }

    /// Encrypt `plaintext` under the DEK held in `wrapped_dek`.
    ///
    /// Returns the `IV || ciphertext` envelope blob.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorType::EncryptionError`] if unwrapping or encryption fails.
    #[instrument(skip_all, fields(algorithm = %WRAP_ALGORITHM))]
    pub fn encrypt(&self, plaintext: &str, wrapped_dek: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let run = || -> Result<Vec<u8>, BoxError> {
            let dek = self.unwrap_dek(wrapped_dek)?;
            Ok(sym_encrypt(plaintext, dek.as_bytes())?)
        };
        let blob = run().map_err(|e| {
            EnvelopeError::new(ErrorType::EncryptionError, "error encrypting data", e)
        })?;
        debug!(blob_len = blob.len(), "payload encrypted");
        Ok(blob)
    }

    /// Decrypt an envelope blob produced by [`EnvelopeEngine::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorType::DecryptionError`] if unwrapping fails, the blob is
    /// malformed, the padding does not verify, or the plaintext is not UTF-8.
    #[instrument(skip_all, fields(algorithm = %WRAP_ALGORITHM))]
    pub fn decrypt(&self, blob: &[u8], wrapped_dek: &[u8]) -> Result<String, EnvelopeError> {
        let run = || -> Result<String, BoxError> {
            let dek = self.unwrap_dek(wrapped_dek)?;
            Ok(sym_decrypt(blob, dek.as_bytes())?)
        };
        let plaintext = run().map_err(|e| {
            EnvelopeError::new(ErrorType::DecryptionError, "error decrypting data", e)
        })?;
        debug!(blob_len = blob.len(), "payload decrypted");
        Ok(plaintext)
    }

    /// The single unwrap step shared by the data path.
    fn unwrap_dek(&self, wrapped_dek: &[u8]) -> Result<Dek, BoxError> {
        let raw = Zeroizing::new(self.key_service.unwrap_key(WRAP_ALGORITHM, wrapped_dek)?);
        Ok(Dek::from_slice(&raw)?)
    }
}

impl std::fmt::Debug for EnvelopeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeEngine")
            .field("wrap_algorithm", &WRAP_ALGORITHM)
            .finish_non_exhaustive()
    }
}
