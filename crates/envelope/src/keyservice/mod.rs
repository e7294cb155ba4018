//! The key-encryption-key (KEK) capability the envelope engine depends on.
//!
//! The engine never sees the KEK. It only calls [`KeyService::wrap_key`] and
//! [`KeyService::unwrap_key`] on an injected handle, so tests and alternate
//! backends plug in without touching the engine.
//!
//! Backends:
//! - [`KmsKeyService`]: an asymmetric RSA key held in AWS KMS.
//! - [`LocalKeyService`]: an in-process AES-256-GCM-SIV KEK for tests and
//!   local development.

pub mod kms;
pub mod local;

pub use kms::KmsKeyService;
pub use local::LocalKeyService;

use std::fmt;

use common::BoxError;
use thiserror::Error;

/// Asymmetric algorithm used to wrap a DEK under the KEK.
///
/// Must match the key type provisioned in the key service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyWrapAlgorithm {
    /// RSA-OAEP with SHA-1 (the classic `RSA-OAEP` identifier).
    RsaOaep,
    /// RSA-OAEP with SHA-256.
    RsaOaep256,
}

impl KeyWrapAlgorithm {
    /// Canonical identifier, e.g. `"RSA-OAEP"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyWrapAlgorithm::RsaOaep => "RSA-OAEP",
            KeyWrapAlgorithm::RsaOaep256 => "RSA-OAEP-256",
        }
    }
}

impl fmt::Display for KeyWrapAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by a [`KeyService`] backend.
#[derive(Debug, Error)]
pub enum KeyServiceError {
    /// Settings could not be turned into a working client.
    #[error("key service client could not be constructed: {0}")]
    Client(String),

    /// The remote wrap/unwrap call failed.
    #[error("key service request failed")]
    Request(#[source] BoxError),

    /// The service answered without any key material.
    #[error("key service response contained no key material")]
    EmptyResponse,

    /// The wrapped key does not open under this KEK and algorithm.
    #[error("wrapped key rejected")]
    Rejected,

    /// The backend has been shut down and can no longer serve calls.
    #[error("key service is shut down")]
    Shutdown,
}

/// Wrap and unwrap DEKs with a KEK the caller never sees.
///
/// Implementations are shared across threads and must be safe for
/// concurrent use. Calls may block on a network round-trip; the engine adds
/// no timeout or retry of its own.
#[cfg_attr(test, mockall::automock)]
pub trait KeyService: Send + Sync {
    /// Encrypt `key` under the KEK.
    fn wrap_key(&self, algorithm: KeyWrapAlgorithm, key: &[u8]) -> Result<Vec<u8>, KeyServiceError>;

    /// Recover the plaintext key from `wrapped_key`.
    fn unwrap_key(
        &self,
        algorithm: KeyWrapAlgorithm,
        wrapped_key: &[u8],
    ) -> Result<Vec<u8>, KeyServiceError>;
}
