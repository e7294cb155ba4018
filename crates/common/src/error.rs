//! Tagged error type returned by every envelope operation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed, thread-safe error used as the chained cause of an [`EnvelopeError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The phase an [`EnvelopeError`] was raised in.
///
/// Each public operation maps to exactly one kind:
/// - construction → [`ErrorType::InvalidConfiguration`]
/// - DEK derivation / wrapping → [`ErrorType::KeyGenerationError`]
/// - unwrap + symmetric encryption → [`ErrorType::EncryptionError`]
/// - unwrap + symmetric decryption → [`ErrorType::DecryptionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// Missing or malformed key-vault connection settings.
    InvalidConfiguration,
    /// Unwrapping the DEK or encrypting the payload failed.
    EncryptionError,
    /// Unwrapping the DEK, decrypting the payload, or parsing the envelope failed.
    DecryptionError,
    /// Deriving or wrapping a DEK failed.
    KeyGenerationError,
}

impl ErrorType {
    /// Short machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorType::InvalidConfiguration => "invalid_configuration",
            ErrorType::EncryptionError => "encryption_error",
            ErrorType::DecryptionError => "decryption_error",
            ErrorType::KeyGenerationError => "key_generation_error",
        }
    }

    /// Returns the HTTP status code that should be sent for this error kind.
    ///
    /// Decryption failures are almost always caused by caller-supplied bytes
    /// (truncated blob, wrong wrapped DEK), so they surface as 400.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorType::DecryptionError => 400,
            ErrorType::InvalidConfiguration
            | ErrorType::EncryptionError
            | ErrorType::KeyGenerationError => 500,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Failure of a public envelope operation.
///
/// Carries the operation's [`ErrorType`], a fixed message, and the original
/// failure as [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EnvelopeError {
    kind: ErrorType,
    message: &'static str,
    #[source]
    source: BoxError,
}

impl EnvelopeError {
    /// Tag `source` with `kind` and a fixed descriptive `message`.
    pub fn new(kind: ErrorType, message: &'static str, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            message,
            source: source.into(),
        }
    }

    /// The phase this error was raised in.
    pub fn kind(&self) -> ErrorType {
        self.kind
    }

    /// The fixed message for the failing operation.
    pub fn message(&self) -> &'static str {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn http_status_codes() {
        assert_eq!(ErrorType::DecryptionError.http_status(), 400);
        assert_eq!(ErrorType::EncryptionError.http_status(), 500);
        assert_eq!(ErrorType::KeyGenerationError.http_status(), 500);
        assert_eq!(ErrorType::InvalidConfiguration.http_status(), 500);
    }

    #[test]
    fn display_is_fixed_message() {
        let e = EnvelopeError::new(ErrorType::EncryptionError, "error encrypting data", "boom");
        assert_eq!(e.to_string(), "error encrypting data");
        assert_eq!(e.kind(), ErrorType::EncryptionError);
    }

    #[test]
    fn source_is_chained() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "kms unreachable");
        let e = EnvelopeError::new(ErrorType::KeyGenerationError, "error generating DEK", cause);
        let source = e.source().expect("cause must be preserved");
        assert!(source.to_string().contains("kms unreachable"));
    }

    #[test]
    fn kind_serialises_as_variant_name() {
        let json = serde_json::to_string(&ErrorType::InvalidConfiguration).unwrap();
        assert_eq!(json, "\"InvalidConfiguration\"");
    }
}
