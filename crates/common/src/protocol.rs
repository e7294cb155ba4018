//! Request and response types exchanged over the HTTP API.
//!
//! Byte-valued fields (wrapped DEKs, envelope blobs) travel as standard
//! base64 strings; decoding happens in the server layer.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DEK provisioning
// ---------------------------------------------------------------------------

/// Request body for `POST /dek`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedDekRequest {
    /// Identity the DEK is derived from (typically an email address).
    pub identity: String,
}

/// Successful response body for `POST /dek`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedDekResponse {
    /// Base64 of the KEK-wrapped DEK. The caller owns its storage.
    pub wrapped_dek: String,
}

// ---------------------------------------------------------------------------
// Data path
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// UTF-8 payload to encrypt.
    pub plaintext: String,
    /// Base64 of the wrapped DEK returned by `POST /dek`.
    pub wrapped_dek: String,
}

/// Successful response body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// Base64 of the `IV || ciphertext` envelope blob.
    pub ciphertext: String,
}

/// Request body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptRequest {
    /// Base64 of an envelope blob produced by `POST /encrypt`.
    pub ciphertext: String,
    /// Base64 of the wrapped DEK the blob was encrypted under.
    pub wrapped_dek: String,
}

/// Successful response body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub plaintext: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: always `"ok"` once the engine is constructed.
    pub status: String,
    /// Wrap algorithm the KEK is used with (e.g. `"RSA-OAEP"`).
    pub key_algorithm: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decrypt_request_field_names() {
        let req: DecryptRequest = serde_json::from_value(json!({
            "ciphertext": "AAAA",
            "wrapped_dek": "BBBB",
        }))
        .unwrap();
        assert_eq!(req.ciphertext, "AAAA");
        assert_eq!(req.wrapped_dek, "BBBB");
    }

    #[test]
    fn encrypt_request_rejects_missing_wrapped_dek() {
        let res: Result<EncryptRequest, _> =
            serde_json::from_value(json!({"plaintext": "hello"}));
        assert!(res.is_err());
    }

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("bad_request", "wrapped_dek is not valid base64");
        assert_eq!(e.code, "bad_request");
        assert!(e.message.contains("base64"));
    }
}
