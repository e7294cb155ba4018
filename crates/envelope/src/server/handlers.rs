//! Axum request handlers for all service endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::{
    DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, ErrorResponse,
    HealthResponse, WrappedDekRequest, WrappedDekResponse,
};
use common::EnvelopeError;
use std::error::Error as _;
use tracing::{debug, error, warn};

use super::state::AppState;
use crate::engine::WRAP_ALGORITHM;

/// `POST /dek` — derive the DEK for an identity and return it wrapped.
///
/// The plaintext DEK never leaves the process.
pub async fn wrapped_dek(
    State(state): State<AppState>,
    body: Result<Json<WrappedDekRequest>, JsonRejection>,
) -> Response {
    let req = match json_body(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let engine = state.engine;
    let wrapped = match run_blocking(move || engine.generate_encrypted_dek(&req.identity)).await
    {
        Ok(w) => w,
        Err(resp) => return resp,
    };

    let body = WrappedDekResponse {
        wrapped_dek: STANDARD.encode(wrapped),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// `POST /encrypt` — encrypt a plaintext under the caller's wrapped DEK.
pub async fn encrypt(
    State(state): State<AppState>,
    body: Result<Json<EncryptRequest>, JsonRejection>,
) -> Response {
    let req = match json_body(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let wrapped_dek = match decode_field("wrapped_dek", &req.wrapped_dek) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let engine = state.engine;
    let plaintext = req.plaintext;
    let blob = match run_blocking(move || engine.encrypt(&plaintext, &wrapped_dek)).await {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let body = EncryptResponse {
        ciphertext: STANDARD.encode(blob),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// `POST /decrypt` — decrypt an envelope blob under the caller's wrapped DEK.
pub async fn decrypt(
    State(state): State<AppState>,
    body: Result<Json<DecryptRequest>, JsonRejection>,
) -> Response {
    let req = match json_body(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let blob = match decode_field("ciphertext", &req.ciphertext) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let wrapped_dek = match decode_field("wrapped_dek", &req.wrapped_dek) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let engine = state.engine;
    let plaintext = match run_blocking(move || engine.decrypt(&blob, &wrapped_dek)).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    (StatusCode::OK, Json(DecryptResponse { plaintext })).into_response()
}

/// `GET /health` — liveness check.
///
/// The engine is constructed before the listener binds, so a running server
/// is always healthy. The KEK itself is not probed.
pub async fn health() -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        key_algorithm: WRAP_ALGORITHM.as_str().into(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run a synchronous engine call on the blocking pool.
///
/// The KMS key service blocks on its own runtime and must not run on an
/// async worker thread.
async fn run_blocking<T, F>(f: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, EnvelopeError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(envelope_error_response(&e)),
        Err(e) => {
            error!(error = %e, "engine task panicked or was cancelled");
            let err = ErrorResponse::new("internal_error", "internal error");
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(err)).into_response())
        }
    }
}

/// Map an [`EnvelopeError`] to its HTTP response.
///
/// Only the fixed operation message reaches the caller; the cause is logged.
fn envelope_error_response(e: &EnvelopeError) -> Response {
    let cause = e.source().map(ToString::to_string);
    warn!(kind = %e.kind(), error = %e, cause = ?cause, "envelope operation failed");

    let status =
        StatusCode::from_u16(e.kind().http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let err = ErrorResponse::new(e.kind().code(), e.message());
    (status, Json(err)).into_response()
}

/// Unpack a JSON request body, answering 400 `bad_request` on any rejection.
///
/// The rejection text can quote field values, so it is logged at debug level
/// only and never returned to the caller.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(req)| req).map_err(|rejection| {
        debug!(status = %rejection.status(), error = %rejection.body_text(), "rejected request body");
        let err = ErrorResponse::new("bad_request", "request body is not a valid JSON request");
        (StatusCode::BAD_REQUEST, Json(err)).into_response()
    })
}

/// Decode a base64 request field, answering 400 on failure.
fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, Response> {
    STANDARD.decode(value).map_err(|_| {
        let err = ErrorResponse::new("bad_request", format!("{name} is not valid base64"));
        (StatusCode::BAD_REQUEST, Json(err)).into_response()
    })
}
