//! [`KeyService`] backed by an asymmetric RSA key held in AWS KMS.
//!
//! The SDK is async; the engine is not. Each [`KmsKeyService`] owns a small
//! private tokio runtime and blocks on it for the duration of one KMS call.
//! Async callers must therefore reach it through
//! [`tokio::task::spawn_blocking`].
//!
//! SDK retries are disabled: one failed remote call fails the operation.

use std::future::Future;

use aws_sdk_kms::config::{retry::RetryConfig, BehaviorVersion, Credentials, Region};
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::EncryptionAlgorithmSpec;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{KeyService, KeyServiceError, KeyWrapAlgorithm};
use crate::config::KeyVaultSettings;

/// Provider name attached to the static credentials built from settings.
const CREDENTIALS_PROVIDER: &str = "envelope-key-vault-settings";

impl From<KeyWrapAlgorithm> for EncryptionAlgorithmSpec {
    fn from(algorithm: KeyWrapAlgorithm) -> Self {
        match algorithm {
            KeyWrapAlgorithm::RsaOaep => EncryptionAlgorithmSpec::RsaesOaepSha1,
            KeyWrapAlgorithm::RsaOaep256 => EncryptionAlgorithmSpec::RsaesOaepSha256,
        }
    }
}

/// KMS client bound to one KEK.
pub struct KmsKeyService {
    client: aws_sdk_kms::Client,
    key_id: String,
    // `None` only after `Drop` has handed the runtime to `shutdown_background`.
    runtime: Option<Runtime>,
}

impl KmsKeyService {
    /// Build a KMS client from already-validated `settings`.
    ///
    /// Makes no network call: credentials are static and the endpoint is fixed.
    ///
    /// # Errors
    ///
    /// Returns [`KeyServiceError::Client`] if the private runtime cannot be started.
    pub fn connect(settings: &KeyVaultSettings) -> Result<Self, KeyServiceError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("kms-key-service")
            .enable_all()
            .build()
            .map_err(|e| KeyServiceError::Client(format!("failed to start KMS runtime: {e}")))?;

        let credentials = Credentials::new(
            settings.client_id.clone(),
            settings.client_secret.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let conf = aws_sdk_kms::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.tenant_id.clone()))
            .credentials_provider(credentials)
            .endpoint_url(settings.vault_uri.clone())
            .retry_config(RetryConfig::disabled())
            .build();

        debug!(
            endpoint = %settings.vault_uri,
            region = %settings.tenant_id,
            "KMS key service client constructed"
        );

        Ok(Self {
            client: aws_sdk_kms::Client::from_conf(conf),
            key_id: settings.key_id.clone(),
            runtime: Some(runtime),
        })
    }

    fn block_on<F: Future>(&self, fut: F) -> Result<F::Output, KeyServiceError> {
        let runtime = self.runtime.as_ref().ok_or(KeyServiceError::Shutdown)?;
        Ok(runtime.block_on(fut))
    }
}

impl KeyService for KmsKeyService {
    fn wrap_key(&self, algorithm: KeyWrapAlgorithm, key: &[u8]) -> Result<Vec<u8>, KeyServiceError> {
        let resp = self
            .block_on(
                self.client
                    .encrypt()
                    .key_id(&self.key_id)
                    .plaintext(Blob::new(key.to_vec()))
                    .encryption_algorithm(algorithm.into())
                    .send(),
            )?
            .map_err(|e| KeyServiceError::Request(Box::new(e)))?;

        resp.ciphertext_blob()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or(KeyServiceError::EmptyResponse)
    }

    fn unwrap_key(
        &self,
        algorithm: KeyWrapAlgorithm,
        wrapped_key: &[u8],
    ) -> Result<Vec<u8>, KeyServiceError> {
        let resp = self
            .block_on(
                self.client
                    .decrypt()
                    .key_id(&self.key_id)
                    .ciphertext_blob(Blob::new(wrapped_key.to_vec()))
                    .encryption_algorithm(algorithm.into())
                    .send(),
            )?
            .map_err(|e| KeyServiceError::Request(Box::new(e)))?;

        resp.plaintext()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or(KeyServiceError::EmptyResponse)
    }
}

impl Drop for KmsKeyService {
    fn drop(&mut self) {
        // A plain drop panics when it happens inside an async context
        // (e.g. the HTTP server's state being torn down).
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for KmsKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmsKeyService")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}
