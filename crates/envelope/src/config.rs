//! Configuration loading and validation.
//!
//! [`KeyVaultSettings`] is what the engine needs to reach the key service.
//! [`Config`] is the full `envelope-svc` configuration, read from environment
//! variables at startup.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hyper::Uri;
use serde::Deserialize;
use thiserror::Error;

/// Errors found while validating [`KeyVaultSettings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is missing or blank.
    #[error("{0} is required and must not be empty")]
    Missing(&'static str),

    /// The vault URI is not an absolute http(s) URI.
    #[error("VAULT_URI is not an absolute http(s) URI: {0}")]
    InvalidVaultUri(String),
}

/// Connection settings for the key service holding the KEK.
#[derive(Clone, Default, Deserialize)]
pub struct KeyVaultSettings {
    /// Key service endpoint URI. **Required.**
    #[serde(default)]
    pub vault_uri: String,

    /// Tenant the KEK lives in; the KMS region. **Required.**
    #[serde(default)]
    pub tenant_id: String,

    /// Client identifier; the access key id. **Required.**
    #[serde(default)]
    pub client_id: String,

    /// Client secret; the secret access key. **Required.**
    #[serde(default)]
    pub client_secret: String,

    /// Identifier of the KEK (key id, ARN, or alias). **Required.**
    #[serde(default)]
    pub key_id: String,
}

impl KeyVaultSettings {
    /// Validate all fields, returning a descriptive error on the first failure.
    ///
    /// Performs no I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_empty(&self.vault_uri, "VAULT_URI")?;
        ensure_non_empty(&self.tenant_id, "TENANT_ID")?;
        ensure_non_empty(&self.client_id, "CLIENT_ID")?;
        ensure_non_empty(&self.client_secret, "CLIENT_SECRET")?;
        ensure_non_empty(&self.key_id, "KEY_ID")?;

        let uri: Uri = self
            .vault_uri
            .parse()
            .map_err(|_| ConfigError::InvalidVaultUri(self.vault_uri.clone()))?;
        match (uri.scheme_str(), uri.host()) {
            (Some("https" | "http"), Some(_)) => Ok(()),
            _ => Err(ConfigError::InvalidVaultUri(self.vault_uri.clone())),
        }
    }
}

impl std::fmt::Debug for KeyVaultSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVaultSettings")
            .field("vault_uri", &self.vault_uri)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("key_id", &self.key_id)
            .finish()
    }
}

fn ensure_non_empty(value: &str, name: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(())
}

/// Validated `envelope-svc` configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Key service endpoint URI.
    #[serde(default)]
    pub vault_uri: String,

    /// Tenant the KEK lives in (KMS region).
    #[serde(default)]
    pub tenant_id: String,

    /// Client identifier (access key id).
    #[serde(default)]
    pub client_id: String,

    /// Client secret (secret access key).
    #[serde(default)]
    pub client_secret: String,

    /// KEK identifier.
    #[serde(default)]
    pub key_id: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// OTLP endpoint for trace export. Logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Base64 secret that switches DEK derivation to HMAC-SHA256.
    #[serde(default)]
    pub dek_derivation_key: Option<String>,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("key_vault", &self.key_vault())
            .field("listen_port", &self.listen_port)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .field("dek_derivation_key", &self.dek_derivation_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Key-vault settings are checked later by
    /// [`EnvelopeEngine::connect`](crate::engine::EnvelopeEngine::connect) so
    /// that they surface as `InvalidConfiguration`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The key service connection settings, unvalidated.
    pub fn key_vault(&self) -> KeyVaultSettings {
        KeyVaultSettings {
            vault_uri: self.vault_uri.clone(),
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            key_id: self.key_id.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }
        self.derivation_secret()?;
        Ok(())
    }

    /// Decode `DEK_DERIVATION_KEY`, if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not valid base64 or decodes to nothing.
    pub fn derivation_secret(&self) -> Result<Option<Vec<u8>>> {
        let Some(encoded) = self.dek_derivation_key.as_deref() else {
            return Ok(None);
        };
        let secret = STANDARD
            .decode(encoded.trim())
            .context("DEK_DERIVATION_KEY is not valid base64")?;
        if secret.is_empty() {
            anyhow::bail!("DEK_DERIVATION_KEY must not be empty");
        }
        Ok(Some(secret))
    }
}
