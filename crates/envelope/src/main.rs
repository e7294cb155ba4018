//! `envelope-svc` — HTTP front end for the envelope engine.
//!
//! Startup sequence:
//! 1. Load [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP).
//! 3. Validate key-vault settings and construct the [`EnvelopeEngine`].
//! 4. Build the Axum router and start the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use envelope::config::Config;
use envelope::dek::HmacSha256Deriver;
use envelope::engine::{EnvelopeEngine, WRAP_ALGORITHM};
use envelope::server::{self, state::AppState};
use envelope::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        key_algorithm = %WRAP_ALGORITHM,
        "envelope-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Envelope engine
    // -----------------------------------------------------------------------
    let mut engine = EnvelopeEngine::connect(&cfg.key_vault())
        .context("failed to construct envelope engine")?;
    if let Some(secret) = cfg.derivation_secret()? {
        let deriver = HmacSha256Deriver::new(secret).context("invalid DEK_DERIVATION_KEY")?;
        engine = engine.with_deriver(Arc::new(deriver));
        info!("DEK derivation keyed with HMAC-SHA256");
    }

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(AppState::new(engine));

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
