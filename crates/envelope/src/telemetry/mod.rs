//! Tracing setup: structured JSON logs, with optional OTLP trace export.
//!
//! # Telemetry invariants
//!
//! - **No identities, plaintexts, or key material** may appear in any span
//!   attribute or log field. Engine spans are recorded with `skip_all`.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), and
//!   `RUST_LOG` overrides it.

pub mod init;

pub use init::init_telemetry;
