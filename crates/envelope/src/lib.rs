//! Envelope encryption with per-identity data-encryption keys.
//!
//! A DEK is derived from an identity ([`dek`]), wrapped by a KEK that never
//! leaves the key service ([`keyservice`]), and used to AES-256-CBC encrypt
//! string payloads ([`crypto`]). [`engine::EnvelopeEngine`] ties the three
//! together and classifies every failure into a [`common::ErrorType`].
//!
//! The engine is stateless: callers keep the wrapped DEK and pass it back on
//! every call.

pub mod config;
pub mod crypto;
pub mod dek;
pub mod engine;
pub mod keyservice;
pub mod server;
pub mod telemetry;

pub use common::{EnvelopeError, ErrorType};
pub use engine::EnvelopeEngine;
