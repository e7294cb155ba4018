//! Error classification and request/response types shared across `envelope-kms` crates.

pub mod error;
pub mod protocol;

pub use error::{BoxError, EnvelopeError, ErrorType};
