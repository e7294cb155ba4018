//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Decode base64 request fields and encode responses.
//! - Run engine calls on the blocking pool; the KMS adapter blocks.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
