// src/breach/mod.rs
// =============================================================================
// This module checks addresses against a breach-notification service.
//
// Submodules:
// - client: The HTTP client with retry and server-driven backoff
// =============================================================================

mod client;

pub use client::{BreachCheckState, BreachChecker, BreachStatus, Sleeper, TokioSleeper};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BreachError {
    /// Every attempt failed or was rate limited
    #[error("breach check for {address} failed after all retries (last error: {})", .last_error.as_deref().unwrap_or("none"))]
    Exhausted {
        address: String,
        last_error: Option<String>,
    },
    /// The service asked us to wait longer than we are willing to
    #[error("breach service asked to retry after {retry_after}s")]
    Timeout { retry_after: f64 },
    /// A configured wait cannot be represented as a duration
    #[error("invalid breach config: {0}")]
    InvalidConfig(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
