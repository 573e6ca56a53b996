//! Core capability errors (parsing, validation).
//!
//! These are bounded and stable: core errors represent domain/refusal
//! states, not library implementation details.

use thiserror::Error;

use crate::error::Transience;

/// Invalid identity key material.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("canonical id `{raw}` is invalid: {reason}")]
    Canonical { raw: String, reason: String },
    #[error("channel key `{raw}` is invalid: {reason}")]
    Channel { raw: String, reason: String },
}

/// Required input absent from both flag and environment.
#[derive(Debug, Error, Clone)]
#[error("missing {what}: pass {flag} or set {env}")]
pub struct MissingArgument {
    pub what: &'static str,
    pub flag: &'static str,
    pub env: &'static str,
}

/// Canonical core error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error(transparent)]
    MissingArgument(#[from] MissingArgument),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        // Core errors are pure domain/input failures.
        Transience::Permanent
    }
}
