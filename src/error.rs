//! Error types of the evaluation engine.

use thiserror::Error;

/// Errors raised while building or evaluating sequences, distances and formulas.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The size of the second sample set is not a multiple of the first.
    #[error("sample set size mismatch: {other} is not a multiple of {this}")]
    SizeMismatch { this: usize, other: usize },

    /// A time window whose lower bound exceeds its upper bound.
    #[error("malformed time window [{from}, {to}]")]
    MalformedWindow { from: usize, to: usize },

    /// A name that is not present in the relevant registry.
    #[error("unknown {kind} '{name}'")]
    UnknownReference { kind: &'static str, name: String },

    /// Step generation was stopped by the sequence monitor.
    #[error("generation of step {step} was cancelled")]
    Cancelled { step: usize },

    /// A construction or evaluation parameter outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A controller was declared but never given a body.
    #[error("controller '{0}' was declared but never bound")]
    UnboundController(String),
}

pub type Result<T> = std::result::Result<T, Error>;
