//! Closed error-kind set for the engine.
//!
//! Every fallible call returns a [`MelvinError`] variant instead of using
//! exceptions for control flow. Propagation policy:
//! `Timeout` and `EnergyBudgetExhausted` are locally recovered by callers
//! (partial result / refused creation), `ParseError`/`VerificationFailure`/
//! `SnapshotCorrupt`/`IOError` are surfaced, and `SnapshotCorrupt` during
//! load is fatal to startup.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MelvinError>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MelvinError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown node: {0}")]
    UnknownNode(u64),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("energy budget exhausted (used {used:.3} of {budget:.3})")]
    EnergyBudgetExhausted { used: f32, budget: f32 },

    #[error("parse error at line {line}: {reason}")]
    ParseError { line: usize, reason: String },

    #[error("verification failed: pass rate {pass_rate:.3}")]
    VerificationFailure { pass_rate: f64 },

    #[error("snapshot corrupt: {0}")]
    SnapshotCorrupt(String),

    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("contradiction detected (score {0:.3})")]
    Contradiction(f32),

    #[error("not found: {0}")]
    NotFound(String),
}

impl MelvinError {
    /// Errors that a caller is expected to recover from locally rather
    /// than unwind the whole operation.
    pub fn is_locally_recovered(&self) -> bool {
        matches!(
            self,
            MelvinError::Timeout(_)
                | MelvinError::EnergyBudgetExhausted { .. }
                | MelvinError::NotFound(_)
        )
    }
}
