//! Codec and scorer collaborator traits
//!
//! The sweep drives these from blocking worker threads, so both must be
//! shareable across threads and must not rely on per-call mutable state.

use qoe_core::Configuration;

use crate::{CodecError, ScoreError};

/// Encodes a source signal with a configuration, drops packets at the given
/// rate, and decodes the result.
pub trait Codec: Send + Sync + 'static {
    /// Signal representation (an audio file, an in-memory buffer)
    type Signal: Send + Sync + 'static;

    fn process(
        &self,
        config: &Configuration,
        source: &Self::Signal,
        loss_percent: f64,
    ) -> Result<Self::Signal, CodecError>;

    /// Release a degraded signal once it has been scored
    fn discard(&self, _degraded: Self::Signal) {}
}

/// Compares a degraded signal with its reference and returns a MOS-like
/// score (higher is better, nominally 1.0 to 4.5).
pub trait QualityScorer<S>: Send + Sync + 'static {
    fn score(&self, reference: &S, degraded: &S) -> Result<f64, ScoreError>;
}
