//! Error types for the decision core

use thiserror::Error;

/// Core decision errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QoeError {
    // Domain errors
    #[error("Configuration outside declared domain: {0}")]
    ConfigurationDomain(String),

    #[error("Invalid network state: {0}")]
    InvalidNetworkState(String),

    // Model errors
    #[error("Quality model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Feature mismatch: network state has no value for '{feature}'")]
    FeatureMismatch { feature: &'static str },

    #[error("Prediction failed: {0}")]
    Prediction(String),

    // Construction errors
    #[error("Candidate search space is empty")]
    EmptySearchSpace,

    #[error("Invalid heuristic table: {0}")]
    InvalidHeuristicTable(String),

    #[error("Invalid controller settings: {0}")]
    InvalidSettings(String),
}

impl QoeError {
    /// Whether the Hybrid controller may recover from this error by
    /// delegating to its rule table
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, QoeError::ModelUnavailable(_))
    }
}

/// Result type for decision-core operations
pub type QoeResult<T> = Result<T, QoeError>;
