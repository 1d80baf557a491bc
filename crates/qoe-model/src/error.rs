//! Model loading errors

use std::path::PathBuf;

use qoe_core::QoeError;
use thiserror::Error;

/// Errors raised while loading or validating a persisted model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Cannot read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported model format '{0}'")]
    UnsupportedFormat(String),

    #[error("Feature schema mismatch: {0}")]
    Schema(String),

    #[error("Malformed model: {0}")]
    Malformed(String),
}

impl From<ModelError> for QoeError {
    fn from(err: ModelError) -> Self {
        QoeError::ModelUnavailable(err.to_string())
    }
}
