//! Evaluation errors

use std::path::PathBuf;

use qoe_control::SettingsError;
use qoe_core::QoeError;
use qoe_model::ModelError;
use thiserror::Error;

/// Codec collaborator failures
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Codec tool '{tool}' is not available: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Codec tool '{tool}' failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Quality scorer failures
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Scorer '{program}' could not be run: {source}")]
    Unavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Scorer failed: {0}")]
    Failed(String),

    #[error("Scorer output is not a score: {0:?}")]
    Unparseable(String),

    #[error("Signals cannot be compared: {0}")]
    Incompatible(String),
}

/// Evaluation driver errors
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Decision failed: {0}")]
    Decision(#[from] QoeError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid sweep config: {0}")]
    Config(String),

    #[error("Cannot read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("{job}: {source}")]
    Job {
        job: String,
        #[source]
        source: Box<EvalError>,
    },

    #[error("Usage: {0}")]
    Usage(String),
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;
