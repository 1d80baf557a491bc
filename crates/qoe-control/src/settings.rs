//! Controller settings
//!
//! Loaded from a JSON file; any field left out takes its default.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use qoe_core::{Configuration, QoeError, QoeResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    HeuristicRule, SearchSpace, DEFAULT_HEURISTIC_TABLE, DEFAULT_HIGH_LOSS_THRESHOLD,
    DEFAULT_TIE_EPSILON,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(#[from] QoeError),
}

/// Tunables for every controller variant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub static_configuration: Configuration,
    pub heuristic_table: Vec<HeuristicRule>,
    pub search_space: SearchSpace,
    /// Loss (%) above which Hybrid stops consulting the model
    pub high_loss_threshold: f64,
    pub tie_epsilon: f64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            static_configuration: Configuration::BASELINE,
            heuristic_table: DEFAULT_HEURISTIC_TABLE.to_vec(),
            search_space: SearchSpace::default(),
            high_loss_threshold: DEFAULT_HIGH_LOSS_THRESHOLD,
            tie_epsilon: DEFAULT_TIE_EPSILON,
        }
    }
}

impl ControllerSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, SettingsError> {
        let settings: ControllerSettings = serde_json::from_reader(reader)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: ControllerSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Cheap checks that do not need a built controller.
    ///
    /// The table and search space are checked again when controllers are
    /// constructed from them.
    pub fn validate(&self) -> QoeResult<()> {
        self.static_configuration.validate()?;
        if !self.high_loss_threshold.is_finite()
            || !(0.0..=100.0).contains(&self.high_loss_threshold)
        {
            return Err(QoeError::InvalidSettings(format!(
                "high_loss_threshold {} outside 0..=100",
                self.high_loss_threshold
            )));
        }
        if !self.tie_epsilon.is_finite() || self.tie_epsilon < 0.0 {
            return Err(QoeError::InvalidSettings(format!(
                "tie_epsilon {} must be a non-negative number",
                self.tie_epsilon
            )));
        }
        Ok(())
    }
}
