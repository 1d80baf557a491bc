//! Sweep configuration

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use qoe_control::ControllerKind;
use qoe_core::NetworkState;
use serde::{Deserialize, Serialize};

use crate::{EvalError, EvalResult};

/// Loss levels (%) the training grid was generated on
pub const DATASET_LOSS_GRID: [f64; 7] = [0.0, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0];

/// Controller comparison grid; extends past the hybrid threshold
pub const SWEEP_LOSS_GRID: [f64; 10] = [0.0, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 15.0, 20.0, 30.0];

/// What a failed sample does to the run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop at the first failure
    #[default]
    Abort,
    /// Log the failure and drop the sample
    Skip,
}

/// Sweep configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Packet loss levels (%)
    pub loss_grid: Vec<f64>,
    /// Controllers to compare (sweep mode)
    pub controllers: Vec<ControllerKind>,
    /// Maximum concurrent jobs
    pub workers: usize,
    pub error_policy: ErrorPolicy,
    /// Seed for simulated collaborators and synthetic inputs
    pub seed: u64,
    /// Use at most this many inputs
    pub max_inputs: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            loss_grid: SWEEP_LOSS_GRID.to_vec(),
            controllers: ControllerKind::ALL.to_vec(),
            workers: default_workers(),
            error_policy: ErrorPolicy::Abort,
            seed: 0,
            max_inputs: None,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl SweepConfig {
    /// Small grid for smoke runs
    pub fn quick() -> Self {
        SweepConfig {
            loss_grid: vec![0.0, 5.0, 20.0],
            workers: 2,
            error_policy: ErrorPolicy::Skip,
            max_inputs: Some(2),
            ..Default::default()
        }
    }

    /// Training-data generation over the original loss grid
    pub fn dataset() -> Self {
        SweepConfig {
            loss_grid: DATASET_LOSS_GRID.to_vec(),
            error_policy: ErrorPolicy::Skip,
            ..Default::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> EvalResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EvalError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SweepConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EvalResult<()> {
        if self.workers == 0 {
            return Err(EvalError::Config("workers must be at least 1".into()));
        }
        if self.loss_grid.is_empty() {
            return Err(EvalError::Config("loss grid is empty".into()));
        }
        for loss in &self.loss_grid {
            NetworkState::new(*loss)?;
        }
        Ok(())
    }

    /// Network states for the loss grid
    pub fn states(&self) -> EvalResult<Vec<NetworkState>> {
        self.loss_grid
            .iter()
            .map(|loss| NetworkState::new(*loss).map_err(EvalError::from))
            .collect()
    }
}
