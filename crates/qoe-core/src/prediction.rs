//! Prediction results

use serde::Serialize;

use crate::{Configuration, NetworkState};

/// A configuration scored against a network state.
///
/// The score is a regression output on the MOS scale and may fall outside
/// 1.0-5.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PredictionResult {
    pub configuration: Configuration,
    pub score: f64,
    pub state: NetworkState,
}

impl PredictionResult {
    pub fn new(configuration: Configuration, score: f64, state: NetworkState) -> Self {
        PredictionResult {
            configuration,
            score,
            state,
        }
    }
}
