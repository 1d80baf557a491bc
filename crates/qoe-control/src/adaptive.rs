//! Model-driven controller

use qoe_core::{Configuration, NetworkState, PredictionResult, QoeError, QoeResult};
use qoe_model::QualityPredictor;
use tracing::trace;

use crate::controller::in_domain;
use crate::{CandidateSearch, Controller, ControllerKind, Decision, DEFAULT_TIE_EPSILON};

/// Scores every candidate with the quality model and returns the best.
///
/// Fails with `ModelUnavailable` when the predictor has no model; errors
/// from the predictor are never masked.
#[derive(Clone, Debug)]
pub struct MlAdaptiveController {
    search: CandidateSearch,
    predictor: QualityPredictor,
    tie_epsilon: f64,
}

impl MlAdaptiveController {
    pub fn new(search: CandidateSearch, predictor: QualityPredictor) -> Self {
        MlAdaptiveController {
            search,
            predictor,
            tie_epsilon: DEFAULT_TIE_EPSILON,
        }
    }

    pub fn with_tie_epsilon(mut self, tie_epsilon: f64) -> QoeResult<Self> {
        if !tie_epsilon.is_finite() || tie_epsilon < 0.0 {
            return Err(QoeError::InvalidSettings(format!(
                "tie epsilon {tie_epsilon} must be a non-negative number"
            )));
        }
        self.tie_epsilon = tie_epsilon;
        Ok(self)
    }

    pub fn search(&self) -> &CandidateSearch {
        &self.search
    }

    pub fn predictor(&self) -> &QualityPredictor {
        &self.predictor
    }

    /// Best candidate together with its predicted score
    pub fn decide_scored(&self, state: &NetworkState) -> QoeResult<PredictionResult> {
        let best = self.search.best(&self.predictor, state, self.tie_epsilon)?;
        in_domain(best.configuration)?;
        trace!(
            loss = state.packet_loss_percent(),
            config = %best.configuration,
            score = best.score,
            "ML-adaptive decision"
        );
        Ok(best)
    }
}

impl Controller for MlAdaptiveController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::MlAdaptive
    }

    fn decide(&self, state: &NetworkState) -> QoeResult<Configuration> {
        self.decide_scored(state).map(|best| best.configuration)
    }

    fn decide_traced(&self, state: &NetworkState) -> QoeResult<Decision> {
        let best = self.decide_scored(state)?;
        Ok(Decision {
            configuration: best.configuration,
            branch: None,
            predicted_score: Some(best.score),
        })
    }
}
