//! Hybrid arbitration between the rule table and the quality model

use qoe_core::{Configuration, NetworkState, QoeError, QoeResult};
use tracing::{debug, warn};

use crate::{
    Branch, Controller, ControllerKind, Decision, HeuristicController, MlAdaptiveController,
};

/// Loss (%) above which the model is not trusted
pub const DEFAULT_HIGH_LOSS_THRESHOLD: f64 = 10.0;

/// Delegates to ML-Adaptive at or below the high-loss threshold and to the
/// Heuristic table above it.
///
/// The model was fitted mostly on low-loss clean speech, so its predictions
/// in the high-loss tail are not used. When the model is unavailable the
/// table is used at every loss level. Other prediction errors propagate.
#[derive(Clone, Debug)]
pub struct HybridController {
    heuristic: HeuristicController,
    adaptive: MlAdaptiveController,
    high_loss_threshold: f64,
}

impl HybridController {
    pub fn new(
        heuristic: HeuristicController,
        adaptive: MlAdaptiveController,
        high_loss_threshold: f64,
    ) -> QoeResult<Self> {
        if !high_loss_threshold.is_finite() || !(0.0..=100.0).contains(&high_loss_threshold) {
            return Err(QoeError::InvalidSettings(format!(
                "high-loss threshold {high_loss_threshold} outside 0..=100"
            )));
        }
        if !adaptive.predictor().is_available() {
            warn!("Hybrid controller built without a quality model; rule table only");
        }
        Ok(HybridController {
            heuristic,
            adaptive,
            high_loss_threshold,
        })
    }

    pub fn high_loss_threshold(&self) -> f64 {
        self.high_loss_threshold
    }

    pub fn heuristic(&self) -> &HeuristicController {
        &self.heuristic
    }

    pub fn adaptive(&self) -> &MlAdaptiveController {
        &self.adaptive
    }

    /// Decide and record which branch was taken
    pub fn arbitrate(&self, state: &NetworkState) -> QoeResult<Decision> {
        let loss = state.packet_loss_percent();

        if loss > self.high_loss_threshold {
            debug!(loss, threshold = self.high_loss_threshold, "High loss, using rule table");
            return self.fallback(state, Branch::HighLoss);
        }

        match self.adaptive.decide_scored(state) {
            Ok(best) => Ok(Decision {
                configuration: best.configuration,
                branch: Some(Branch::Learned),
                predicted_score: Some(best.score),
            }),
            Err(err) if err.is_model_unavailable() => {
                debug!(loss, error = %err, "Model unavailable, using rule table");
                self.fallback(state, Branch::ModelUnavailable)
            }
            Err(err) => Err(err),
        }
    }

    fn fallback(&self, state: &NetworkState, branch: Branch) -> QoeResult<Decision> {
        Ok(Decision {
            configuration: self.heuristic.decide(state)?,
            branch: Some(branch),
            predicted_score: None,
        })
    }
}

impl Controller for HybridController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Hybrid
    }

    fn decide(&self, state: &NetworkState) -> QoeResult<Configuration> {
        self.arbitrate(state).map(|decision| decision.configuration)
    }

    fn decide_traced(&self, state: &NetworkState) -> QoeResult<Decision> {
        self.arbitrate(state)
    }
}
