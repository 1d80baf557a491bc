//! Building the controllers under comparison

use std::sync::Arc;

use qoe_core::{QoeError, QoeResult};
use qoe_model::QualityPredictor;
use tracing::info;

use crate::{
    CandidateSearch, Controller, ControllerKind, ControllerSettings, HeuristicController,
    HybridController, MlAdaptiveController, StaticController,
};

/// What to do when a controller needs a model that did not load
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModelPolicy {
    /// Refuse to build ML-Adaptive or Hybrid
    #[default]
    Required,
    /// Build Hybrid anyway (it falls back to the rule table); ML-Adaptive
    /// is still refused
    AllowFallback,
}

/// An ordered, de-duplicated collection of controllers
#[derive(Clone, Debug)]
pub struct ControllerSet {
    controllers: Vec<Arc<dyn Controller>>,
}

impl ControllerSet {
    pub fn from_settings(
        settings: &ControllerSettings,
        kinds: &[ControllerKind],
        predictor: &QualityPredictor,
        policy: ModelPolicy,
    ) -> QoeResult<Self> {
        settings.validate()?;

        let mut seen = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !seen.contains(kind) {
                seen.push(*kind);
            }
        }

        let mut controllers: Vec<Arc<dyn Controller>> = Vec::with_capacity(seen.len());
        for kind in seen {
            controllers.push(build(settings, kind, predictor, policy)?);
        }

        info!(
            controllers = ?controllers.iter().map(|c| c.name()).collect::<Vec<_>>(),
            model = predictor.is_available(),
            "Built controller set"
        );
        Ok(ControllerSet { controllers })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Controller>> {
        self.controllers.iter()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn get(&self, kind: ControllerKind) -> Option<&Arc<dyn Controller>> {
        self.controllers.iter().find(|c| c.kind() == kind)
    }
}

fn build(
    settings: &ControllerSettings,
    kind: ControllerKind,
    predictor: &QualityPredictor,
    policy: ModelPolicy,
) -> QoeResult<Arc<dyn Controller>> {
    if kind.needs_model() && !predictor.is_available() {
        let allowed = kind == ControllerKind::Hybrid && policy == ModelPolicy::AllowFallback;
        if !allowed {
            return Err(QoeError::ModelUnavailable(format!(
                "{kind} controller requires a loaded quality model"
            )));
        }
    }

    let controller: Arc<dyn Controller> = match kind {
        ControllerKind::Static => Arc::new(StaticController::new(settings.static_configuration)?),
        ControllerKind::Heuristic => Arc::new(heuristic(settings)?),
        ControllerKind::MlAdaptive => Arc::new(adaptive(settings, predictor)?),
        ControllerKind::Hybrid => Arc::new(HybridController::new(
            heuristic(settings)?,
            adaptive(settings, predictor)?,
            settings.high_loss_threshold,
        )?),
    };
    Ok(controller)
}

fn heuristic(settings: &ControllerSettings) -> QoeResult<HeuristicController> {
    HeuristicController::new(settings.heuristic_table.clone())
}

fn adaptive(
    settings: &ControllerSettings,
    predictor: &QualityPredictor,
) -> QoeResult<MlAdaptiveController> {
    let search = CandidateSearch::new(&settings.search_space)?;
    MlAdaptiveController::new(search, predictor.clone()).with_tie_epsilon(settings.tie_epsilon)
}
