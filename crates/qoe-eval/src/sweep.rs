//! Controller comparison sweep

use std::sync::Arc;
use std::time::Instant;

use qoe_control::{Branch, Controller, ControllerSet};
use qoe_core::{Configuration, NetworkState};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pool::{run_bounded, Job};
use crate::{Codec, EvalResult, Input, QualityScorer, SweepConfig};

/// One scored decision
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub input: String,
    pub controller: String,
    pub packet_loss_percent: f64,
    pub configuration: Configuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_score: Option<f64>,
    pub mos: f64,
    /// Wall time of the codec and scorer calls
    pub processing_ms: f64,
}

/// Runs every controller over inputs x loss grid and scores the outcome.
pub struct Sweep<C, Q> {
    codec: Arc<C>,
    scorer: Arc<Q>,
    controllers: ControllerSet,
    config: SweepConfig,
}

impl<C, Q> Sweep<C, Q>
where
    C: Codec,
    Q: QualityScorer<C::Signal>,
{
    pub fn new(codec: C, scorer: Q, controllers: ControllerSet, config: SweepConfig) -> Self {
        Sweep {
            codec: Arc::new(codec),
            scorer: Arc::new(scorer),
            controllers,
            config,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Observations ordered by input, then loss, then controller
    pub async fn run(&self, inputs: &[Input<C::Signal>]) -> EvalResult<Vec<Observation>> {
        self.config.validate()?;
        let states = self.config.states()?;
        let limit = self.config.max_inputs.unwrap_or(inputs.len());
        let inputs = &inputs[..limit.min(inputs.len())];

        let mut jobs = Vec::with_capacity(inputs.len() * states.len() * self.controllers.len());
        for input in inputs {
            for state in &states {
                for controller in self.controllers.iter() {
                    jobs.push(self.job(input.clone(), *state, Arc::clone(controller)));
                }
            }
        }

        info!(
            inputs = inputs.len(),
            losses = states.len(),
            controllers = self.controllers.len(),
            jobs = jobs.len(),
            "Starting sweep"
        );
        run_bounded(jobs, self.config.workers, self.config.error_policy).await
    }

    fn job(
        &self,
        input: Input<C::Signal>,
        state: NetworkState,
        controller: Arc<dyn Controller>,
    ) -> Job<Observation> {
        let codec = Arc::clone(&self.codec);
        let scorer = Arc::clone(&self.scorer);
        let label = format!(
            "{}/{}/loss={}",
            input.name,
            controller.name(),
            state.packet_loss_percent()
        );

        Job::new(label, move || {
            let decision = controller.decide_traced(&state)?;
            let loss = state.packet_loss_percent();

            let started = Instant::now();
            let degraded = codec.process(&decision.configuration, &input.signal, loss)?;
            let mos = scorer.score(&input.signal, &degraded);
            codec.discard(degraded);
            let mos = mos?;
            let processing_ms = started.elapsed().as_secs_f64() * 1000.0;

            Ok(Observation {
                input: input.name,
                controller: controller.name().to_string(),
                packet_loss_percent: loss,
                configuration: decision.configuration,
                branch: decision.branch,
                predicted_score: decision.predicted_score,
                mos,
                processing_ms,
            })
        })
    }
}
