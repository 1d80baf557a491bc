//! Training-data generation
//!
//! Scores every search-space candidate at every loss level for every input.
//! Rows carry bitrate in kbps, the unit the offline trainer fits on.

use std::sync::Arc;

use qoe_control::CandidateSearch;
use qoe_core::Configuration;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pool::{run_bounded, Job};
use crate::{Codec, EvalResult, Input, QualityScorer, SweepConfig};

/// One training sample
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub input: String,
    pub bitrate_kbps: f64,
    pub frame_size_ms: u16,
    pub complexity: u8,
    pub use_fec: bool,
    pub packet_loss_percent: f64,
    pub mos: f64,
}

impl DatasetRow {
    fn new(input: String, config: &Configuration, loss: f64, mos: f64) -> Self {
        DatasetRow {
            input,
            bitrate_kbps: config.bitrate_kbps(),
            frame_size_ms: config.frame_size_ms,
            complexity: config.complexity,
            use_fec: config.use_fec,
            packet_loss_percent: loss,
            mos,
        }
    }
}

/// Rows ordered by input, then candidate (enumeration order), then loss
pub async fn generate<C, Q>(
    codec: C,
    scorer: Q,
    search: &CandidateSearch,
    inputs: &[Input<C::Signal>],
    config: &SweepConfig,
) -> EvalResult<Vec<DatasetRow>>
where
    C: Codec,
    Q: QualityScorer<C::Signal>,
{
    config.validate()?;
    let codec = Arc::new(codec);
    let scorer = Arc::new(scorer);
    let limit = config.max_inputs.unwrap_or(inputs.len()).min(inputs.len());
    let inputs = &inputs[..limit];

    let mut jobs = Vec::with_capacity(inputs.len() * search.len() * config.loss_grid.len());
    for input in inputs {
        for candidate in search.enumerate_candidates() {
            for &loss in &config.loss_grid {
                let codec = Arc::clone(&codec);
                let scorer = Arc::clone(&scorer);
                let input = input.clone();
                let label = format!("{}/{}/loss={}", input.name, candidate, loss);

                jobs.push(Job::new(label, move || {
                    let degraded = codec.process(&candidate, &input.signal, loss)?;
                    let mos = scorer.score(&input.signal, &degraded);
                    codec.discard(degraded);
                    Ok(DatasetRow::new(input.name, &candidate, loss, mos?))
                }));
            }
        }
    }

    info!(
        inputs = inputs.len(),
        candidates = search.len(),
        losses = config.loss_grid.len(),
        jobs = jobs.len(),
        "Generating dataset"
    );
    run_bounded(jobs, config.workers, config.error_policy).await
}
