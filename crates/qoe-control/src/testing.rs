//! Fixtures shared by the controller tests

use std::sync::Arc;

use qoe_core::{Configuration, QoeResult};
use qoe_model::{FeatureSchema, LinearModel, QualityModel, QualityPredictor};

/// Scores one configuration high and everything else low
#[derive(Debug)]
pub struct PreferModel {
    pub target: Configuration,
}

impl QualityModel for PreferModel {
    fn arity(&self) -> usize {
        4
    }

    fn predict(&self, features: &[f64]) -> QoeResult<f64> {
        let hit = features[0] == self.target.bitrate_kbps()
            && features[1] == self.target.frame_size_ms as f64
            && (features[2] == 1.0) == self.target.use_fec;
        Ok(if hit { 4.2 } else { 2.0 })
    }
}

pub fn prefer(target: Configuration) -> QualityPredictor {
    QualityPredictor::new(FeatureSchema::canonical(), Arc::new(PreferModel { target }))
        .expect("arity matches")
}

/// Quality rises with bitrate and FEC, falls with loss and frame size
pub fn linear() -> QualityPredictor {
    let model = LinearModel::new(3.0, vec![0.02, -0.01, 0.15, -0.12]);
    QualityPredictor::new(FeatureSchema::canonical(), Arc::new(model)).expect("arity matches")
}

/// Same score for every candidate
pub fn flat() -> QualityPredictor {
    let model = LinearModel::new(3.3, vec![0.0, 0.0, 0.0, 0.0]);
    QualityPredictor::new(FeatureSchema::canonical(), Arc::new(model)).expect("arity matches")
}
