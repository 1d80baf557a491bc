//! Quality predictor

use std::path::Path;
use std::sync::Arc;

use qoe_core::{Configuration, NetworkState, PredictionResult, QoeError, QoeResult};
use tracing::{info, warn};

use crate::model::finite;
use crate::{FeatureSchema, ModelArtifact, ModelError, QualityModel};

#[derive(Clone, Debug)]
enum Backing {
    Loaded {
        schema: FeatureSchema,
        model: Arc<dyn QualityModel>,
    },
    Unavailable {
        reason: String,
    },
}

/// Predicts quality for a (configuration, network state) pair.
///
/// Cloning shares the underlying model. A predictor whose model failed to
/// load still exists so that callers able to recover (the Hybrid
/// controller) can be built; every prediction on it fails with
/// `ModelUnavailable`.
#[derive(Clone, Debug)]
pub struct QualityPredictor {
    backing: Backing,
}

impl QualityPredictor {
    /// Wrap an already loaded model
    pub fn new(schema: FeatureSchema, model: Arc<dyn QualityModel>) -> Result<Self, ModelError> {
        if model.arity() != schema.len() {
            return Err(ModelError::Schema(format!(
                "model takes {} features, schema declares {}",
                model.arity(),
                schema.len()
            )));
        }
        Ok(QualityPredictor {
            backing: Backing::Loaded { schema, model },
        })
    }

    /// Load a persisted model
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let (schema, model) = ModelArtifact::load(path)?.build()?;
        info!(
            path = %path.display(),
            features = schema.len(),
            "Loaded quality model"
        );
        Self::new(schema, model)
    }

    /// Load a persisted model, keeping the failure instead of returning it
    pub fn load_or_unavailable(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(predictor) => predictor,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Quality model unavailable");
                Self::unavailable(err.to_string())
            }
        }
    }

    /// A predictor with no model behind it
    pub fn unavailable(reason: impl Into<String>) -> Self {
        QualityPredictor {
            backing: Backing::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.backing, Backing::Loaded { .. })
    }

    pub fn schema(&self) -> Option<&FeatureSchema> {
        match &self.backing {
            Backing::Loaded { schema, .. } => Some(schema),
            Backing::Unavailable { .. } => None,
        }
    }

    /// Predicted score for one candidate; a non-finite score is an error
    pub fn predict(&self, config: &Configuration, state: &NetworkState) -> QoeResult<f64> {
        match &self.backing {
            Backing::Loaded { schema, model } => {
                let features = schema.assemble(config, state)?;
                finite(model.predict(&features)?)
            }
            Backing::Unavailable { reason } => Err(QoeError::ModelUnavailable(reason.clone())),
        }
    }

    /// Predicted score packaged with its inputs
    pub fn evaluate(
        &self,
        config: &Configuration,
        state: &NetworkState,
    ) -> QoeResult<PredictionResult> {
        let score = self.predict(config, state)?;
        Ok(PredictionResult::new(*config, score, *state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BitrateUnit, Feature, LinearModel, CANONICAL_FEATURES};

    fn linear_predictor() -> QualityPredictor {
        let model = LinearModel::new(1.0, vec![0.05, 0.0, 0.5, -0.1]);
        QualityPredictor::new(FeatureSchema::canonical(), Arc::new(model)).unwrap()
    }

    #[test]
    fn test_predict_uses_contract_order() {
        let predictor = linear_predictor();
        let state = NetworkState::new(10.0).unwrap();
        let config = Configuration::new(32_000, 20, 5, true);

        // 1.0 + 0.05*32 + 0.5*1 - 0.1*10
        let score = predictor.predict(&config, &state).unwrap();
        assert!((score - 2.1).abs() < 1e-9);

        let result = predictor.evaluate(&config, &state).unwrap();
        assert_eq!(result.configuration, config);
        assert_eq!(result.state, state);
        assert_eq!(result.score, score);
    }

    #[test]
    fn test_unavailable() {
        let predictor = QualityPredictor::unavailable("no model");
        assert!(!predictor.is_available());
        assert!(predictor.schema().is_none());

        let state = NetworkState::new(1.0).unwrap();
        let err = predictor
            .predict(&Configuration::BASELINE, &state)
            .unwrap_err();
        assert!(err.is_model_unavailable());
    }

    #[test]
    fn test_load_or_unavailable_on_missing_file() {
        let predictor = QualityPredictor::load_or_unavailable("/nonexistent/model.json");
        assert!(!predictor.is_available());
    }

    #[test]
    fn test_arity_must_match_schema() {
        let model = LinearModel::new(1.0, vec![0.1, 0.1, 0.1]);
        assert!(matches!(
            QualityPredictor::new(FeatureSchema::canonical(), Arc::new(model)),
            Err(ModelError::Schema(_))
        ));
    }

    #[test]
    fn test_feature_mismatch_propagates() {
        let mut declared = CANONICAL_FEATURES.to_vec();
        declared.push(Feature::RttMs);
        let schema = FeatureSchema::new(declared, BitrateUnit::Kbps).unwrap();
        let model = LinearModel::new(0.0, vec![0.0; 5]);
        let predictor = QualityPredictor::new(schema, Arc::new(model)).unwrap();

        let state = NetworkState::new(2.0).unwrap();
        assert_eq!(
            predictor.predict(&Configuration::BASELINE, &state),
            Err(QoeError::FeatureMismatch { feature: "rtt_ms" })
        );
    }

    /// Returns NaN unless bitrate is 48 kbps
    #[derive(Debug)]
    struct NanModel;

    impl QualityModel for NanModel {
        fn arity(&self) -> usize {
            4
        }

        fn predict(&self, features: &[f64]) -> QoeResult<f64> {
            Ok(if features[0] == 48.0 { 1.0 } else { f64::NAN })
        }
    }

    #[test]
    fn test_non_finite_score_is_error() {
        let predictor =
            QualityPredictor::new(FeatureSchema::canonical(), Arc::new(NanModel)).unwrap();
        let state = NetworkState::new(1.0).unwrap();

        let err = predictor
            .predict(&Configuration::new(16_000, 20, 5, false), &state)
            .unwrap_err();
        assert!(matches!(err, QoeError::Prediction(_)));
        assert!(predictor
            .evaluate(&Configuration::new(16_000, 20, 5, false), &state)
            .is_err());
        assert_eq!(
            predictor.predict(&Configuration::BASELINE, &state).unwrap(),
            1.0
        );
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("qoe_model_{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{
                "format": "qoe-model/1",
                "features": ["bitrate", "frame_size_ms", "use_fec", "packet_loss_percent"],
                "model": { "kind": "linear", "intercept": 3.0, "coefficients": [0.0, 0.0, 0.0, 0.0] }
            }"#,
        )
        .unwrap();

        let predictor = QualityPredictor::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let state = NetworkState::new(0.0).unwrap();
        assert_eq!(predictor.predict(&Configuration::BASELINE, &state).unwrap(), 3.0);
    }
}
