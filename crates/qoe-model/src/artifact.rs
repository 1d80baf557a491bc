//! Persisted model artifact
//!
//! JSON document written by the offline training job:
//!
//! ```json
//! {
//!   "format": "qoe-model/1",
//!   "features": ["bitrate", "frame_size_ms", "use_fec", "packet_loss_percent"],
//!   "bitrate_unit": "kbps",
//!   "model": { "kind": "forest", "trees": [ { "nodes": [ ... ] } ] }
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    BitrateUnit, Feature, FeatureSchema, ForestModel, LinearModel, ModelError, QualityModel,
    RegressionTree,
};

/// Format tag this crate understands
pub const MODEL_FORMAT: &str = "qoe-model/1";

/// Model body
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelBody {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Forest {
        trees: Vec<RegressionTree>,
    },
}

/// On-disk model artifact
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format: String,
    pub features: Vec<Feature>,
    #[serde(default)]
    pub bitrate_unit: BitrateUnit,
    pub model: ModelBody,
}

impl ModelArtifact {
    /// Read an artifact from disk.
    ///
    /// The file handle lives only for the duration of this call and is
    /// released on every exit path, including parse failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ModelError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and build the in-memory model
    pub fn build(self) -> Result<(FeatureSchema, Arc<dyn QualityModel>), ModelError> {
        if self.format != MODEL_FORMAT {
            return Err(ModelError::UnsupportedFormat(self.format));
        }

        let schema = FeatureSchema::new(self.features, self.bitrate_unit)?;
        let arity = schema.len();

        let model: Arc<dyn QualityModel> = match self.model {
            ModelBody::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != arity {
                    return Err(ModelError::Malformed(format!(
                        "{} coefficients for {arity} features",
                        coefficients.len()
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ModelError::Malformed("non-finite coefficient".into()));
                }
                Arc::new(LinearModel::new(intercept, coefficients))
            }
            ModelBody::Forest { trees } => Arc::new(ForestModel::new(arity, trees)?),
        };

        Ok((schema, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINEAR: &str = r#"{
        "format": "qoe-model/1",
        "features": ["bitrate", "frame_size_ms", "use_fec", "packet_loss_percent"],
        "model": { "kind": "linear", "intercept": 2.0, "coefficients": [0.05, -0.01, 0.1, -0.2] }
    }"#;

    const FOREST: &str = r#"{
        "format": "qoe-model/1",
        "features": ["bitrate", "frame_size_ms", "use_fec", "packet_loss_percent"],
        "bitrate_unit": "kbps",
        "model": {
            "kind": "forest",
            "trees": [
                { "nodes": [
                    { "feature": 3, "threshold": 5.0, "left": 1, "right": 2 },
                    { "value": 4.1 },
                    { "value": 2.2 }
                ] }
            ]
        }
    }"#;

    #[test]
    fn test_linear_artifact() {
        let artifact = ModelArtifact::from_json(LINEAR).unwrap();
        assert_eq!(artifact.bitrate_unit, BitrateUnit::Kbps);

        let (schema, model) = artifact.build().unwrap();
        assert_eq!(schema, FeatureSchema::canonical());
        let score = model.predict(&[32.0, 20.0, 0.0, 0.0]).unwrap();
        assert!((score - 3.4).abs() < 1e-9);
    }

    #[test]
    fn test_forest_artifact() {
        let (_, model) = ModelArtifact::from_json(FOREST).unwrap().build().unwrap();
        assert_eq!(model.arity(), 4);
        assert_eq!(model.predict(&[32.0, 20.0, 0.0, 3.0]).unwrap(), 4.1);
        assert_eq!(model.predict(&[32.0, 20.0, 0.0, 8.0]).unwrap(), 2.2);
    }

    #[test]
    fn test_wrong_format_tag() {
        let json = LINEAR.replace("qoe-model/1", "joblib");
        let err = ModelArtifact::from_json(&json).unwrap().build().unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat(tag) if tag == "joblib"));
    }

    #[test]
    fn test_coefficient_count_mismatch() {
        let json = LINEAR.replace("[0.05, -0.01, 0.1, -0.2]", "[0.05, -0.01]");
        let err = ModelArtifact::from_json(&json).unwrap().build().unwrap_err();
        assert!(matches!(err, ModelError::Malformed(_)));
    }

    #[test]
    fn test_unknown_feature_name_is_parse_error() {
        let json = LINEAR.replace("\"use_fec\"", "\"fec\"");
        assert!(matches!(
            ModelArtifact::from_json(&json),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ModelArtifact::load("/nonexistent/qoe_model.json").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
