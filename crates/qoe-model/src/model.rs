//! Regression models behind the quality predictor

use std::fmt;

use qoe_core::{QoeError, QoeResult};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Opaque regression capability: feature vector in, MOS-scale score out.
///
/// Implementations are immutable after construction so one instance can be
/// shared across threads without locking.
pub trait QualityModel: Send + Sync + fmt::Debug {
    /// Number of features the model was fitted on
    fn arity(&self) -> usize;

    /// Evaluate one feature vector
    fn predict(&self, features: &[f64]) -> QoeResult<f64>;
}

fn check_arity(expected: usize, features: &[f64]) -> QoeResult<()> {
    if features.len() != expected {
        return Err(QoeError::Prediction(format!(
            "expected {expected} features, got {}",
            features.len()
        )));
    }
    Ok(())
}

pub(crate) fn finite(score: f64) -> QoeResult<f64> {
    if score.is_finite() {
        Ok(score)
    } else {
        Err(QoeError::Prediction(format!("non-finite score {score}")))
    }
}

// ============================================================================
// LINEAR
// ============================================================================

/// Linear regression: `intercept + Σ coefficient_i * x_i`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        LinearModel {
            intercept,
            coefficients,
        }
    }
}

impl QualityModel for LinearModel {
    fn arity(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> QoeResult<f64> {
        check_arity(self.arity(), features)?;
        let score = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (c, x)| acc + c * x);
        finite(score)
    }
}

// ============================================================================
// TREE ENSEMBLE
// ============================================================================

/// Node of a flattened regression tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, otherwise `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a node array; node 0 is the root
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Check node references.
    ///
    /// Children must point forward in the array, which rules out cycles
    /// and bounds every walk by the node count.
    pub fn validate(&self, arity: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Malformed("tree has no nodes".into()));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= arity {
                        return Err(ModelError::Malformed(format!(
                            "node {index} splits on feature {feature}, model has {arity}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelError::Malformed(format!(
                            "node {index} has non-finite threshold"
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(ModelError::Malformed(format!(
                                "node {index} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelError::Malformed(format!(
                            "leaf {index} has non-finite value"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. Assumes `validate` passed.
    fn evaluate(&self, features: &[f64]) -> QoeResult<f64> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => {
                    return Err(QoeError::Prediction(format!(
                        "tree walk reached missing node {index}"
                    )))
                }
            }
        }
    }
}

/// Averaging tree ensemble (random-forest regressor)
#[derive(Clone, Debug, PartialEq)]
pub struct ForestModel {
    arity: usize,
    trees: Vec<RegressionTree>,
}

impl ForestModel {
    pub fn new(arity: usize, trees: Vec<RegressionTree>) -> Result<Self, ModelError> {
        if trees.is_empty() {
            return Err(ModelError::Malformed("forest has no trees".into()));
        }
        for tree in &trees {
            tree.validate(arity)?;
        }
        Ok(ForestModel { arity, trees })
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl QualityModel for ForestModel {
    fn arity(&self) -> usize {
        self.arity
    }

    fn predict(&self, features: &[f64]) -> QoeResult<f64> {
        check_arity(self.arity, features)?;
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(features)?;
        }
        finite(total / self.trees.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> RegressionTree {
        RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: low },
                TreeNode::Leaf { value: high },
            ],
        }
    }

    #[test]
    fn test_linear_predict() {
        let model = LinearModel::new(1.0, vec![0.05, 0.0, 0.2, -0.1]);
        let score = model.predict(&[32.0, 20.0, 1.0, 5.0]).unwrap();
        assert!((score - (1.0 + 1.6 + 0.2 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_linear_arity_mismatch() {
        let model = LinearModel::new(1.0, vec![0.1, 0.1]);
        assert!(matches!(
            model.predict(&[1.0]),
            Err(QoeError::Prediction(_))
        ));
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = ForestModel::new(
            4,
            vec![stump(3, 5.0, 4.0, 2.0), stump(0, 16.0, 3.0, 4.0)],
        )
        .unwrap();

        // loss 2 -> 4.0; bitrate 32 -> 4.0
        assert_eq!(forest.predict(&[32.0, 20.0, 0.0, 2.0]).unwrap(), 4.0);
        // loss 10 -> 2.0; bitrate 8 -> 3.0
        assert_eq!(forest.predict(&[8.0, 20.0, 0.0, 10.0]).unwrap(), 2.5);
        // threshold is inclusive on the left branch
        assert_eq!(forest.predict(&[16.0, 20.0, 0.0, 5.0]).unwrap(), 3.5);
    }

    #[test]
    fn test_tree_validation() {
        let backward = RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf { value: 1.0 },
            ],
        };
        assert!(backward.validate(4).is_err());

        let out_of_range = stump(4, 1.0, 1.0, 2.0);
        assert!(out_of_range.validate(4).is_err());

        let empty = RegressionTree { nodes: vec![] };
        assert!(empty.validate(4).is_err());

        assert!(ForestModel::new(4, vec![]).is_err());
    }

    #[test]
    fn test_node_serde_shapes() {
        let split: TreeNode = serde_json::from_str(
            r#"{"feature": 3, "threshold": 4.5, "left": 1, "right": 2}"#,
        )
        .unwrap();
        assert!(matches!(split, TreeNode::Split { feature: 3, .. }));

        let leaf: TreeNode = serde_json::from_str(r#"{"value": 3.9}"#).unwrap();
        assert_eq!(leaf, TreeNode::Leaf { value: 3.9 });
    }
}
