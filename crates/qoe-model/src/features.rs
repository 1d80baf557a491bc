//! Feature contract with the training job
//!
//! The order of the first four features is fixed: the model was fitted on
//! exactly `[bitrate, frame_size_ms, use_fec, packet_loss_percent]`.

use std::fmt;

use qoe_core::{Configuration, NetworkState, QoeError, QoeResult};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// A single model input
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Bitrate,
    FrameSizeMs,
    UseFec,
    PacketLossPercent,
    JitterMs,
    RttMs,
}

/// Features every model must start with, in this order
pub const CANONICAL_FEATURES: [Feature; 4] = [
    Feature::Bitrate,
    Feature::FrameSizeMs,
    Feature::UseFec,
    Feature::PacketLossPercent,
];

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Bitrate => "bitrate",
            Feature::FrameSizeMs => "frame_size_ms",
            Feature::UseFec => "use_fec",
            Feature::PacketLossPercent => "packet_loss_percent",
            Feature::JitterMs => "jitter_ms",
            Feature::RttMs => "rtt_ms",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unit the bitrate feature was recorded in during training
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitrateUnit {
    #[default]
    Kbps,
    Bps,
}

impl BitrateUnit {
    fn scale(&self, bitrate_bps: u32) -> f64 {
        match self {
            BitrateUnit::Kbps => bitrate_bps as f64 / 1000.0,
            BitrateUnit::Bps => bitrate_bps as f64,
        }
    }
}

/// Ordered feature list a model expects
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSchema {
    features: Vec<Feature>,
    bitrate_unit: BitrateUnit,
}

impl FeatureSchema {
    /// Validate a declared feature list.
    ///
    /// The canonical four must come first and in order; only jitter and
    /// rtt may follow, each at most once.
    pub fn new(features: Vec<Feature>, bitrate_unit: BitrateUnit) -> Result<Self, ModelError> {
        if features.len() < CANONICAL_FEATURES.len()
            || features[..CANONICAL_FEATURES.len()] != CANONICAL_FEATURES
        {
            return Err(ModelError::Schema(format!(
                "features must begin with {:?}, got {:?}",
                CANONICAL_FEATURES.map(|f| f.name()),
                features.iter().map(Feature::name).collect::<Vec<_>>()
            )));
        }

        let extra = &features[CANONICAL_FEATURES.len()..];
        for (i, feature) in extra.iter().enumerate() {
            if !matches!(feature, Feature::JitterMs | Feature::RttMs) {
                return Err(ModelError::Schema(format!(
                    "'{feature}' may only appear in the canonical prefix"
                )));
            }
            if extra[..i].contains(feature) {
                return Err(ModelError::Schema(format!("'{feature}' declared twice")));
            }
        }

        Ok(FeatureSchema {
            features,
            bitrate_unit,
        })
    }

    /// The four-feature schema the reference training job produces
    pub fn canonical() -> Self {
        FeatureSchema {
            features: CANONICAL_FEATURES.to_vec(),
            bitrate_unit: BitrateUnit::Kbps,
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn bitrate_unit(&self) -> BitrateUnit {
        self.bitrate_unit
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Assemble the feature vector for one candidate, in schema order
    pub fn assemble(&self, config: &Configuration, state: &NetworkState) -> QoeResult<Vec<f64>> {
        self.features
            .iter()
            .map(|feature| match feature {
                Feature::Bitrate => Ok(self.bitrate_unit.scale(config.bitrate)),
                Feature::FrameSizeMs => Ok(config.frame_size_ms as f64),
                Feature::UseFec => Ok(if config.use_fec { 1.0 } else { 0.0 }),
                Feature::PacketLossPercent => Ok(state.packet_loss_percent()),
                Feature::JitterMs => state.jitter_ms().ok_or(QoeError::FeatureMismatch {
                    feature: Feature::JitterMs.name(),
                }),
                Feature::RttMs => state.rtt_ms().ok_or(QoeError::FeatureMismatch {
                    feature: Feature::RttMs.name(),
                }),
            })
            .collect()
    }
}
