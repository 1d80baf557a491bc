//! Controller capability

use std::fmt;
use std::str::FromStr;

use qoe_core::{Configuration, NetworkState, QoeError, QoeResult};
use serde::{Deserialize, Serialize};

/// Controller variant tag, used for reporting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    Static,
    Heuristic,
    MlAdaptive,
    Hybrid,
}

impl ControllerKind {
    pub const ALL: [ControllerKind; 4] = [
        ControllerKind::Static,
        ControllerKind::Heuristic,
        ControllerKind::MlAdaptive,
        ControllerKind::Hybrid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ControllerKind::Static => "static",
            ControllerKind::Heuristic => "heuristic",
            ControllerKind::MlAdaptive => "ml_adaptive",
            ControllerKind::Hybrid => "hybrid",
        }
    }

    /// Whether building this variant needs the quality model
    pub fn needs_model(&self) -> bool {
        matches!(self, ControllerKind::MlAdaptive | ControllerKind::Hybrid)
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControllerKind {
    type Err = QoeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControllerKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| QoeError::InvalidSettings(format!("unknown controller '{s}'")))
    }
}

/// Which side of the Hybrid arbitration produced a decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    /// Loss at or below threshold, model consulted
    Learned,
    /// Loss above threshold, rule table used
    HighLoss,
    /// Model could not be consulted, rule table used
    ModelUnavailable,
}

/// A decision plus how it was reached
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Decision {
    pub configuration: Configuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_score: Option<f64>,
}

impl Decision {
    pub fn plain(configuration: Configuration) -> Self {
        Decision {
            configuration,
            branch: None,
            predicted_score: None,
        }
    }
}

/// Maps a network state to an encoding configuration.
///
/// Implementations must be deterministic and must only return
/// configurations inside the declared domains.
pub trait Controller: Send + Sync + fmt::Debug {
    fn kind(&self) -> ControllerKind;

    /// Variant identifier for reporting
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn decide(&self, state: &NetworkState) -> QoeResult<Configuration>;

    /// Decide and report how; variants with nothing extra to say reuse `decide`
    fn decide_traced(&self, state: &NetworkState) -> QoeResult<Decision> {
        self.decide(state).map(Decision::plain)
    }
}

/// Final domain check on a controller output
pub(crate) fn in_domain(config: Configuration) -> QoeResult<Configuration> {
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ControllerKind::ALL {
            assert_eq!(kind.name().parse::<ControllerKind>().unwrap(), kind);
        }
        assert!("adaptive".parse::<ControllerKind>().is_err());
    }

    #[test]
    fn test_needs_model() {
        assert!(!ControllerKind::Static.needs_model());
        assert!(!ControllerKind::Heuristic.needs_model());
        assert!(ControllerKind::MlAdaptive.needs_model());
        assert!(ControllerKind::Hybrid.needs_model());
    }
}
