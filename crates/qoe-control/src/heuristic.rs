//! Rule-based controller

use qoe_core::{Configuration, NetworkState, QoeError, QoeResult};
use serde::{Deserialize, Serialize};

use crate::controller::in_domain;
use crate::{Controller, ControllerKind};

/// One row of the loss-threshold table
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeuristicRule {
    /// Inclusive upper bound on packet loss (%)
    pub loss_upper_bound: f64,
    pub configuration: Configuration,
}

impl HeuristicRule {
    pub const fn new(loss_upper_bound: f64, configuration: Configuration) -> Self {
        HeuristicRule {
            loss_upper_bound,
            configuration,
        }
    }
}

/// Default table: lower bitrate, FEC, then longer frames as loss grows
pub const DEFAULT_HEURISTIC_TABLE: [HeuristicRule; 4] = [
    HeuristicRule::new(5.0, Configuration::new(48_000, 20, 5, false)),
    HeuristicRule::new(10.0, Configuration::new(24_000, 20, 5, true)),
    HeuristicRule::new(20.0, Configuration::new(16_000, 40, 5, true)),
    HeuristicRule::new(100.0, Configuration::new(12_000, 60, 5, true)),
];

/// Maps loss through an ordered threshold table.
///
/// Rules are scanned top to bottom and the first whose bound is at or above
/// the observed loss wins. Loss beyond every bound uses the last row.
#[derive(Clone, Debug, PartialEq)]
pub struct HeuristicController {
    rules: Vec<HeuristicRule>,
    most_conservative: Configuration,
}

impl HeuristicController {
    /// Build from a table whose bounds strictly increase
    pub fn new(rules: Vec<HeuristicRule>) -> QoeResult<Self> {
        let Some(last) = rules.last() else {
            return Err(QoeError::InvalidHeuristicTable("table is empty".into()));
        };
        let most_conservative = last.configuration;

        let mut previous: Option<f64> = None;
        for (row, rule) in rules.iter().enumerate() {
            let bound = rule.loss_upper_bound;
            if !bound.is_finite() || bound < 0.0 {
                return Err(QoeError::InvalidHeuristicTable(format!(
                    "row {row}: bound {bound} is not a non-negative number"
                )));
            }
            if previous.is_some_and(|p| bound <= p) {
                return Err(QoeError::InvalidHeuristicTable(format!(
                    "row {row}: bound {bound} does not increase"
                )));
            }
            rule.configuration.validate()?;
            previous = Some(bound);
        }

        Ok(HeuristicController {
            rules,
            most_conservative,
        })
    }

    pub fn rules(&self) -> &[HeuristicRule] {
        &self.rules
    }

    /// Index of the row that governs `loss`
    pub fn bracket(&self, loss: f64) -> usize {
        self.rules
            .iter()
            .position(|rule| loss <= rule.loss_upper_bound)
            .unwrap_or(self.rules.len() - 1)
    }
}

impl Default for HeuristicController {
    fn default() -> Self {
        let rules = DEFAULT_HEURISTIC_TABLE.to_vec();
        HeuristicController {
            most_conservative: DEFAULT_HEURISTIC_TABLE[DEFAULT_HEURISTIC_TABLE.len() - 1]
                .configuration,
            rules,
        }
    }
}

impl Controller for HeuristicController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Heuristic
    }

    fn decide(&self, state: &NetworkState) -> QoeResult<Configuration> {
        let loss = state.packet_loss_percent();
        let config = self
            .rules
            .iter()
            .find(|rule| loss <= rule.loss_upper_bound)
            .map_or(self.most_conservative, |rule| rule.configuration);
        in_domain(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CFG_A: Configuration = Configuration::new(32_000, 20, 5, false);
    const CFG_B: Configuration = Configuration::new(12_000, 60, 5, true);

    fn two_row() -> HeuristicController {
        HeuristicController::new(vec![
            HeuristicRule::new(5.0, CFG_A),
            HeuristicRule::new(100.0, CFG_B),
        ])
        .unwrap()
    }

    fn decide(controller: &HeuristicController, loss: f64) -> Configuration {
        controller.decide(&NetworkState::new(loss).unwrap()).unwrap()
    }

    #[test]
    fn test_default_table_matches_constructor() {
        let built = HeuristicController::new(DEFAULT_HEURISTIC_TABLE.to_vec()).unwrap();
        assert_eq!(built, HeuristicController::default());
    }

    #[test]
    fn test_two_row_table() {
        let controller = two_row();
        assert_eq!(decide(&controller, 0.0), CFG_A);
        assert_eq!(decide(&controller, 5.0), CFG_A);
        assert_eq!(decide(&controller, 5.01), CFG_B);
        assert_eq!(decide(&controller, 20.0), CFG_B);
    }

    #[test]
    fn test_loss_beyond_every_bound_uses_last_row() {
        let controller = HeuristicController::new(vec![
            HeuristicRule::new(2.0, CFG_A),
            HeuristicRule::new(8.0, CFG_B),
        ])
        .unwrap();
        assert_eq!(decide(&controller, 50.0), CFG_B);
        assert_eq!(controller.bracket(50.0), 1);
    }

    #[test]
    fn test_same_bracket_same_output() {
        let controller = HeuristicController::default();
        assert_eq!(decide(&controller, 0.0), decide(&controller, 4.0));
        assert_ne!(decide(&controller, 4.0), decide(&controller, 6.0));
    }

    #[test]
    fn test_invalid_tables() {
        assert!(matches!(
            HeuristicController::new(vec![]),
            Err(QoeError::InvalidHeuristicTable(_))
        ));
        assert!(matches!(
            HeuristicController::new(vec![
                HeuristicRule::new(10.0, CFG_A),
                HeuristicRule::new(10.0, CFG_B),
            ]),
            Err(QoeError::InvalidHeuristicTable(_))
        ));
        assert!(matches!(
            HeuristicController::new(vec![HeuristicRule::new(f64::NAN, CFG_A)]),
            Err(QoeError::InvalidHeuristicTable(_))
        ));
        assert!(matches!(
            HeuristicController::new(vec![HeuristicRule::new(
                5.0,
                Configuration::new(1_000, 20, 5, false)
            )]),
            Err(QoeError::ConfigurationDomain(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_piecewise_constant(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
            let controller = HeuristicController::default();
            if controller.bracket(a) == controller.bracket(b) {
                prop_assert_eq!(decide(&controller, a), decide(&controller, b));
            }
        }

        #[test]
        fn prop_bitrate_never_increases_with_loss(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
            let controller = HeuristicController::default();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(decide(&controller, low).bitrate >= decide(&controller, high).bitrate);
        }

        #[test]
        fn prop_output_in_domain(loss in 0.0f64..=100.0) {
            prop_assert!(decide(&HeuristicController::default(), loss).is_valid());
        }
    }
}
