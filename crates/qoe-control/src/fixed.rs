//! Static controller

use qoe_core::{Configuration, NetworkState, QoeResult};

use crate::{Controller, ControllerKind};

/// Always returns the same configuration, whatever the network does
#[derive(Clone, Debug, PartialEq)]
pub struct StaticController {
    configuration: Configuration,
}

impl StaticController {
    pub fn new(configuration: Configuration) -> QoeResult<Self> {
        configuration.validate()?;
        Ok(StaticController { configuration })
    }

    pub fn configuration(&self) -> Configuration {
        self.configuration
    }
}

impl Default for StaticController {
    fn default() -> Self {
        StaticController {
            configuration: Configuration::BASELINE,
        }
    }
}

impl Controller for StaticController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Static
    }

    fn decide(&self, _state: &NetworkState) -> QoeResult<Configuration> {
        Ok(self.configuration)
    }
}
