//! Observed network condition

use serde::Serialize;

use crate::{QoeError, QoeResult};

/// Network condition a decision is made against.
///
/// Loss is always present; jitter and round-trip time are optional since the
/// minimal model only observes loss. Fields are private so a constructed
/// value is always in range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NetworkState {
    packet_loss_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    jitter_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rtt_ms: Option<f64>,
}

impl NetworkState {
    /// Create from a packet-loss percentage in 0..=100
    pub fn new(packet_loss_percent: f64) -> QoeResult<Self> {
        if !packet_loss_percent.is_finite() || !(0.0..=100.0).contains(&packet_loss_percent) {
            return Err(QoeError::InvalidNetworkState(format!(
                "packet loss {packet_loss_percent} outside 0..=100"
            )));
        }
        Ok(NetworkState {
            packet_loss_percent,
            jitter_ms: None,
            rtt_ms: None,
        })
    }

    /// Attach a jitter observation (ms)
    pub fn with_jitter(mut self, jitter_ms: f64) -> QoeResult<Self> {
        self.jitter_ms = Some(non_negative("jitter_ms", jitter_ms)?);
        Ok(self)
    }

    /// Attach a round-trip time observation (ms)
    pub fn with_rtt(mut self, rtt_ms: f64) -> QoeResult<Self> {
        self.rtt_ms = Some(non_negative("rtt_ms", rtt_ms)?);
        Ok(self)
    }

    pub fn packet_loss_percent(&self) -> f64 {
        self.packet_loss_percent
    }

    pub fn jitter_ms(&self) -> Option<f64> {
        self.jitter_ms
    }

    pub fn rtt_ms(&self) -> Option<f64> {
        self.rtt_ms
    }
}

fn non_negative(field: &str, value: f64) -> QoeResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(QoeError::InvalidNetworkState(format!(
            "{field} must be a non-negative number, got {value}"
        )))
    }
}
