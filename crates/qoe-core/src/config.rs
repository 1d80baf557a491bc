//! Encoding configuration

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    bitrate_in_domain, complexity_in_domain, frame_size_in_domain, QoeError, QoeResult,
    FRAME_SIZES_MS, MAX_BITRATE_BPS, MAX_COMPLEXITY, MIN_BITRATE_BPS,
};

/// Encoding configuration chosen for a voice stream.
///
/// Plain value: copied freely, never mutated after a controller returns it.
/// Literal tables build it with [`Configuration::new`]; anything read from
/// outside the process goes through [`Configuration::checked`] or
/// [`Configuration::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    /// Target bitrate in bits per second
    pub bitrate: u32,
    /// Frame duration in milliseconds
    pub frame_size_ms: u16,
    /// Encoder complexity (0-10)
    pub complexity: u8,
    /// In-band forward error correction
    pub use_fec: bool,
}

impl Configuration {
    /// Baseline used by the Static controller
    pub const BASELINE: Configuration = Configuration::new(48_000, 20, 5, false);

    /// Build from literal values without checking the domain
    pub const fn new(bitrate: u32, frame_size_ms: u16, complexity: u8, use_fec: bool) -> Self {
        Configuration {
            bitrate,
            frame_size_ms,
            complexity,
            use_fec,
        }
    }

    /// Build and check against the declared domains
    pub fn checked(
        bitrate: u32,
        frame_size_ms: u16,
        complexity: u8,
        use_fec: bool,
    ) -> QoeResult<Self> {
        let config = Self::new(bitrate, frame_size_ms, complexity, use_fec);
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its declared domain
    pub fn validate(&self) -> QoeResult<()> {
        if !bitrate_in_domain(self.bitrate) {
            return Err(QoeError::ConfigurationDomain(format!(
                "bitrate {} outside {}..={} bps",
                self.bitrate, MIN_BITRATE_BPS, MAX_BITRATE_BPS
            )));
        }
        if !frame_size_in_domain(self.frame_size_ms) {
            return Err(QoeError::ConfigurationDomain(format!(
                "frame size {} ms not one of {:?}",
                self.frame_size_ms, FRAME_SIZES_MS
            )));
        }
        if !complexity_in_domain(self.complexity) {
            return Err(QoeError::ConfigurationDomain(format!(
                "complexity {} above {}",
                self.complexity, MAX_COMPLEXITY
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Bitrate in kilobits per second
    pub fn bitrate_kbps(&self) -> f64 {
        self.bitrate as f64 / 1000.0
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}kbps/{}ms/c{}/{}",
            self.bitrate_kbps(),
            self.frame_size_ms,
            self.complexity,
            if self.use_fec { "fec" } else { "nofec" }
        )
    }
}
