//! QoE Model - Quality prediction for candidate configurations
//!
//! This crate owns the boundary with the offline training job:
//! - The ordered feature contract (bitrate, frame_size_ms, use_fec, packet_loss_percent)
//! - The persisted model artifact (linear or tree-ensemble regression)
//! - The QualityPredictor, loaded once and shared read-only across decisions

pub mod artifact;
pub mod error;
pub mod features;
pub mod model;
pub mod predictor;

pub use artifact::*;
pub use error::*;
pub use features::*;
pub use model::*;
pub use predictor::*;
