//! QoE Core - Fundamental types for encoding-parameter decisions
//!
//! This crate defines the values every controller works with:
//! - Network condition (NetworkState)
//! - Encoding configuration and its declared parameter domains
//! - Prediction results
//! - The error taxonomy shared by the decision core

pub mod config;
pub mod domain;
pub mod error;
pub mod network;
pub mod prediction;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use network::*;
pub use prediction::*;
