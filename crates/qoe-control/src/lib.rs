//! QoE Control - Encoding-parameter controllers
//!
//! Every controller maps an observed NetworkState to a Configuration:
//! - Static: one fixed configuration (baseline arm)
//! - Heuristic: ordered loss-threshold table
//! - ML-Adaptive: exhaustive candidate search scored by the quality model
//! - Hybrid: ML-Adaptive at low loss, Heuristic at high loss or when the
//!   model is unavailable
//!
//! Controllers hold no mutable state, so one instance can serve concurrent
//! decisions for independent network states.

pub mod adaptive;
pub mod controller;
pub mod fixed;
pub mod heuristic;
pub mod hybrid;
pub mod search;
pub mod set;
pub mod settings;

#[cfg(test)]
mod testing;

pub use adaptive::*;
pub use controller::*;
pub use fixed::*;
pub use heuristic::*;
pub use hybrid::*;
pub use search::*;
pub use set::*;
pub use settings::*;
