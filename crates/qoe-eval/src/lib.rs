//! QoE Eval - Offline evaluation of encoding controllers
//!
//! Drives the controllers against a codec and a quality scorer:
//! - Collaborators: opus-tools (on-disk) or a simulated in-memory codec,
//!   an external scoring program or a segmental-SNR scorer
//! - Sweep: controllers x loss grid x inputs, scored per decision
//! - Dataset: every search-space candidate x loss grid x inputs, the rows
//!   the offline trainer consumes
//! - Results as JSON lines with a mean-MOS summary

pub mod collaborator;
pub mod command_scorer;
pub mod config;
pub mod dataset;
pub mod error;
pub mod input;
pub mod logging;
pub mod opus_tools;
pub mod pool;
pub mod results;
pub mod simulated;
pub mod sweep;

pub use collaborator::*;
pub use command_scorer::*;
pub use config::*;
pub use dataset::*;
pub use error::*;
pub use input::*;
pub use opus_tools::*;
pub use results::*;
pub use simulated::*;
pub use sweep::*;
