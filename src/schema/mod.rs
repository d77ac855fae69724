//! Schema module - Configuration and initial-population types for simulations.

mod config;
mod ecology;
mod seed;

pub use config::*;
pub use ecology::*;
pub use seed::*;
