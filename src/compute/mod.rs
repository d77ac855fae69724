//! Compute module - Stochastic simulation of the birth-death-mutation process.

mod ecology;
mod engine;
mod ensemble;
mod mutation;
mod sampling;
mod trajectory;

pub use ecology::*;
pub use engine::*;
pub use ensemble::*;
pub use mutation::*;
pub use sampling::*;
pub use trajectory::*;
