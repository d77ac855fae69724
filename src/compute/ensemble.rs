//! Independent replicate runs executed in parallel.
//!
//! Each replicate owns its engine, buffers and random number generator. The
//! generator is seeded from a base seed mixed with the replicate index, so
//! replicates never share a stream and a fixed base seed reproduces the
//! whole ensemble.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::schema::{ConfigError, RunConfig};

use super::{
    BirthDeathEngine, EcologicalModel, PopulationState, SimulationError, SimulationOutput,
};

/// SplitMix64 finalizer.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for replicate `index` of an ensemble with base seed `base`.
pub fn replicate_seed(base: u64, index: u64) -> u64 {
    mix(base ^ mix(index))
}

/// Base seed when none is configured: OS entropy combined with the process id.
fn entropy_seed() -> u64 {
    rand::random::<u64>() ^ mix(u64::from(std::process::id()))
}

/// Outcome of one replicate.
#[derive(Debug)]
pub struct ReplicateResult {
    /// Replicate index, starting at 0.
    pub index: usize,
    /// Seed the replicate's generator was built from.
    pub seed: u64,
    pub output: Result<SimulationOutput, SimulationError>,
}

/// Runs every replicate described by a [`RunConfig`].
pub struct Ensemble {
    config: RunConfig,
    base_seed: u64,
}

impl Ensemble {
    /// Validate the configuration and fix the base seed.
    pub fn new(config: RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_seed = config.random_seed.unwrap_or_else(entropy_seed);
        Ok(Self { config, base_seed })
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run a single replicate.
    pub fn run_replicate(&self, index: usize) -> ReplicateResult {
        let seed = replicate_seed(self.base_seed, index as u64);
        let mut rng = StdRng::seed_from_u64(seed);
        let output = simulate(&self.config, &mut rng);
        ReplicateResult {
            index,
            seed,
            output,
        }
    }

    /// Run all replicates in parallel, returned in index order.
    pub fn run(&self) -> Vec<ReplicateResult> {
        info!(
            "running {} replicates of the {} model (base seed {})",
            self.config.replicates,
            self.config.ecology.name(),
            self.base_seed
        );

        (0..self.config.replicates)
            .into_par_iter()
            .map(|index| self.run_replicate(index))
            .collect()
    }
}

/// Build the initial state, model and engine from `config` and run once.
pub fn simulate<R: Rng + ?Sized>(
    config: &RunConfig,
    rng: &mut R,
) -> Result<SimulationOutput, SimulationError> {
    let model = EcologicalModel::new(config.ecology.clone())?;
    let state = PopulationState::from_initial(&config.initial, config.simulation.bounds(), rng)?;
    let mut engine = BirthDeathEngine::new(config.simulation.clone(), model)?;
    engine.run(state, rng)
}
