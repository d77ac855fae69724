//! Trait Branching - Stochastic birth-death-mutation dynamics of a scalar trait.
//!
//! The population is a fixed array of slots. Each occupied slot holds a
//! count of identical individuals sharing one trait value. At every step each
//! slot reproduces according to a density-dependent growth rate, a binomial
//! share of the newborns mutate, and every mutant founds a new lineage in an
//! empty slot with a slightly perturbed trait. Under frequency-dependent
//! competition the trait distribution can split into coexisting clusters
//! (evolutionary branching).
//!
//! # Architecture
//!
//! - `schema`: Configuration types, ecological presets and initial populations
//! - `compute`: Growth models, the birth-death engine, trajectories and ensembles
//! - `export`: CSV and JSON output of sampled trajectories
//!
//! # Example
//!
//! ```rust,no_run
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use trait_branching::{
//!     compute::{BirthDeathEngine, EcologicalModel, PopulationState, count_clusters},
//!     schema::{EcologyPreset, InitialPopulation, SimulationConfig},
//! };
//!
//! let config = SimulationConfig::default();
//! let model = EcologicalModel::new(EcologyPreset::LogisticBranching.with_system_size(1000.0))?;
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let state = PopulationState::from_initial(
//!     &InitialPopulation::default(),
//!     config.bounds(),
//!     &mut rng,
//! )?;
//!
//! let mut engine = BirthDeathEngine::new(config, model)?;
//! let output = engine.run(state, &mut rng)?;
//!
//! println!("Clusters at the end: {}", count_clusters(&output.final_state, 0.1));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod export;
pub mod schema;

// Re-export commonly used types
pub use compute::{
    BirthDeathEngine, EcologicalModel, Ensemble, GrowthModel, PopulationState, PopulationStats,
    SimulationError, SimulationOutput, Trajectory,
};
pub use schema::{
    ConfigError, EcologyConfig, EcologyPreset, InitialPopulation, RunConfig, SimulationConfig,
};
