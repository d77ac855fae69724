//! Configuration types for birth-death-mutation simulation parameters.

use serde::{Deserialize, Serialize};

use super::{EcologyConfig, InitialPopulation};

fn default_replicates() -> usize {
    1
}

/// Top-level run configuration, as loaded from JSON by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Time stepping and mutation parameters.
    pub simulation: SimulationConfig,
    /// Ecological model supplying growth rates.
    pub ecology: EcologyConfig,
    /// Initial slot array.
    pub initial: InitialPopulation,
    /// Number of independent realizations to simulate.
    #[serde(default = "default_replicates")]
    pub replicates: usize,
    /// Base random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            ecology: EcologyConfig::default(),
            initial: InitialPopulation::default(),
            replicates: default_replicates(),
            random_seed: None,
        }
    }
}

impl RunConfig {
    /// Validate every section of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.ecology.validate()?;
        self.initial.validate(self.simulation.bounds())?;
        if self.replicates == 0 {
            return Err(ConfigError::InvalidReplicates);
        }
        Ok(())
    }
}

/// Time discretization and mutation parameters for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Total simulated time; the process is simulated on [0, T].
    pub total_time: f64,
    /// Number of discretization steps over which rates are held constant.
    pub steps: u64,
    /// Save the population once every `skip` steps.
    pub skip: u64,
    /// Probability that a newborn individual is a mutant.
    pub mutation_rate: f64,
    /// Standard deviation of the Gaussian mutation step.
    pub mutation_effect: f64,
    /// Smallest allowed trait value.
    pub trait_min: f64,
    /// Largest allowed trait value.
    pub trait_max: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            total_time: 10.0,
            steps: 1000,
            skip: 10,
            mutation_rate: 0.1,
            mutation_effect: 0.05,
            trait_min: -5.0,
            trait_max: 5.0,
        }
    }
}

impl SimulationConfig {
    /// Length of one discretization step.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.total_time / self.steps as f64
    }

    /// Number of saved samples (columns of the trajectory buffers).
    #[inline]
    pub fn samples(&self) -> usize {
        (self.steps / self.skip) as usize
    }

    /// Allowed trait range.
    #[inline]
    pub fn bounds(&self) -> TraitBounds {
        TraitBounds {
            min: self.trait_min,
            max: self.trait_max,
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.total_time.is_finite() && self.total_time > 0.0) {
            return Err(ConfigError::InvalidTotalTime(self.total_time));
        }
        if self.steps == 0 {
            return Err(ConfigError::InvalidSteps);
        }
        if self.skip == 0 || self.skip > self.steps {
            return Err(ConfigError::InvalidSkip {
                skip: self.skip,
                steps: self.steps,
            });
        }
        if !(0.0..1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::InvalidMutationRate(self.mutation_rate));
        }
        if !(self.mutation_effect.is_finite() && self.mutation_effect >= 0.0) {
            return Err(ConfigError::InvalidMutationEffect(self.mutation_effect));
        }
        self.bounds().validate()
    }
}

/// Closed interval of admissible trait values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitBounds {
    pub min: f64,
    pub max: f64,
}

impl TraitBounds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.max.is_finite() && self.min < self.max) {
            return Err(ConfigError::InvalidTraitBounds {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Total time must be positive and finite, got {0}")]
    InvalidTotalTime(f64),
    #[error("Step count must be non-zero")]
    InvalidSteps,
    #[error("Sampling interval {skip} must be in 1..={steps}")]
    InvalidSkip { skip: u64, steps: u64 },
    #[error("Mutation rate must be in [0, 1), got {0}")]
    InvalidMutationRate(f64),
    #[error("Mutation effect must be non-negative and finite, got {0}")]
    InvalidMutationEffect(f64),
    #[error("Trait bounds must be finite with min < max, got [{min}, {max}]")]
    InvalidTraitBounds { min: f64, max: f64 },
    #[error("Population needs at least one slot")]
    NoSlots,
    #[error("Slot arrays differ in length: {counts} counts, {traits} traits")]
    SlotLengthMismatch { counts: usize, traits: usize },
    #[error("Initial trait {value} in slot {slot} is outside [{min}, {max}]")]
    TraitOutOfBounds {
        slot: usize,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Ecological parameter `{name}` is invalid: {value}")]
    InvalidEcologyParameter { name: &'static str, value: f64 },
    #[error("Initial population parameter `{name}` is invalid: {value}")]
    InvalidInitialPopulation { name: &'static str, value: f64 },
    #[error("Replicate count must be non-zero")]
    InvalidReplicates,
    #[error("Unknown ecology preset `{0}`")]
    UnknownPreset(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.samples(), 100);
        assert!((config.simulation.dt() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_time() {
        let mut config = SimulationConfig::default();
        config.total_time = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTotalTime(0.0)));

        config.total_time = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTotalTime(_))
        ));
    }

    #[test]
    fn test_rejects_bad_step_and_skip() {
        let mut config = SimulationConfig::default();
        config.steps = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidSteps));

        let mut config = SimulationConfig::default();
        config.skip = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSkip { .. })
        ));

        config.skip = config.steps + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSkip { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_mutation_parameters() {
        let mut config = SimulationConfig::default();
        config.mutation_rate = 1.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMutationRate(1.0)));

        config.mutation_rate = -0.1;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.mutation_effect = -0.05;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMutationEffect(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let mut config = SimulationConfig::default();
        config.trait_min = 1.0;
        config.trait_max = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTraitBounds { .. })
        ));
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "simulation": {
                "total_time": 5.0, "steps": 500, "skip": 5,
                "mutation_rate": 0.0, "mutation_effect": 0.0,
                "trait_min": 0.0, "trait_max": 1.0
            },
            "ecology": { "model": "Logistic", "k0": 100.0, "sigma_k": 1.0, "sigma_alpha": 0.5 },
            "initial": { "type": "Monomorphic", "slots": 4, "count": 10, "trait_value": 0.5 }
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.replicates, 1);
        assert_eq!(config.random_seed, None);
        assert!(config.validate().is_ok());
    }
}
