//! Initial slot arrays for starting a simulation.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::{ConfigError, TraitBounds};

/// How the fixed-size slot array is populated at time 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InitialPopulation {
    /// Counts and traits given slot by slot.
    Explicit { counts: Vec<u64>, traits: Vec<f64> },
    /// Every slot occupied by `count` individuals, traits drawn from N(mean, std_dev).
    GaussianCloud {
        slots: usize,
        count: u64,
        mean: f64,
        std_dev: f64,
    },
    /// Only slot 0 occupied; the remaining slots start empty.
    Monomorphic {
        slots: usize,
        count: u64,
        trait_value: f64,
    },
}

impl Default for InitialPopulation {
    fn default() -> Self {
        Self::GaussianCloud {
            slots: 100,
            count: 1000,
            mean: 0.0,
            std_dev: 0.015,
        }
    }
}

impl InitialPopulation {
    /// Number of slots (M) this population occupies.
    pub fn slots(&self) -> usize {
        match self {
            Self::Explicit { counts, .. } => counts.len(),
            Self::GaussianCloud { slots, .. } | Self::Monomorphic { slots, .. } => *slots,
        }
    }

    pub fn validate(&self, bounds: TraitBounds) -> Result<(), ConfigError> {
        if self.slots() == 0 {
            return Err(ConfigError::NoSlots);
        }
        match self {
            Self::Explicit { counts, traits } => validate_slots(counts, traits, bounds),
            Self::GaussianCloud { mean, std_dev, .. } => {
                if !mean.is_finite() {
                    return Err(ConfigError::InvalidInitialPopulation {
                        name: "mean",
                        value: *mean,
                    });
                }
                if !(std_dev.is_finite() && *std_dev >= 0.0) {
                    return Err(ConfigError::InvalidInitialPopulation {
                        name: "std_dev",
                        value: *std_dev,
                    });
                }
                Ok(())
            }
            Self::Monomorphic { trait_value, .. } => {
                if bounds.contains(*trait_value) {
                    Ok(())
                } else {
                    Err(ConfigError::TraitOutOfBounds {
                        slot: 0,
                        value: *trait_value,
                        min: bounds.min,
                        max: bounds.max,
                    })
                }
            }
        }
    }

    /// Generate `(counts, traits)` for the slot array.
    ///
    /// Sampled traits are clamped into `bounds`; explicit traits are returned as given.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        bounds: TraitBounds,
        rng: &mut R,
    ) -> (Vec<u64>, Vec<f64>) {
        match self {
            Self::Explicit { counts, traits } => (counts.clone(), traits.clone()),
            Self::GaussianCloud {
                slots,
                count,
                mean,
                std_dev,
            } => {
                let traits = (0..*slots)
                    .map(|_| {
                        let z: f64 = rng.sample(StandardNormal);
                        bounds.clamp(mean + z * std_dev)
                    })
                    .collect();
                (vec![*count; *slots], traits)
            }
            Self::Monomorphic {
                slots,
                count,
                trait_value,
            } => {
                let mut counts = vec![0; *slots];
                counts[0] = *count;
                (counts, vec![*trait_value; *slots])
            }
        }
    }
}

/// Check that a slot array is well formed and inside the trait bounds.
pub fn validate_slots(
    counts: &[u64],
    traits: &[f64],
    bounds: TraitBounds,
) -> Result<(), ConfigError> {
    if counts.len() != traits.len() {
        return Err(ConfigError::SlotLengthMismatch {
            counts: counts.len(),
            traits: traits.len(),
        });
    }
    if counts.is_empty() {
        return Err(ConfigError::NoSlots);
    }
    for (slot, &value) in traits.iter().enumerate() {
        if !bounds.contains(value) {
            return Err(ConfigError::TraitOutOfBounds {
                slot,
                value,
                min: bounds.min,
                max: bounds.max,
            });
        }
    }
    Ok(())
}
