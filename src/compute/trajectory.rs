//! Sampled trajectory buffers and population statistics.

use serde::{Deserialize, Serialize};

use super::PopulationState;

/// Counts and traits sampled every `skip` steps.
///
/// Both tables have shape `(slots, samples)` and are stored row-major by slot:
/// entry `[slot * samples + sample]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    slots: usize,
    samples: usize,
    counts: Vec<u64>,
    traits: Vec<f64>,
    times: Vec<f64>,
}

impl Trajectory {
    /// Zero-filled buffers for `slots` slots and `samples` samples.
    pub fn new(slots: usize, samples: usize) -> Self {
        Self {
            slots,
            samples,
            counts: vec![0; slots * samples],
            traits: vec![0.0; slots * samples],
            times: vec![0.0; samples],
        }
    }

    /// Store `state` as sample `sample`.
    pub fn record(&mut self, sample: usize, state: &PopulationState) {
        debug_assert_eq!(state.slots(), self.slots);
        for slot in 0..self.slots {
            let idx = self.idx(slot, sample);
            self.counts[idx] = state.counts[slot];
            self.traits[idx] = state.traits[slot];
        }
        self.times[sample] = state.time;
    }

    #[inline]
    fn idx(&self, slot: usize, sample: usize) -> usize {
        slot * self.samples + sample
    }

    /// `(slots, samples)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.slots, self.samples)
    }

    #[inline]
    pub fn slots(&self) -> usize {
        self.slots
    }

    #[inline]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Sample times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[inline]
    pub fn count(&self, slot: usize, sample: usize) -> u64 {
        self.counts[self.idx(slot, sample)]
    }

    #[inline]
    pub fn trait_value(&self, slot: usize, sample: usize) -> f64 {
        self.traits[self.idx(slot, sample)]
    }

    /// Count history of one slot.
    pub fn slot_counts(&self, slot: usize) -> &[u64] {
        &self.counts[slot * self.samples..(slot + 1) * self.samples]
    }

    /// Trait history of one slot.
    pub fn slot_traits(&self, slot: usize) -> &[f64] {
        &self.traits[slot * self.samples..(slot + 1) * self.samples]
    }

    /// Counts of every slot at one sample.
    pub fn sample_counts(&self, sample: usize) -> Vec<u64> {
        (0..self.slots).map(|slot| self.count(slot, sample)).collect()
    }

    /// Traits of every slot at one sample.
    pub fn sample_traits(&self, sample: usize) -> Vec<f64> {
        (0..self.slots)
            .map(|slot| self.trait_value(slot, sample))
            .collect()
    }

    /// Total population size at every sample, saturating at `u64::MAX`.
    pub fn total_counts(&self) -> Vec<u64> {
        (0..self.samples)
            .map(|sample| {
                (0..self.slots).fold(0u64, |total, slot| {
                    total.saturating_add(self.count(slot, sample))
                })
            })
            .collect()
    }

    /// Count-weighted trait histogram per sample.
    ///
    /// Returns `samples` rows of `bins` equal-width bins over `range`.
    /// Traits outside the range are ignored; the upper edge is inclusive.
    pub fn trait_density(&self, bins: usize, range: (f64, f64)) -> Vec<Vec<u64>> {
        let (lo, hi) = range;
        let width = (hi - lo) / bins as f64;

        (0..self.samples)
            .map(|sample| {
                let mut row = vec![0u64; bins];
                if bins == 0 || !(width > 0.0) {
                    return row;
                }
                for slot in 0..self.slots {
                    let n = self.count(slot, sample);
                    let u = self.trait_value(slot, sample);
                    if n == 0 || u < lo || u > hi {
                        continue;
                    }
                    let bin = (((u - lo) / width) as usize).min(bins - 1);
                    row[bin] = row[bin].saturating_add(n);
                }
                row
            })
            .collect()
    }
}

/// Population statistics for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Saturates at `u64::MAX`.
    pub total_count: u64,
    pub occupied_slots: usize,
    /// Count-weighted mean trait.
    pub mean_trait: f64,
    /// Count-weighted trait variance.
    pub trait_variance: f64,
    pub min_trait: f64,
    pub max_trait: f64,
}

impl PopulationStats {
    /// Compute statistics from state. Trait statistics are NaN for an extinct population.
    pub fn from_state(state: &PopulationState) -> Self {
        let mut total_count = 0u64;
        let mut occupied_slots = 0usize;
        let mut weighted_sum = 0.0f64;
        let mut min_trait = f64::INFINITY;
        let mut max_trait = f64::NEG_INFINITY;

        for (&n, &u) in state.counts.iter().zip(&state.traits) {
            if n == 0 {
                continue;
            }
            total_count = total_count.saturating_add(n);
            occupied_slots += 1;
            weighted_sum += n as f64 * u;
            min_trait = min_trait.min(u);
            max_trait = max_trait.max(u);
        }

        if total_count == 0 {
            return Self {
                total_count,
                occupied_slots,
                mean_trait: f64::NAN,
                trait_variance: f64::NAN,
                min_trait: f64::NAN,
                max_trait: f64::NAN,
            };
        }

        let mean_trait = weighted_sum / total_count as f64;
        let trait_variance = state
            .counts
            .iter()
            .zip(&state.traits)
            .filter(|&(&n, _)| n > 0)
            .map(|(&n, &u)| n as f64 * (u - mean_trait).powi(2))
            .sum::<f64>()
            / total_count as f64;

        Self {
            total_count,
            occupied_slots,
            mean_trait,
            trait_variance,
            min_trait,
            max_trait,
        }
    }
}

/// Number of phenotypic clusters: groups of occupied traits separated by gaps wider than `min_gap`.
///
/// A population that has undergone evolutionary branching has more than one cluster.
pub fn count_clusters(state: &PopulationState, min_gap: f64) -> usize {
    let mut occupied: Vec<f64> = state
        .counts
        .iter()
        .zip(&state.traits)
        .filter(|&(&n, _)| n > 0)
        .map(|(_, &u)| u)
        .collect();
    if occupied.is_empty() {
        return 0;
    }
    occupied.sort_by(f64::total_cmp);
    1 + occupied.windows(2).filter(|w| w[1] - w[0] > min_gap).count()
}
