//! Birth-death engine - Main simulation driver.
//!
//! Advances the fixed-size slot array one time step at a time: growth rates
//! from the ecological model, stochastic birth and death per occupied slot,
//! then placement of mutant offspring into empty slots.

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::schema::{
    ConfigError, InitialPopulation, SimulationConfig, TraitBounds, validate_slots,
};

use super::{
    EcologicalModel, GrowthModel, MutationBuffers, MutationScratch, Trajectory, place_mutants,
    sample_mutants, sample_offspring,
};

/// Population state container.
///
/// Slot `i` holds `counts[i]` individuals carrying trait `traits[i]`. A slot is
/// occupied iff its count is positive; the trait of an empty slot is stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationState {
    /// Individuals per slot.
    pub counts: Vec<u64>,
    /// Trait value per slot.
    pub traits: Vec<f64>,
    /// Current simulation time.
    pub time: f64,
    /// Step count.
    pub step: u64,
}

impl PopulationState {
    /// Create a state at time 0 from explicit slot arrays.
    pub fn new(counts: Vec<u64>, traits: Vec<f64>) -> Result<Self, ConfigError> {
        if counts.len() != traits.len() {
            return Err(ConfigError::SlotLengthMismatch {
                counts: counts.len(),
                traits: traits.len(),
            });
        }
        if counts.is_empty() {
            return Err(ConfigError::NoSlots);
        }
        Ok(Self {
            counts,
            traits,
            time: 0.0,
            step: 0,
        })
    }

    /// Create new state from an initial population description.
    pub fn from_initial<R: Rng + ?Sized>(
        initial: &InitialPopulation,
        bounds: TraitBounds,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        initial.validate(bounds)?;
        let (counts, traits) = initial.generate(bounds, rng);
        Self::new(counts, traits)
    }

    /// Number of slots (M).
    #[inline]
    pub fn slots(&self) -> usize {
        self.counts.len()
    }

    /// Number of slots with a positive count.
    pub fn occupied_slots(&self) -> usize {
        self.counts.iter().filter(|&&n| n > 0).count()
    }

    /// Total number of individuals, saturating at `u64::MAX`.
    pub fn total_count(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |total, &n| total.saturating_add(n))
    }

    pub fn is_extinct(&self) -> bool {
        self.counts.iter().all(|&n| n == 0)
    }
}

/// What happened during a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Net births summed over slots that grew.
    pub births: u64,
    /// Net deaths summed over slots that shrank.
    pub deaths: u64,
    /// Mutant offspring drawn.
    pub mutants: u64,
    /// Lineages founded in empty slots.
    pub founders: u64,
    /// Mutants discarded because no empty slot was left.
    pub dropped: u64,
}

/// Aggregate statistics of a finished run. Counters saturate at `u64::MAX`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: u64,
    pub final_time: f64,
    pub births: u64,
    pub deaths: u64,
    pub mutants: u64,
    pub founders: u64,
    /// Mutants lost to slot exhaustion over the whole run.
    pub dropped_mutants: u64,
    /// Steps in which at least one mutant was dropped.
    pub capacity_exhausted_steps: u64,
    /// Whether the population was extinct at the end of the run.
    pub extinct: bool,
}

impl RunSummary {
    fn absorb(&mut self, report: &StepReport) {
        self.steps += 1;
        self.births = self.births.saturating_add(report.births);
        self.deaths = self.deaths.saturating_add(report.deaths);
        self.mutants = self.mutants.saturating_add(report.mutants);
        self.founders = self.founders.saturating_add(report.founders);
        self.dropped_mutants = self.dropped_mutants.saturating_add(report.dropped);
        if report.dropped > 0 {
            self.capacity_exhausted_steps += 1;
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// Sampled counts, traits and times.
    pub trajectory: Trajectory,
    /// Slot array after the last step.
    pub final_state: PopulationState,
    pub summary: RunSummary,
}

/// Errors that abort a run. A failed run produces no output.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Growth rate {rate} in slot {slot} at step {step} gives a non-finite expected count")]
    NonFiniteGrowth { step: u64, slot: usize, rate: f64 },
    #[error("Count drawn for slot {slot} at step {step} (expected {mean}) exceeds the u64 range")]
    CountOverflow { step: u64, slot: usize, mean: f64 },
}

/// Time-discretized birth-death-mutation simulator.
pub struct BirthDeathEngine<G = EcologicalModel> {
    config: SimulationConfig,
    model: G,
    dt: f64,
    /// Growth rate per slot for the current step.
    rates: Vec<f64>,
    /// Pre-allocated buffers for the next state (swapped in each step).
    next_counts: Vec<u64>,
    next_traits: Vec<f64>,
    /// Mutants produced per slot this step.
    mutants: Vec<u64>,
    scratch: MutationScratch,
}

impl<G: GrowthModel> BirthDeathEngine<G> {
    /// Create new engine from configuration and an ecological model.
    pub fn new(config: SimulationConfig, model: G) -> Result<Self, ConfigError> {
        config.validate()?;
        let dt = config.dt();

        Ok(Self {
            config,
            model,
            dt,
            rates: Vec::new(),
            next_counts: Vec::new(),
            next_traits: Vec::new(),
            mutants: Vec::new(),
            scratch: MutationScratch::default(),
        })
    }

    fn resize_buffers(&mut self, slots: usize) {
        if self.rates.len() != slots {
            self.rates.resize(slots, 0.0);
            self.next_counts.resize(slots, 0);
            self.next_traits.resize(slots, 0.0);
            self.mutants.resize(slots, 0);
            self.scratch = MutationScratch::with_capacity(slots);
        }
    }

    /// Perform one simulation step.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        state: &mut PopulationState,
        rng: &mut R,
    ) -> Result<StepReport, SimulationError> {
        let slots = state.slots();
        if state.traits.len() != slots {
            return Err(ConfigError::SlotLengthMismatch {
                counts: slots,
                traits: state.traits.len(),
            }
            .into());
        }
        self.resize_buffers(slots);
        let step = state.step + 1;

        // 1. Growth rates for the whole slot array
        self.model
            .compute_rates(&state.traits, &state.counts, &mut self.rates);

        // 2. Birth and death of occupied slots, then mutant draws among births
        let mut report = StepReport::default();
        self.next_traits.copy_from_slice(&state.traits);

        for slot in 0..slots {
            let count = state.counts[slot];
            self.mutants[slot] = 0;
            if count == 0 {
                self.next_counts[slot] = 0;
                continue;
            }

            let rate = self.rates[slot];
            let mean = count as f64 * (rate * self.dt).exp();
            if !mean.is_finite() {
                return Err(SimulationError::NonFiniteGrowth { step, slot, rate });
            }

            let next = sample_offspring(mean, rng)
                .ok_or(SimulationError::CountOverflow { step, slot, mean })?;
            self.next_counts[slot] = next;

            if next > count {
                let births = next - count;
                let mutants = sample_mutants(births, self.config.mutation_rate, rng);
                self.mutants[slot] = mutants;
                report.births = report.births.saturating_add(births);
                report.mutants = report.mutants.saturating_add(mutants);
            } else {
                report.deaths = report.deaths.saturating_add(count - next);
            }
        }

        // 3. Mutants found new lineages in empty slots
        if report.mutants > 0 {
            let placement = place_mutants(
                MutationBuffers {
                    counts: &state.counts,
                    traits: &state.traits,
                    mutants: &self.mutants,
                    next_counts: &mut self.next_counts,
                    next_traits: &mut self.next_traits,
                },
                self.config.mutation_effect,
                self.config.bounds(),
                &mut self.scratch,
                rng,
            );
            report.founders = placement.founders;
            report.dropped = placement.dropped;

            if placement.dropped > 0 {
                debug!(
                    "step {}: {} of {} mutants dropped, no empty slot left",
                    step, placement.dropped, report.mutants
                );
            }
        }

        // Swap buffers (no allocation)
        std::mem::swap(&mut state.counts, &mut self.next_counts);
        std::mem::swap(&mut state.traits, &mut self.next_traits);
        state.step = step;
        state.time = step as f64 * self.dt;

        Ok(report)
    }

    /// Run the full simulation from `state`, sampling every `skip` steps.
    ///
    /// The run restarts the clock at time 0. Sample 0 holds `state` itself.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        mut state: PopulationState,
        rng: &mut R,
    ) -> Result<SimulationOutput, SimulationError> {
        validate_slots(&state.counts, &state.traits, self.config.bounds())?;
        state.step = 0;
        state.time = 0.0;

        let steps = self.config.steps;
        let skip = self.config.skip;
        let samples = self.config.samples();

        info!(
            "simulating {} slots for {} steps (dt = {}), {} samples",
            state.slots(),
            steps,
            self.dt,
            samples
        );

        let mut trajectory = Trajectory::new(state.slots(), samples);
        trajectory.record(0, &state);

        let mut summary = RunSummary::default();
        let mut extinct = state.is_extinct();

        for t in 1..=steps {
            let report = self.step(&mut state, rng)?;
            summary.absorb(&report);

            if !extinct && state.is_extinct() {
                extinct = true;
                info!("population went extinct at t = {:.4}", state.time);
            }

            let sample = (t / skip) as usize;
            if t % skip == 0 && sample < samples {
                trajectory.record(sample, &state);
            }
        }

        summary.final_time = state.time;
        summary.extinct = state.is_extinct();

        if summary.dropped_mutants > 0 {
            warn!(
                "{} of {} mutants dropped over {} steps with no empty slot",
                summary.dropped_mutants, summary.mutants, summary.capacity_exhausted_steps
            );
        }
        info!(
            "run finished: {} individuals in {} occupied slots, {} founders",
            state.total_count(),
            state.occupied_slots(),
            summary.founders
        );

        Ok(SimulationOutput {
            trajectory,
            final_state: state,
            summary,
        })
    }

    /// Get configuration reference.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn model(&self) -> &G {
        &self.model
    }

    /// Length of one time step.
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EcologyConfig, EcologyPreset, LogisticParams};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Every slot grows at the same fixed rate.
    struct ConstantGrowth(f64);

    impl GrowthModel for ConstantGrowth {
        fn compute_rates(&self, _traits: &[f64], _counts: &[u64], rates: &mut [f64]) {
            rates.fill(self.0);
        }
    }

    fn sim_config(total_time: f64, steps: u64, skip: u64, mutation_rate: f64) -> SimulationConfig {
        SimulationConfig {
            total_time,
            steps,
            skip,
            mutation_rate,
            mutation_effect: 0.05,
            trait_min: -5.0,
            trait_max: 5.0,
        }
    }

    fn model(preset: EcologyPreset, k0: f64) -> EcologicalModel {
        EcologicalModel::new(preset.with_system_size(k0)).unwrap()
    }

    fn monomorphic(slots: usize, count: u64) -> PopulationState {
        let mut counts = vec![0; slots];
        counts[0] = count;
        PopulationState::new(counts, vec![0.0; slots]).unwrap()
    }

    #[test]
    fn test_output_shape_and_times() {
        let config = sim_config(10.0, 1000, 10, 0.1);
        let mut engine =
            BirthDeathEngine::new(config, model(EcologyPreset::LogisticBranching, 100.0)).unwrap();
        let state = PopulationState::new(vec![100; 5], vec![0.0, 0.01, -0.01, 0.02, -0.02]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let output = engine.run(state, &mut rng).unwrap();
        let trajectory = &output.trajectory;

        assert_eq!(trajectory.shape(), (5, 100));
        assert_eq!(trajectory.times().len(), 100);
        assert_eq!(trajectory.times()[0], 0.0);
        assert!((trajectory.times()[99] - 9.9).abs() < 1e-9);
        assert_eq!(trajectory.sample_counts(0), vec![100; 5]);
        assert_eq!(output.summary.steps, 1000);
        assert!((output.summary.final_time - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_uneven_skip_truncates_samples() {
        let config = sim_config(2.5, 25, 10, 0.0);
        let mut engine =
            BirthDeathEngine::new(config, model(EcologyPreset::LogisticNoBranching, 50.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        let output = engine.run(monomorphic(2, 50), &mut rng).unwrap();
        assert_eq!(output.trajectory.shape(), (2, 2));
        assert!((output.trajectory.times()[1] - 1.0).abs() < 1e-9);
        assert_eq!(output.summary.steps, 25);
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let run = |seed| {
            let config = sim_config(5.0, 500, 5, 0.1);
            let mut engine =
                BirthDeathEngine::new(config, model(EcologyPreset::LogisticBranching, 200.0))
                    .unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            engine.run(monomorphic(12, 200), &mut rng).unwrap()
        };

        let a = run(99);
        let b = run(99);
        assert_eq!(a.trajectory, b.trajectory);
        assert_eq!(a.final_state, b.final_state);
        assert_eq!(a.summary, b.summary);

        let c = run(100);
        assert_ne!(a.trajectory, c.trajectory);
    }

    #[test]
    fn test_slot_invariants_and_trait_clamp() {
        let mut config = sim_config(20.0, 2000, 10, 0.2);
        config.mutation_effect = 0.5;
        config.trait_min = -0.3;
        config.trait_max = 0.4;
        let mut engine =
            BirthDeathEngine::new(config.clone(), model(EcologyPreset::LogisticBranching, 200.0))
                .unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let output = engine.run(monomorphic(15, 200), &mut rng).unwrap();
        let trajectory = &output.trajectory;

        assert!(output.summary.founders > 0);
        for sample in 0..trajectory.samples() {
            let counts = trajectory.sample_counts(sample);
            assert_eq!(counts.len(), 15);
            assert!(counts.iter().filter(|&&n| n > 0).count() <= 15);
            for value in trajectory.sample_traits(sample) {
                assert!(config.bounds().contains(value), "trait {value} escaped bounds");
            }
        }
    }

    #[test]
    fn test_founders_descend_from_occupied_slots() {
        let config = sim_config(50.0, 500, 1, 0.05);
        let effect = config.mutation_effect;
        let mut engine =
            BirthDeathEngine::new(config, model(EcologyPreset::LogisticBranching, 100.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);

        let output = engine.run(monomorphic(30, 100), &mut rng).unwrap();
        let trajectory = &output.trajectory;
        assert!(output.summary.founders > 0);

        let mut founded = 0;
        for sample in 1..trajectory.samples() {
            let before = trajectory.sample_counts(sample - 1);
            let after = trajectory.sample_counts(sample);
            let parent_traits: Vec<f64> = (0..trajectory.slots())
                .filter(|&slot| before[slot] > 0)
                .map(|slot| trajectory.trait_value(slot, sample - 1))
                .collect();

            for slot in 0..trajectory.slots() {
                if before[slot] == 0 && after[slot] > 0 {
                    founded += 1;
                    assert_eq!(after[slot], 1);
                    let value = trajectory.trait_value(slot, sample);
                    assert!(
                        parent_traits
                            .iter()
                            .any(|&parent| (value - parent).abs() <= 6.0 * effect),
                        "founder trait {value} far from every parent"
                    );
                }
            }
        }
        assert!(founded > 0);
    }

    #[test]
    fn test_logistic_equilibrium_regression() {
        let k0 = 1000.0;
        let config = sim_config(1000.0, 10_000, 10, 0.0);
        let mut engine =
            BirthDeathEngine::new(config, model(EcologyPreset::LogisticNoBranching, k0)).unwrap();
        let state = PopulationState::new(vec![1000], vec![0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(31);

        let output = engine.run(state, &mut rng).unwrap();
        let counts = output.trajectory.slot_counts(0);

        // Discard the transient
        let settled = &counts[100..];
        let mean = settled.iter().sum::<u64>() as f64 / settled.len() as f64;
        assert!(
            ((mean - k0) / k0).abs() < 0.05,
            "mean count {mean} far from equilibrium {k0}"
        );
        assert_eq!(output.summary.founders, 0);
        assert!(!output.summary.extinct);
    }

    #[test]
    fn test_capacity_exhaustion_fills_every_vacancy() {
        let config = sim_config(1.0, 1, 1, 0.9);
        let mut engine = BirthDeathEngine::new(config, ConstantGrowth(3.0_f64.ln())).unwrap();
        let mut state = monomorphic(4, 100);
        let mut rng = StdRng::seed_from_u64(5);

        let report = engine.step(&mut state, &mut rng).unwrap();

        assert!(report.mutants > 3);
        assert_eq!(report.founders, 3);
        assert_eq!(report.dropped, report.mutants - 3);
        assert_eq!(&state.counts[1..], &[1, 1, 1]);
        assert_eq!(state.occupied_slots(), 4);
        assert_eq!(state.total_count(), 100 + report.births);
    }

    #[test]
    fn test_run_summary_counts_dropped_mutants() {
        let config = sim_config(2.0, 20, 1, 0.5);
        let mut engine = BirthDeathEngine::new(config, ConstantGrowth(1.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(12);

        let output = engine.run(monomorphic(3, 50), &mut rng).unwrap();
        let summary = &output.summary;

        // Founder lineages can die out and free their slot again.
        assert!(summary.founders >= 2);
        assert_eq!(summary.founders + summary.dropped_mutants, summary.mutants);
        assert!(summary.capacity_exhausted_steps > 0);
    }

    #[test]
    fn test_empty_slots_are_frozen_without_mutation() {
        let config = sim_config(5.0, 100, 1, 0.0);
        let mut engine =
            BirthDeathEngine::new(config, model(EcologyPreset::LogisticBranching, 100.0)).unwrap();
        let state = PopulationState::new(vec![80, 0, 0], vec![0.0, 1.5, -2.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let output = engine.run(state, &mut rng).unwrap();
        assert_eq!(output.summary.mutants, 0);
        for sample in 0..output.trajectory.samples() {
            assert_eq!(output.trajectory.count(1, sample), 0);
            assert_eq!(output.trajectory.count(2, sample), 0);
            assert_eq!(output.trajectory.trait_value(1, sample), 1.5);
            assert_eq!(output.trajectory.trait_value(2, sample), -2.0);
        }
    }

    #[test]
    fn test_extinction_keeps_stale_traits() {
        let config = sim_config(1.0, 10, 1, 0.1);
        let mut engine = BirthDeathEngine::new(config, ConstantGrowth(-200.0)).unwrap();
        let state = PopulationState::new(vec![5, 7], vec![0.3, -0.3]).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        let output = engine.run(state, &mut rng).unwrap();
        assert!(output.summary.extinct);
        assert_eq!(output.final_state.counts, vec![0, 0]);
        assert_eq!(output.final_state.traits, vec![0.3, -0.3]);
        assert_eq!(output.summary.deaths, 12);
    }

    #[test]
    fn test_non_finite_rate_aborts_run() {
        let config = sim_config(1.0, 10, 1, 0.0);
        let params = EcologyConfig::Logistic(LogisticParams {
            k0: 10.0,
            sigma_k: 1.0,
            sigma_alpha: 0.0,
            beta: 0.0,
        });
        let mut engine =
            BirthDeathEngine::new(config, EcologicalModel::new(params).unwrap()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let result = engine.run(monomorphic(2, 10), &mut rng);
        assert!(matches!(
            result,
            Err(SimulationError::NonFiniteGrowth {
                step: 1,
                slot: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_count_beyond_u64_aborts_run() {
        // rate * dt = 60 gives an expected count near 1e26 per slot.
        let config = sim_config(1.0, 1, 1, 0.1);
        let mut engine = BirthDeathEngine::new(config, ConstantGrowth(60.0)).unwrap();
        let state = PopulationState::new(vec![10, 10], vec![0.0, 0.1]).unwrap();
        let mut rng = StdRng::seed_from_u64(6);

        let result = engine.run(state, &mut rng);
        match result {
            Err(SimulationError::CountOverflow { step, slot, mean }) => {
                assert_eq!(step, 1);
                assert_eq!(slot, 0);
                assert!(mean > u64::MAX as f64);
            }
            other => panic!("expected count overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_large_counts_saturate_totals() {
        let config = sim_config(1.0, 1, 1, 0.0);
        let mut engine = BirthDeathEngine::new(config, ConstantGrowth(0.0)).unwrap();
        let big = 1u64 << 63;
        let mut state = PopulationState::new(vec![big, big], vec![0.0, 0.1]).unwrap();
        assert_eq!(state.total_count(), u64::MAX);

        let mut rng = StdRng::seed_from_u64(2);
        engine.step(&mut state, &mut rng).unwrap();
        let exact = state.counts[0].checked_add(state.counts[1]);
        assert_eq!(state.total_count(), exact.unwrap_or(u64::MAX));
    }

    #[test]
    fn test_rejects_out_of_bounds_initial_traits() {
        let config = sim_config(1.0, 10, 1, 0.0);
        let mut engine = BirthDeathEngine::new(config, ConstantGrowth(0.0)).unwrap();
        let state = PopulationState::new(vec![1, 1], vec![0.0, 9.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matches!(
            engine.run(state, &mut rng),
            Err(SimulationError::Config(ConfigError::TraitOutOfBounds { slot: 1, .. }))
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = sim_config(-1.0, 10, 1, 0.0);
        assert!(BirthDeathEngine::new(config, ConstantGrowth(0.0)).is_err());
    }

    #[test]
    fn test_state_from_initial_population() {
        let mut rng = StdRng::seed_from_u64(1);
        let bounds = TraitBounds {
            min: -5.0,
            max: 5.0,
        };
        let state = PopulationState::from_initial(&InitialPopulation::default(), bounds, &mut rng)
            .unwrap();
        assert_eq!(state.slots(), 100);
        assert_eq!(state.total_count(), 100_000);
        assert_eq!(state.occupied_slots(), 100);
    }
}
