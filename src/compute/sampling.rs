//! Random draws used by the birth-death step.

use rand::Rng;
use rand_distr::{Binomial, Distribution, Normal, Poisson, StandardNormal};

use crate::schema::TraitBounds;

/// Largest Poisson mean sampled exactly. Above it the Normal approximation is used.
pub const POISSON_MEAN_LIMIT: f64 = 1.0e12;

/// Draws at or above this value do not fit in a slot count (`u64::MAX as f64` is 2^64).
const COUNT_LIMIT: f64 = u64::MAX as f64;

/// Draw the next count of a slot whose expected size is `mean`.
///
/// Samples `Poisson(mean)`, or `Normal(mean, sqrt(mean))` rounded and floored
/// at zero when the mean is too large for the Poisson sampler. Both have
/// variance equal to the mean. `mean` must be finite and non-negative.
///
/// Returns `None` when the draw does not fit in a `u64`.
pub fn sample_offspring<R: Rng + ?Sized>(mean: f64, rng: &mut R) -> Option<u64> {
    if mean <= 0.0 {
        return Some(0);
    }

    if mean <= POISSON_MEAN_LIMIT {
        if let Ok(poisson) = Poisson::new(mean) {
            let draw: f64 = poisson.sample(rng);
            return Some(draw as u64);
        }
    }

    normal_offspring(mean, rng)
}

fn normal_offspring<R: Rng + ?Sized>(mean: f64, rng: &mut R) -> Option<u64> {
    let draw = match Normal::new(mean, mean.sqrt()) {
        Ok(normal) => normal.sample(rng).round().max(0.0),
        Err(_) => mean.round(),
    };
    (draw < COUNT_LIMIT).then_some(draw as u64)
}

/// Number of mutants among `births` newborns.
///
/// No random number is consumed when there are no births or the rate is zero.
pub fn sample_mutants<R: Rng + ?Sized>(births: u64, mutation_rate: f64, rng: &mut R) -> u64 {
    if births == 0 || mutation_rate <= 0.0 {
        return 0;
    }
    Binomial::new(births, mutation_rate)
        .map(|binomial| binomial.sample(rng))
        .unwrap_or(0)
}

/// Gaussian mutation of a parent trait, clamped into `bounds`.
pub fn mutate_trait<R: Rng + ?Sized>(
    parent: f64,
    mutation_effect: f64,
    bounds: TraitBounds,
    rng: &mut R,
) -> f64 {
    let noise: f64 = rng.sample(StandardNormal);
    bounds.clamp(parent + noise * mutation_effect)
}
