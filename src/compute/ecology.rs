//! Ecological growth-rate models.
//!
//! A model maps the current slot array (traits and counts) to one per-capita
//! growth rate per slot. Rates are computed for every slot, including empty
//! ones, though the engine only reads them for occupied slots. Empty slots
//! contribute nothing to the interaction sums since their density is zero.

use crate::schema::{
    ConfigError, EcologyConfig, LogisticParams, PublicGoodsParams, ResourceCompetitionParams,
};

/// Capability shared by every ecological model.
pub trait GrowthModel {
    /// Write one growth rate per slot into `rates`.
    ///
    /// All three slices have the same length.
    fn compute_rates(&self, traits: &[f64], counts: &[u64], rates: &mut [f64]);

    /// Allocating variant of [`GrowthModel::compute_rates`].
    fn growth_rates(&self, traits: &[f64], counts: &[u64]) -> Vec<f64> {
        let mut rates = vec![0.0; traits.len()];
        self.compute_rates(traits, counts, &mut rates);
        rates
    }
}

/// Validated ecological model, selected at configuration time.
#[derive(Debug, Clone, PartialEq)]
pub struct EcologicalModel {
    config: EcologyConfig,
}

impl EcologicalModel {
    pub fn new(config: EcologyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EcologyConfig {
        &self.config
    }
}

impl GrowthModel for EcologicalModel {
    fn compute_rates(&self, traits: &[f64], counts: &[u64], rates: &mut [f64]) {
        match &self.config {
            EcologyConfig::Logistic(p) => p.compute_rates(traits, counts, rates),
            EcologyConfig::ResourceCompetition(p) => p.compute_rates(traits, counts, rates),
            EcologyConfig::PublicGoods(p) => p.compute_rates(traits, counts, rates),
        }
    }
}

/// Gaussian carrying capacity: K(u) = exp(-u^2 / (2 sigma_k^2)).
#[inline]
pub fn carrying_capacity(u: f64, sigma_k: f64) -> f64 {
    (-(u * u) / (2.0 * sigma_k * sigma_k)).exp()
}

/// Competition kernel: alpha(u, v) = exp(-(u - v + sigma_alpha^2 beta)^2 / (2 sigma_alpha^2)).
///
/// With `beta > 0` competition is asymmetric.
#[inline]
pub fn competition_kernel(u: f64, v: f64, sigma_alpha: f64, beta: f64) -> f64 {
    let sigma_sq = sigma_alpha * sigma_alpha;
    let shift = u - v + sigma_sq * beta;
    (-(shift * shift) / (2.0 * sigma_sq)).exp()
}

impl GrowthModel for LogisticParams {
    fn compute_rates(&self, traits: &[f64], counts: &[u64], rates: &mut [f64]) {
        let inv_k0 = 1.0 / self.k0;

        for (rate, &u) in rates.iter_mut().zip(traits) {
            let crowding: f64 = traits
                .iter()
                .zip(counts)
                .filter(|&(_, &n)| n > 0)
                .map(|(&v, &n)| {
                    competition_kernel(u, v, self.sigma_alpha, self.beta) * n as f64 * inv_k0
                })
                .sum();
            *rate = 1.0 - crowding / carrying_capacity(u, self.sigma_k);
        }
    }
}

impl ResourceCompetitionParams {
    #[inline]
    fn attack_1(&self, u: f64) -> f64 {
        self.a1 + self.b1 * u
    }

    #[inline]
    fn attack_2(&self, u: f64) -> f64 {
        self.a2 + self.b2 * u
    }
}

impl GrowthModel for ResourceCompetitionParams {
    fn compute_rates(&self, traits: &[f64], counts: &[u64], rates: &mut [f64]) {
        let inv_k0 = 1.0 / self.k0;

        // Aggregate consumption of each resource.
        let (uptake_1, uptake_2) = traits.iter().zip(counts).fold(
            (0.0, 0.0),
            |(acc_1, acc_2), (&u, &n)| {
                let density = n as f64 * inv_k0;
                (
                    acc_1 + self.attack_1(u) * u * density,
                    acc_2 + self.attack_2(u) * (1.0 - u) * density,
                )
            },
        );

        let resource_1 = self.d1 * self.k1 / (uptake_1 + self.d1);
        let resource_2 = self.d2 * self.k2 / (uptake_2 + self.d2);

        for (rate, &u) in rates.iter_mut().zip(traits) {
            *rate = resource_1 * self.attack_1(u) * u
                + resource_2 * self.attack_2(u) * (1.0 - u)
                - self.mu;
        }
    }
}

impl GrowthModel for PublicGoodsParams {
    fn compute_rates(&self, traits: &[f64], counts: &[u64], rates: &mut [f64]) {
        let slots = traits.len() as f64;
        let inv_k0 = 1.0 / self.k0;

        // Mean and population variance of density-weighted traits over all slots.
        let weighted = traits
            .iter()
            .zip(counts)
            .map(|(&u, &n)| u * n as f64 * inv_k0);
        let mean = weighted.clone().sum::<f64>() / slots;
        let variance = weighted.map(|x| (x - mean).powi(2)).sum::<f64>() / slots;

        for (rate, &u) in rates.iter_mut().zip(traits) {
            let shared = u + mean;
            let fecundity = self.k0
                * (1.0 + self.b1 * shared + self.b2 * (shared * shared + variance)
                    - self.c1 * u
                    - self.c2 * u * u);
            *rate = fecundity - self.d;
        }
    }
}
