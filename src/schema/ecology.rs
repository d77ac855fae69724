//! Parameter types for the ecological growth-rate models.
//!
//! Every model carries the system size `k0`, which scales counts to densities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;

fn check(name: &'static str, value: f64, ok: bool) -> Result<(), ConfigError> {
    if value.is_finite() && ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidEcologyParameter { name, value })
    }
}

/// Ecological model selection with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum EcologyConfig {
    /// Logistic growth with Gaussian carrying capacity and competition kernel.
    Logistic(LogisticParams),
    /// Competition for two resources with trait-dependent attack rates.
    ResourceCompetition(ResourceCompetitionParams),
    /// Public goods game with quadratic benefits and costs.
    PublicGoods(PublicGoodsParams),
}

impl Default for EcologyConfig {
    fn default() -> Self {
        EcologyPreset::LogisticBranchingAsymmetric.with_system_size(1000.0)
    }
}

impl EcologyConfig {
    /// System size of the selected model.
    pub fn system_size(&self) -> f64 {
        match self {
            Self::Logistic(p) => p.k0,
            Self::ResourceCompetition(p) => p.k0,
            Self::PublicGoods(p) => p.k0,
        }
    }

    /// Short model name for display.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Logistic(_) => "logistic",
            Self::ResourceCompetition(_) => "resource-competition",
            Self::PublicGoods(_) => "public-goods",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Logistic(p) => p.validate(),
            Self::ResourceCompetition(p) => p.validate(),
            Self::PublicGoods(p) => p.validate(),
        }
    }
}

/// Frequency-dependent logistic competition.
///
/// Deterministic adaptive dynamics predicts branching iff `sigma_alpha < sigma_k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// System size.
    pub k0: f64,
    /// Width of the carrying capacity (centered at 0).
    pub sigma_k: f64,
    /// Width of the competition kernel.
    pub sigma_alpha: f64,
    /// Asymmetry of competition; 0 is symmetric.
    #[serde(default)]
    pub beta: f64,
}

impl LogisticParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("k0", self.k0, self.k0 > 0.0)?;
        check("sigma_k", self.sigma_k, self.sigma_k >= 0.0)?;
        check("sigma_alpha", self.sigma_alpha, self.sigma_alpha >= 0.0)?;
        check("beta", self.beta, self.beta >= 0.0)
    }
}

/// Two-resource competition (Claessen et al. 2007). `k0` plays the role of the habitat volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCompetitionParams {
    pub k0: f64,
    /// Intercept of the attack rate on resource 1.
    pub a1: f64,
    /// Slope of the attack rate on resource 1.
    pub b1: f64,
    /// Intercept of the attack rate on resource 2.
    pub a2: f64,
    /// Slope of the attack rate on resource 2.
    pub b2: f64,
    /// Renewal rate of resource 1.
    pub d1: f64,
    /// Renewal rate of resource 2.
    pub d2: f64,
    /// Carrying capacity of resource 1.
    pub k1: f64,
    /// Carrying capacity of resource 2.
    pub k2: f64,
    /// Constant death rate.
    pub mu: f64,
}

impl ResourceCompetitionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("k0", self.k0, self.k0 > 0.0)?;
        for (name, value) in [
            ("a1", self.a1),
            ("b1", self.b1),
            ("a2", self.a2),
            ("b2", self.b2),
            ("d1", self.d1),
            ("d2", self.d2),
            ("k1", self.k1),
            ("k2", self.k2),
            ("mu", self.mu),
        ] {
            check(name, value, true)?;
        }
        Ok(())
    }
}

/// Public goods game (Débarre & Otto 2016). `k0` plays the role of the baseline benefit B0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicGoodsParams {
    pub k0: f64,
    /// Linear benefit coefficient.
    pub b1: f64,
    /// Quadratic benefit coefficient.
    pub b2: f64,
    /// Linear cost coefficient.
    pub c1: f64,
    /// Quadratic cost coefficient.
    pub c2: f64,
    /// Constant death rate.
    pub d: f64,
}

impl PublicGoodsParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("k0", self.k0, self.k0 > 0.0)?;
        for (name, value) in [
            ("b1", self.b1),
            ("b2", self.b2),
            ("c1", self.c1),
            ("c2", self.c2),
            ("d", self.d),
        ] {
            check(name, value, true)?;
        }
        Ok(())
    }
}

/// Named parameter bundles. The system size is supplied separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EcologyPreset {
    LogisticBranching,
    LogisticBranchingAsymmetric,
    LogisticNoBranching,
    ResourceNeutral,
    ResourceStrong,
    ResourceWeak,
    PublicGoods,
}

impl EcologyPreset {
    pub const ALL: [EcologyPreset; 7] = [
        Self::LogisticBranching,
        Self::LogisticBranchingAsymmetric,
        Self::LogisticNoBranching,
        Self::ResourceNeutral,
        Self::ResourceStrong,
        Self::ResourceWeak,
        Self::PublicGoods,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::LogisticBranching => "logistic-branching",
            Self::LogisticBranchingAsymmetric => "logistic-branching-asymmetric",
            Self::LogisticNoBranching => "logistic-no-branching",
            Self::ResourceNeutral => "resource-neutral",
            Self::ResourceStrong => "resource-strong",
            Self::ResourceWeak => "resource-weak",
            Self::PublicGoods => "public-goods",
        }
    }

    /// Build the full model configuration for system size `k0`.
    pub fn with_system_size(self, k0: f64) -> EcologyConfig {
        let logistic = |sigma_k, sigma_alpha, beta| {
            EcologyConfig::Logistic(LogisticParams {
                k0,
                sigma_k,
                sigma_alpha,
                beta,
            })
        };
        let resource = |a1, b1, a2| {
            EcologyConfig::ResourceCompetition(ResourceCompetitionParams {
                k0,
                a1,
                b1,
                a2,
                b2: 0.0,
                d1: 1.0,
                d2: 1.0,
                k1: 1.0,
                k2: 1.0,
                mu: 0.1,
            })
        };

        match self {
            Self::LogisticBranching => logistic(1.9, 0.7, 0.0),
            Self::LogisticBranchingAsymmetric => logistic(1.9, 0.7, 0.5),
            Self::LogisticNoBranching => logistic(0.7, 1.9, 0.0),
            Self::ResourceNeutral => resource(1.0, 0.0, 1.0),
            Self::ResourceStrong => resource(1.0, 1.0, 2.0),
            Self::ResourceWeak => resource(2.0, -1.0, 1.0),
            Self::PublicGoods => EcologyConfig::PublicGoods(PublicGoodsParams {
                k0,
                b1: 7.0,
                b2: -1.5,
                c1: 4.6,
                c2: -1.0,
                d: 1.0,
            }),
        }
    }
}

impl fmt::Display for EcologyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EcologyPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}
