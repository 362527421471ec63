//! Configuration for Beta ratio queries.

use anyhow::Result;
use quadrature::{GaussConfig, QuantConfig};
use serde::{Deserialize, Serialize};
use special::Hyp2F1Method;
use std::path::Path;

use crate::beta_ratio::{PpfMethod, Prior};

/// Everything a query needs besides the table counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Keep the X1/X2 orientation even when X2/X1 integrates better
    #[serde(default)]
    pub no_inverting: bool,

    /// 2F1 provider used by the density
    #[serde(default)]
    pub hyp2f1: Hyp2F1Choice,

    /// Quantile algorithm
    #[serde(default)]
    pub ppf_method: PpfMethod,

    /// Pseudo-counts added to both groups
    #[serde(default)]
    pub prior: Prior,

    /// Simpson quantile integrator
    #[serde(default = "default_quant")]
    pub quant: QuantConfig,

    /// Gauss-Legendre quadrature behind the cdf
    #[serde(default)]
    pub cdf: GaussConfig,

    /// Mode search
    #[serde(default)]
    pub map: MapConfig,

    /// Root finding on the cdf
    #[serde(default)]
    pub optim: OptimConfig,
}

/// How the 2F1 provider is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hyp2F1Choice {
    /// Factored form when the failure shapes allow it, series otherwise
    Auto,
    #[default]
    Series,
    Factored,
}

impl Hyp2F1Choice {
    pub fn resolve(self, b1: f64, b2: f64) -> Hyp2F1Method {
        match self {
            Hyp2F1Choice::Auto => Hyp2F1Method::for_shapes(b1, b2),
            Hyp2F1Choice::Series => Hyp2F1Method::Series,
            Hyp2F1Choice::Factored => Hyp2F1Method::RecursiveFactored,
        }
    }
}

/// Grid search plus Brent refinement for the mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Lower end of the log-spaced starting grid
    #[serde(default = "default_map_low")]
    pub low: f64,

    /// Upper end of the starting grid
    #[serde(default = "default_map_high")]
    pub high: f64,

    /// Grid points
    #[serde(default = "default_map_npts")]
    pub npts: usize,

    /// Brent iteration limit
    #[serde(default = "default_map_itmax")]
    pub itmax: usize,

    /// Relative function convergence tolerance
    #[serde(default = "default_map_eps")]
    pub eps: f64,

    /// X convergence tolerance
    #[serde(default = "default_map_tol")]
    pub tol: f64,
}

/// Root finding on `cdf(x) = q`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimConfig {
    /// Absolute x tolerance of the root
    #[serde(default = "default_xtol")]
    pub xtol: f64,

    /// Root finder iteration limit
    #[serde(default = "default_optim_maxiter")]
    pub maxiter: usize,

    /// How often the initial upper bound of 1 may be doubled
    #[serde(default = "default_max_doublings")]
    pub max_doublings: usize,
}

// Default value functions
fn default_quant() -> QuantConfig {
    QuantConfig {
        max_sum: Some(10.0),
        ..QuantConfig::default()
    }
}
fn default_map_low() -> f64 { 1e-3 }
fn default_map_high() -> f64 { 1e3 }
fn default_map_npts() -> usize { 61 }
fn default_map_itmax() -> usize { 200 }
fn default_map_eps() -> f64 { 1e-12 }
fn default_map_tol() -> f64 { 1e-8 }
fn default_xtol() -> f64 { 2e-12 }
fn default_optim_maxiter() -> usize { 75 }
fn default_max_doublings() -> usize { 64 }

impl Default for Config {
    fn default() -> Self {
        Self {
            no_inverting: false,
            hyp2f1: Hyp2F1Choice::default(),
            ppf_method: PpfMethod::default(),
            prior: Prior::default(),
            quant: default_quant(),
            cdf: GaussConfig::default(),
            map: MapConfig::default(),
            optim: OptimConfig::default(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            low: default_map_low(),
            high: default_map_high(),
            npts: default_map_npts(),
            itmax: default_map_itmax(),
            eps: default_map_eps(),
            tol: default_map_tol(),
        }
    }
}

impl Default for OptimConfig {
    fn default() -> Self {
        Self {
            xtol: default_xtol(),
            maxiter: default_optim_maxiter(),
            max_doublings: default_max_doublings(),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let prior = &self.prior;
        if !(prior.successes >= 0.0 && prior.failures >= 0.0) {
            anyhow::bail!(
                "Prior pseudo-counts must be non-negative, got ({}, {})",
                prior.successes,
                prior.failures
            );
        }

        let quant = &self.quant;
        if !(quant.tolerance > 0.0) {
            anyhow::bail!("quant.tolerance must be positive, got {}", quant.tolerance);
        }
        if !(quant.h_init > 0.0 && quant.h_init < 1.0) {
            anyhow::bail!("quant.h_init must be in range (0, 1), got {}", quant.h_init);
        }
        if let Some(max_sum) = quant.max_sum {
            if !(max_sum > 0.0) {
                anyhow::bail!("quant.max_sum must be positive, got {}", max_sum);
            }
        }
        if quant.max_depth < 3 {
            anyhow::bail!("quant.max_depth must be at least 3, got {}", quant.max_depth);
        }

        if self.cdf.maxiter == 0 {
            anyhow::bail!("cdf.maxiter must be greater than 0");
        }

        let map = &self.map;
        if !(map.low > 0.0 && map.low < map.high) {
            anyhow::bail!(
                "map grid needs 0 < low < high, got low = {}, high = {}",
                map.low,
                map.high
            );
        }
        if map.npts < 2 {
            anyhow::bail!("map.npts must be at least 2");
        }

        if self.optim.maxiter == 0 {
            anyhow::bail!("optim.maxiter must be greater than 0");
        }
        if !(self.optim.xtol > 0.0) {
            anyhow::bail!("optim.xtol must be positive, got {}", self.optim.xtol);
        }

        Ok(())
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
