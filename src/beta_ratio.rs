use std::fmt;

use estimators::{RootError, brent_root, brentmax, glob_max};
use quadrature::{GaussConfig, QuantConfig, QuantError, gauss_quadrature, simpson_quant_hp};
use serde::{Deserialize, Serialize};
use special::{Hyp2F1, Hyp2F1Method, ln_beta};
use tracing::{debug, info, warn};

use crate::config::{Config, MapConfig, OptimConfig};
use crate::error::RatioError;

// ============================================================================
// Prior
// ============================================================================

/// Beta prior pseudo-counts added to the successes and failures of both groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prior {
    pub successes: f64,
    pub failures: f64,
}

impl Prior {
    /// Beta(1, 1)
    pub const UNIFORM: Prior = Prior::new(1.0, 1.0);
    /// Beta(1/2, 1/2)
    pub const JEFFREYS: Prior = Prior::new(0.5, 0.5);
    /// Beta(1/2, 1): failures believed more likely than successes
    pub const RARE: Prior = Prior::new(0.5, 1.0);
    /// No pseudo-counts
    pub const NONE: Prior = Prior::new(0.0, 0.0);

    pub const fn new(successes: f64, failures: f64) -> Self {
        Self { successes, failures }
    }
}

impl Default for Prior {
    fn default() -> Self {
        Prior::UNIFORM
    }
}

// ============================================================================
// Quantile result
// ============================================================================

/// A quantile, or the explicit absence of one when the integrated mass
/// blew past its ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ppf {
    Value(f64),
    Unavailable,
}

impl Ppf {
    pub fn value(self) -> Option<f64> {
        match self {
            Ppf::Value(x) => Some(x),
            Ppf::Unavailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Ppf::Value(_))
    }

    fn recip(self) -> Ppf {
        match self {
            Ppf::Value(x) => Ppf::Value(1.0 / x),
            Ppf::Unavailable => Ppf::Unavailable,
        }
    }
}

impl fmt::Display for Ppf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ppf::Value(x) => write!(f, "{x}"),
            Ppf::Unavailable => write!(f, "NA"),
        }
    }
}

/// Quantile algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PpfMethod {
    /// Adaptive half-line Simpson integration
    #[default]
    Simpson,
    /// Brent root of `cdf(x) - q`
    Optim,
}

// ============================================================================
// Beta ratio distribution
// ============================================================================

/// Distribution of `X1 / X2` with `X1 ~ Beta(a1, b1)` and `X2 ~ Beta(a2, b2)`
/// independent.
///
/// The normalising Beta functions are computed once at construction, as logs
/// so that large tables do not underflow. When the table makes X1 the more
/// successful group, most of the mass of `X1 / X2` sits above 1 where the
/// half-line transform samples coarsely; quantiles are then taken from the
/// reciprocal `X2 / X1`, held in `inverted`.
#[derive(Debug, Clone, PartialEq)]
pub struct BetaRatio {
    a1: f64,
    a2: f64,
    b1: f64,
    b2: f64,
    inverted: Option<Box<BetaRatio>>,
    /// ln(Blt / A) with A = B(a1, b1) B(a2, b2), Blt = B(a1 + a2, b2)
    ln_lt_scale: f64,
    /// ln(Bgt / A) with Bgt = B(a1 + a2, b1)
    ln_gt_scale: f64,
    hyp2f1: Hyp2F1Method,
}

impl BetaRatio {
    /// Build the ratio for successes `a1, a2` and failures `b1, b2` of the
    /// two groups, with `prior` added to each.
    ///
    /// The orientation is decided on the raw counts: if `a1 b2 > a2 b1` and
    /// `no_inverting` is not set, a child over `(a2, a1, b2, b1)` with no
    /// further prior is kept for quantile computations.
    pub fn new(a1: f64, a2: f64, b1: f64, b2: f64, no_inverting: bool, prior: Prior) -> Self {
        let (pa1, pa2) = (a1 + prior.successes, a2 + prior.successes);
        let (pb1, pb2) = (b1 + prior.failures, b2 + prior.failures);

        let inverted = if a1 * b2 > a2 * b1 && !no_inverting {
            info!(a1, a2, b1, b2, "inverting orientation for quantiles");
            Some(Box::new(BetaRatio::new(pa2, pa1, pb2, pb1, true, Prior::NONE)))
        } else {
            None
        };

        let ln_norm = ln_beta(pa1, pb1) + ln_beta(pa2, pb2);
        Self {
            a1: pa1,
            a2: pa2,
            b1: pb1,
            b2: pb2,
            inverted,
            ln_lt_scale: ln_beta(pa1 + pa2, pb2) - ln_norm,
            ln_gt_scale: ln_beta(pa1 + pa2, pb1) - ln_norm,
            hyp2f1: Hyp2F1Method::Series,
        }
    }

    /// Build from table counts with the prior, orientation and 2F1 settings
    /// of `config`.
    pub fn from_config(a1: f64, a2: f64, b1: f64, b2: f64, config: &Config) -> Result<Self, RatioError> {
        let ratio = Self::new(a1, a2, b1, b2, config.no_inverting, config.prior);
        let method = config.hyp2f1.resolve(ratio.b1, ratio.b2);
        ratio.with_hyp2f1(method)
    }

    /// Select the 2F1 provider used by [`pdf`](Self::pdf), here and in the
    /// inverted child.
    pub fn with_hyp2f1(mut self, method: Hyp2F1Method) -> Result<Self, RatioError> {
        if method == Hyp2F1Method::RecursiveFactored
            && Hyp2F1Method::for_shapes(self.b1, self.b2) != Hyp2F1Method::RecursiveFactored
        {
            return Err(RatioError::FactoredNeedsIntegerShapes {
                b1: self.b1,
                b2: self.b2,
            });
        }
        self.hyp2f1 = method;
        if let Some(child) = self.inverted.as_mut() {
            child.hyp2f1 = method;
        }
        Ok(self)
    }

    pub fn a1(&self) -> f64 {
        self.a1
    }

    pub fn a2(&self) -> f64 {
        self.a2
    }

    pub fn b1(&self) -> f64 {
        self.b1
    }

    pub fn b2(&self) -> f64 {
        self.b2
    }

    /// The `X2 / X1` child used for quantiles, if the orientation was flipped.
    pub fn inverted(&self) -> Option<&BetaRatio> {
        self.inverted.as_deref()
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted.is_some()
    }

    pub fn hyp2f1_method(&self) -> Hyp2F1Method {
        self.hyp2f1
    }

    // ------------------------------------------------------------------------
    // Density
    // ------------------------------------------------------------------------

    /// Density at `w`; zero for `w <= 0`.
    pub fn pdf(&self, w: f64) -> f64 {
        self.pdf_with(w, &self.hyp2f1)
    }

    /// Density at `w` evaluated with an explicit 2F1 provider.
    pub fn pdf_with<H>(&self, w: f64, hyp: &H) -> f64
    where
        H: Hyp2F1 + ?Sized,
    {
        let s = self.a1 + self.a2;
        if w <= 0.0 {
            0.0
        } else if w <= 1.0 {
            // Blt w^(a1-1) 2F1(a1+a2, 1-b1; a1+a2+b2; w) / A
            let scale = (self.ln_lt_scale + (self.a1 - 1.0) * w.ln()).exp();
            scale * hyp.hyp2f1(s, 1.0 - self.b1, s + self.b2, w)
        } else {
            // Bgt w^(-1-a2) 2F1(a1+a2, 1-b2; a1+a2+b1; 1/w) / A
            let scale = (self.ln_gt_scale - (1.0 + self.a2) * w.ln()).exp();
            scale * hyp.hyp2f1(s, 1.0 - self.b2, s + self.b1, 1.0 / w)
        }
    }

    /// Density of `ln(X1 / X2)` at `t`.
    pub fn lt_pdf(&self, t: f64) -> f64 {
        t.exp() * self.pdf(t.exp())
    }

    // ------------------------------------------------------------------------
    // Distribution function
    // ------------------------------------------------------------------------

    pub fn cdf(&self, w: f64) -> f64 {
        self.cdf_with_config(w, &GaussConfig::default())
    }

    /// `P(X1 / X2 <= w)` by Gauss-Legendre quadrature.
    ///
    /// The integral is split at 1 where the density changes branch. The
    /// part above 1 is integrated in `u = 1 / w`, where the integrand is the
    /// density of the reciprocal and stays bounded out to `w = inf`.
    pub fn cdf_with_config(&self, w: f64, config: &GaussConfig) -> f64 {
        if !(w > 0.0) {
            return 0.0;
        }
        let below = gauss_quadrature(|x| self.pdf(x), 0.0, w.min(1.0), config);
        if w <= 1.0 {
            return below;
        }
        let above = gauss_quadrature(|u: f64| self.pdf(1.0 / u) / (u * u), 1.0 / w, 1.0, config);
        below + above
    }

    // ------------------------------------------------------------------------
    // Mode
    // ------------------------------------------------------------------------

    pub fn map(&self) -> f64 {
        self.map_with_config(&MapConfig::default())
    }

    /// Mode of the density: log-spaced grid search, then Brent.
    pub fn map_with_config(&self, config: &MapConfig) -> f64 {
        let pdf = |w: f64| self.pdf(w);
        let bracket = glob_max(config.low, config.high, config.npts, true, pdf);
        let max = brentmax(config.itmax, config.eps, config.tol, pdf, &bracket);
        debug!(map = max.x, density = max.y, "mode found");
        max.x
    }

    pub fn lt_map(&self) -> f64 {
        self.lt_map_with_config(&MapConfig::default())
    }

    /// `exp` of the mode of [`lt_pdf`](Self::lt_pdf). Treats ratios below
    /// and above 1 symmetrically.
    pub fn lt_map_with_config(&self, config: &MapConfig) -> f64 {
        let lt_pdf = |t: f64| self.lt_pdf(t);
        let bracket = glob_max(config.low.ln(), config.high.ln(), config.npts, false, lt_pdf);
        let max = brentmax(config.itmax, config.eps, config.tol, lt_pdf, &bracket);
        debug!(lt_map = max.x, density = max.y, "log mode found");
        max.x.exp()
    }

    // ------------------------------------------------------------------------
    // Quantiles
    // ------------------------------------------------------------------------

    /// Quantile at level `q` with the selected algorithm.
    pub fn ppf(&self, q: f64, method: PpfMethod, config: &Config) -> Result<Ppf, RatioError> {
        match method {
            PpfMethod::Simpson => self.simpson_ppf(q, &config.quant),
            PpfMethod::Optim => self.optim_ppf(q, &config.optim, &config.cdf).map(Ppf::Value),
        }
    }

    /// Quantile by the adaptive half-line Simpson integrator.
    ///
    /// With a flipped orientation this is `1 / child.simpson_ppf(1 - q)`.
    /// A mass estimate above `config.max_sum` yields [`Ppf::Unavailable`].
    pub fn simpson_ppf(&self, q: f64, config: &QuantConfig) -> Result<Ppf, RatioError> {
        if let Some(child) = self.inverted.as_deref() {
            return Ok(child.simpson_ppf(1.0 - q, config)?.recip());
        }

        match simpson_quant_hp(|w| self.pdf(w), q, 0.0, config) {
            Ok(x) => Ok(Ppf::Value(x)),
            Err(QuantError::MaxSumReached { sum, max_sum }) => {
                warn!(ratio = %self, q, sum, max_sum, "quantile unavailable");
                Ok(Ppf::Unavailable)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Quantile by solving `cdf(x) = q` with Brent's method.
    ///
    /// The bracket `[0, b]` starts at `b = 1` and doubles `b` until
    /// `cdf(b) > q`.
    pub fn optim_ppf(
        &self,
        q: f64,
        config: &OptimConfig,
        gauss: &GaussConfig,
    ) -> Result<f64, RatioError> {
        assert!(q > 0.0 && q < 1.0, "quantile level must lie in (0, 1), got {q}");

        let cdf = |x: f64| self.cdf_with_config(x, gauss);

        let mut upper = 1.0;
        let mut doublings = 0;
        // NaN keeps the search going
        while !(cdf(upper) > q) {
            if doublings == config.max_doublings {
                return Err(RatioError::NoBracket { q, upper, doublings });
            }
            upper *= 2.0;
            doublings += 1;
        }
        debug!(upper, doublings, "cdf bracket found");

        brent_root(|x| cdf(x) - q, 0.0, upper, config.xtol, config.maxiter).map_err(|err| match err {
            RootError::NotBracketed { upper, .. } => RatioError::NoBracket { q, upper, doublings },
            RootError::MaxIterations { maxiter, estimate } => {
                RatioError::RootNotFound { q, maxiter, estimate }
            }
        })
    }
}

impl fmt::Display for BetaRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BetaRatio({}, {}, {}, {})", self.a1, self.a2, self.b1, self.b2)?;
        if self.is_inverted() {
            write!(f, "<inv>")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use special::RecursiveFactored;

    #[test]
    fn test_prior_is_added() {
        let br = BetaRatio::new(5.0, 5.0, 10.0, 10.0, false, Prior::UNIFORM);
        assert_eq!((br.a1(), br.a2(), br.b1(), br.b2()), (6.0, 6.0, 11.0, 11.0));
        assert!(!br.is_inverted());

        let br = BetaRatio::new(5.0, 5.0, 10.0, 10.0, false, Prior::RARE);
        assert_eq!((br.a1(), br.b1()), (5.5, 11.0));
    }

    #[test]
    fn test_inverted_child() {
        let br = BetaRatio::new(10.0, 5.0, 40.0, 45.0, false, Prior::NONE);
        let child = br.inverted().unwrap();
        assert_eq!(
            (child.a1(), child.a2(), child.b1(), child.b2()),
            (5.0, 10.0, 45.0, 40.0)
        );
        assert!(!child.is_inverted());

        let unflipped = BetaRatio::new(10.0, 5.0, 40.0, 45.0, true, Prior::NONE);
        assert!(!unflipped.is_inverted());
    }

    #[test]
    fn test_orientation_uses_raw_counts() {
        // 1 * 1 > 0 * 5 flips, although 2 * 2 < 1 * 6 after the prior
        let br = BetaRatio::new(1.0, 0.0, 5.0, 1.0, false, Prior::UNIFORM);
        assert!(br.is_inverted());
        let child = br.inverted().unwrap();
        assert_eq!((child.a1(), child.a2(), child.b1(), child.b2()), (1.0, 2.0, 2.0, 6.0));
    }

    #[test]
    fn test_uniform_shapes_density() {
        // Ratio of two uniforms: 1/2 below 1, 1 / (2 w^2) above
        let br = BetaRatio::new(1.0, 1.0, 1.0, 1.0, false, Prior::NONE);
        assert!((br.pdf(0.3) - 0.5).abs() < 1e-14);
        assert!((br.pdf(1.0) - 0.5).abs() < 1e-14);
        assert!((br.pdf(4.0) - 1.0 / 32.0).abs() < 1e-14);
        assert_eq!(br.pdf(0.0), 0.0);
    }

    #[test]
    fn test_pdf_at_zero() {
        let br = BetaRatio::new(1.0, 3.0, 5.0, 7.0, false, Prior::UNIFORM);
        assert_eq!(br.pdf(0.0), 0.0);
    }

    #[test]
    fn test_zero_counts_without_prior() {
        let br = BetaRatio::new(0.0, 0.0, 0.0, 0.0, false, Prior::NONE);
        let _ = br.pdf(0.5);
        assert_eq!(br.pdf(0.0), 0.0);
    }

    #[test]
    fn test_large_table_density_is_finite() {
        // B(a1 + a2, b2) and B(a1 + a2, b1) underflow to zero here
        let br = BetaRatio::new(400.0, 380.0, 600.0, 620.0, true, Prior::UNIFORM);
        for &w in &[0.9, 1.0, 1.05, 1.2] {
            let density = br.pdf(w);
            assert!(density.is_finite() && density > 0.0, "pdf({w}) = {density}");
        }
    }

    #[test]
    fn test_providers_give_same_density() {
        let br = BetaRatio::new(3.0, 7.0, 12.0, 9.0, false, Prior::UNIFORM);
        for &w in &[0.1, 0.5, 0.99, 1.0, 1.7, 6.0] {
            let series = br.pdf(w);
            let factored = br.pdf_with(w, &RecursiveFactored);
            assert!((series - factored).abs() <= 1e-8 * series.abs(), "w={w}");
        }

        // Tens of failures: the plain power forms cancel near w = 1
        let br = BetaRatio::new(20.0, 18.0, 60.0, 62.0, true, Prior::UNIFORM);
        for &w in &[0.9, 0.97, 1.0, 1.1] {
            let series = br.pdf(w);
            let factored = br.pdf_with(w, &RecursiveFactored);
            assert!(series > 0.5 && series < 3.0, "pdf({w}) = {series}");
            assert!((series - factored).abs() <= 1e-10 * series, "w={w}: {series} vs {factored}");
        }
    }

    #[test]
    fn test_factored_requires_integer_failures() {
        let br = BetaRatio::new(3.0, 7.0, 12.0, 9.0, false, Prior::JEFFREYS);
        let err = br.with_hyp2f1(Hyp2F1Method::RecursiveFactored).unwrap_err();
        assert!(matches!(err, RatioError::FactoredNeedsIntegerShapes { .. }));

        let br = BetaRatio::new(7.0, 3.0, 9.0, 12.0, false, Prior::UNIFORM)
            .with_hyp2f1(Hyp2F1Method::RecursiveFactored)
            .unwrap();
        assert_eq!(br.inverted().unwrap().hyp2f1_method(), Hyp2F1Method::RecursiveFactored);
    }

    #[test]
    fn test_uniform_cdf() {
        let br = BetaRatio::new(1.0, 1.0, 1.0, 1.0, false, Prior::NONE);
        assert!((br.cdf(0.5) - 0.25).abs() < 1e-12);
        assert!((br.cdf(1.0) - 0.5).abs() < 1e-12);
        // 1 - 1 / (2 w)
        assert!((br.cdf(4.0) - 0.875).abs() < 1e-12);
        assert!((br.cdf(f64::INFINITY) - 1.0).abs() < 1e-12);
        assert_eq!(br.cdf(0.0), 0.0);
    }

    #[test]
    fn test_display() {
        let br = BetaRatio::new(10.0, 5.0, 40.0, 45.0, false, Prior::NONE);
        assert_eq!(br.to_string(), "BetaRatio(10, 5, 40, 45)<inv>");
        assert_eq!(br.inverted().unwrap().to_string(), "BetaRatio(5, 10, 45, 40)");
        assert_eq!(Ppf::Unavailable.to_string(), "NA");
        assert_eq!(Ppf::Value(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_unavailable_is_propagated_through_inversion() {
        assert_eq!(Ppf::Unavailable.recip(), Ppf::Unavailable);
        assert_eq!(Ppf::Value(4.0).recip(), Ppf::Value(0.25));
    }
}
