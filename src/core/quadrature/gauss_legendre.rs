use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::warn;

// ============================================================================
// Fixed-tolerance Gauss-Legendre quadrature
// ============================================================================

/// Stopping rule for [`gauss_quadrature`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussConfig {
    /// Absolute change between successive orders accepted as converged
    #[serde(default = "default_tol")]
    pub tol: f64,

    /// Relative change between successive orders accepted as converged
    #[serde(default = "default_rtol")]
    pub rtol: f64,

    /// Highest rule order tried
    #[serde(default = "default_maxiter")]
    pub maxiter: usize,
}

fn default_tol() -> f64 { 1.49e-8 }
fn default_rtol() -> f64 { 1.49e-8 }
fn default_maxiter() -> usize { 50 }

impl Default for GaussConfig {
    fn default() -> Self {
        Self {
            tol: default_tol(),
            rtol: default_rtol(),
            maxiter: default_maxiter(),
        }
    }
}

/// Integrate `f` over `[lower, upper]` with Gauss-Legendre rules of order
/// 1, 2, 3, ... until two successive orders agree.
///
/// If `maxiter` is reached first, the last estimate is returned and a
/// warning is logged.
pub fn gauss_quadrature<F>(f: F, lower: f64, upper: f64, config: &GaussConfig) -> f64
where
    F: Fn(f64) -> f64,
{
    if lower == upper {
        return 0.0;
    }

    let half = 0.5 * (upper - lower);
    let mid = 0.5 * (upper + lower);
    let fixed = |n: usize| -> f64 {
        legendre_rule(n)
            .into_iter()
            .map(|(x, w)| w * f(mid + half * x))
            .sum::<f64>()
            * half
    };

    let mut value = f64::INFINITY;
    let mut err = f64::INFINITY;
    for n in 1..=config.maxiter {
        let next = fixed(n);
        err = (next - value).abs();
        value = next;
        if err < config.tol || err < config.rtol * value.abs() {
            return value;
        }
    }

    warn!(
        maxiter = config.maxiter,
        err, lower, upper, "gaussian quadrature did not converge"
    );
    value
}

/// Nodes and weights of the `n`-point Gauss-Legendre rule on [-1, 1].
pub fn legendre_rule(n: usize) -> Vec<(f64, f64)> {
    let mut rule = Vec::with_capacity(n);
    for i in 0..n {
        // Tricomi's estimate of the i-th root, then Newton.
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre(n, x);
        rule.push((x, 2.0 / ((1.0 - x * x) * dp * dp)));
    }
    rule
}

/// `(P_n(x), P_n'(x))` by the three-term recurrence.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    let mut p0 = 1.0;
    let mut p1 = x;
    for k in 2..=n {
        let k = k as f64;
        let p2 = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
        p0 = p1;
        p1 = p2;
    }
    let dp = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}
