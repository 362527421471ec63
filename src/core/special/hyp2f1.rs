//! Gaussian hypergeometric function 2F1(a, b; c; z) for real arguments.
//!
//! Two providers implement [`Hyp2F1`]:
//!
//! * [`GaussSeries`] - the general function. On `0 < z < 1` with `c`, `c - a`
//!   and `c - b` positive it sums the Euler-transformed series, whose terms
//!   are all positive, and switches to a `1 - z` connection formula close to
//!   `z = 1`. Negative `z` goes through the Pfaff transform.
//! * [`RecursiveFactored`] - the finitely terminating series in nested
//!   (recursively factored) form, valid only when `b` is a non-positive
//!   integer. For the Beta ratio density this is the case whenever the
//!   failure shapes are integers.

use serde::{Deserialize, Serialize};
use statrs::function::gamma::{digamma, ln_gamma};

use crate::gamma::{gamma_ratio, ln_gamma_signed};

/// Evaluates 2F1(a, b; c; z).
pub trait Hyp2F1 {
    fn hyp2f1(&self, a: f64, b: f64, c: f64, z: f64) -> f64;
}

const MAX_TERMS: usize = 100_000;
const SERIES_EPS: f64 = 1e-16;

/// Beyond this |z| the plain series is replaced by a transformation.
const DIRECT_LIMIT: f64 = 0.75;

/// Distance from an integer below which `c - a - b` is treated as integral.
const INTEGER_GAP: f64 = 1e-9;

/// Two-series connection is only used this far from an integral `c - a - b`.
const FRACTION_GAP: f64 = 0.05;

/// Euler series length above which a `1 - z` expansion is tried first.
const EULER_BUDGET: f64 = 200_000.0;

/// Hard cap on Euler series terms.
const MAX_EULER_TERMS: usize = 50_000_000;

/// Largest term ratio allowed in a `1 - z` expansion.
const CONNECTION_RATIO: f64 = 0.25;

// ============================================================================
// General series provider
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct GaussSeries;

impl Hyp2F1 for GaussSeries {
    fn hyp2f1(&self, a: f64, b: f64, c: f64, z: f64) -> f64 {
        if z == 0.0 {
            return 1.0;
        }

        // (order, the other upper parameter)
        let terminating = match (terminating_order(a), terminating_order(b)) {
            (Some(m), Some(n)) if m <= n => Some((m, b)),
            (Some(_), Some(n)) => Some((n, a)),
            (Some(m), None) => Some((m, b)),
            (None, Some(n)) => Some((n, a)),
            (None, None) => None,
        };
        if let Some((n, other)) = terminating {
            if z > 0.0 && z <= 1.0 && c > 0.0 && c - other > 0.0 {
                return bernstein(other, c, z, n);
            }
            return polynomial(a, b, c, z, n);
        }

        if z < 0.0 {
            // Pfaff: 2F1(a, b; c; z) = (1 - z)^-a 2F1(a, c - b; c; z / (z - 1))
            return (1.0 - z).powf(-a) * self.hyp2f1(a, c - b, c, z / (z - 1.0));
        }
        if z > 1.0 {
            // Branch cut: no real value.
            return f64::NAN;
        }
        if z == 1.0 {
            return gauss_sum(a, b, c);
        }
        if c > 0.0 && c - a > 0.0 && c - b > 0.0 {
            return positive_parameters(a, b, c, z);
        }

        if z < DIRECT_LIMIT {
            return series(a, b, c, z);
        }
        let s = c - a - b;
        if (s - s.round()).abs() > INTEGER_GAP {
            connection_one_minus_z(a, b, c, z)
        } else {
            series(a, b, c, z)
        }
    }
}

/// `Some(n)` when `x == -n` for a non-negative integer `n`.
fn terminating_order(x: f64) -> Option<usize> {
    (x <= 0.0 && x == x.round()).then(|| (-x) as usize)
}

/// Terms 0..=n of the series; exact when one upper parameter is `-n`.
fn polynomial(a: f64, b: f64, c: f64, z: f64, n: usize) -> f64 {
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 0..n {
        let k = k as f64;
        term *= (a + k) * (b + k) / ((c + k) * (k + 1.0)) * z;
        sum += term;
    }
    sum
}

/// 2F1(a, -n; c; z) on `0 < z <= 1` after the Pfaff transform:
///
/// sum_k (c-a)_k / (c)_k  C(n, k)  z^k (1-z)^(n-k)
///
/// Every term is positive when `c - a > 0` and `c > 0`, where the power
/// form alternates and loses most of its digits as `z` approaches 1.
fn bernstein(a: f64, c: f64, z: f64, n: usize) -> f64 {
    let d = c - a;
    let nf = n as f64;
    // Coefficient ratio C_{k+1} / C_k
    let step = |k: f64| (d + k) * (nf - k) / ((c + k) * (k + 1.0));

    // Start from the larger end so the first term cannot underflow.
    if z <= 0.5 {
        let ratio = z / (1.0 - z);
        let mut term = (1.0 - z).powi(n as i32);
        let mut sum = term;
        for k in 0..n {
            term *= step(k as f64) * ratio;
            sum += term;
        }
        sum
    } else {
        let ratio = (1.0 - z) / z;
        let mut term = (0..n)
            .map(|k| (d + k as f64) / (c + k as f64))
            .product::<f64>()
            * z.powi(n as i32);
        let mut sum = term;
        for k in (0..n).rev() {
            term *= ratio / step(k as f64);
            sum += term;
        }
        sum
    }
}

fn series(a: f64, b: f64, c: f64, z: f64) -> f64 {
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut quiet = 0;
    for k in 0..MAX_TERMS {
        let k = k as f64;
        term *= (a + k) * (b + k) / ((c + k) * (k + 1.0)) * z;
        sum += term;
        if term.abs() <= SERIES_EPS * sum.abs() {
            // Two small terms in a row: a lone tiny term can be a sign change.
            quiet += 1;
            if quiet == 2 {
                break;
            }
        } else {
            quiet = 0;
        }
    }
    sum
}

/// 0 < z < 1 with `c`, `c - a` and `c - b` positive.
///
/// The Euler series has no sign changes but needs about `(c - a - b) / (1 - z)`
/// terms; close to 1 an expansion in `1 - z` is used when its terms shrink
/// fast enough.
fn positive_parameters(a: f64, b: f64, c: f64, z: f64) -> f64 {
    let m = c - a - b;
    let delta = 1.0 - z;

    if (m.max(0.0) + 40.0) / delta > EULER_BUDGET {
        let nearest = m.round();
        let gap = (m - nearest).abs();
        let width = (a.abs() + m.abs() + 1.0) * (b.abs() + m.abs() + 1.0) * delta;
        if gap <= INTEGER_GAP && nearest >= 0.0 {
            if width / (nearest - 1.0).max(1.0) <= CONNECTION_RATIO {
                return log_connection(a, b, c, nearest as usize, delta);
            }
        } else if gap >= FRACTION_GAP && width / gap <= CONNECTION_RATIO {
            return connection_one_minus_z(a, b, c, z);
        }
    }
    euler(a, b, c, z)
}

/// Euler: 2F1(a, b; c; z) = (1 - z)^(c-a-b) 2F1(c - a, c - b; c; z).
///
/// Summed with a running log scale since the series grows like
/// `(1 - z)^(a+b-c)`.
fn euler(a: f64, b: f64, c: f64, z: f64) -> f64 {
    const RESCALE: f64 = 1e200;
    let (p, q) = (c - a, c - b);

    let mut term = 1.0;
    let mut sum = 1.0;
    let mut ln_scale = 0.0;
    for k in 0..MAX_EULER_TERMS {
        let k = k as f64;
        let ratio = (p + k) * (q + k) / ((c + k) * (k + 1.0)) * z;
        term *= ratio;
        sum += term;
        if sum > RESCALE {
            term /= RESCALE;
            sum /= RESCALE;
            ln_scale += RESCALE.ln();
        }
        // Tail bounded by a geometric series once the ratio drops below 1.
        if ratio < 1.0 && term <= SERIES_EPS * sum * (1.0 - ratio) {
            break;
        }
    }
    (ln_scale + sum.ln() + (c - a - b) * (1.0 - z).ln()).exp()
}

/// 2F1 in powers of `delta = 1 - z` when `c - a - b = m` is a non-negative
/// integer and the two-series formula degenerates (DLMF 15.8.10):
///
/// Γ(c)Γ(m)/(Γ(c-a)Γ(c-b)) Σ_{k<m} (a)_k (b)_k (m-k-1)! / (k! (m-1)!) (-delta)^k
/// - Γ(c)/(Γ(a)Γ(b)) (-delta)^m Σ_k (a+m)_k (b+m)_k / (k! (k+m)!) delta^k L_k
///
/// with L_k = ln(delta) - ψ(k+1) - ψ(k+m+1) + ψ(a+k+m) + ψ(b+k+m).
fn log_connection(a: f64, b: f64, c: f64, m: usize, delta: f64) -> f64 {
    let mf = m as f64;

    let mut finite = 0.0;
    if m > 0 {
        let mut term = 1.0;
        let mut sum = 1.0;
        for k in 0..m - 1 {
            let k = k as f64;
            term *= -(a + k) * (b + k) / ((k + 1.0) * (mf - k - 1.0)) * delta;
            sum += term;
        }
        finite = gamma_ratio(&[c, mf], &[c - a, c - b]) * sum;
    }

    let (ln_c, _) = ln_gamma_signed(c);
    let (ln_a, sign_a) = ln_gamma_signed(a);
    let (ln_b, sign_b) = ln_gamma_signed(b);
    let parity = if m % 2 == 0 { 1.0 } else { -1.0 };
    let scale = parity
        * sign_a
        * sign_b
        * (mf * delta.ln() + ln_c - ln_a - ln_b - ln_gamma(mf + 1.0)).exp();
    if scale == 0.0 {
        return finite;
    }

    let mut term = 1.0;
    let mut log_term =
        delta.ln() - digamma(1.0) - digamma(mf + 1.0) + digamma(a + mf) + digamma(b + mf);
    let mut sum = log_term;
    let mut quiet = 0;
    for k in 0..MAX_TERMS {
        let k = k as f64;
        term *= (a + mf + k) * (b + mf + k) / ((k + 1.0) * (k + mf + 1.0)) * delta;
        log_term += 1.0 / (a + mf + k) + 1.0 / (b + mf + k)
            - 1.0 / (k + 1.0)
            - 1.0 / (k + mf + 1.0);
        let next = term * log_term;
        sum += next;
        if next.abs() <= SERIES_EPS * sum.abs() {
            quiet += 1;
            if quiet == 2 {
                break;
            }
        } else {
            quiet = 0;
        }
    }
    finite - scale * sum
}

/// Gauss's theorem: 2F1(a, b; c; 1) = Γ(c)Γ(c-a-b) / (Γ(c-a)Γ(c-b)).
fn gauss_sum(a: f64, b: f64, c: f64) -> f64 {
    if c - a - b <= 0.0 {
        return f64::INFINITY;
    }
    gamma_ratio(&[c, c - a - b], &[c - a, c - b])
}

/// 2F1 expressed through two series in `1 - z` (Abramowitz & Stegun 15.3.6).
fn connection_one_minus_z(a: f64, b: f64, c: f64, z: f64) -> f64 {
    let w = 1.0 - z;
    let s = c - a - b;

    let g1 = gamma_ratio(&[c, s], &[c - a, c - b]);
    let g2 = gamma_ratio(&[c, -s], &[a, b]);

    let mut value = 0.0;
    if g1 != 0.0 {
        value += g1 * series(a, b, 1.0 - s, w);
    }
    if g2 != 0.0 {
        value += g2 * w.powf(s) * series(c - a, c - b, 1.0 + s, w);
    }
    value
}

// ============================================================================
// Recursively factored provider
// ============================================================================

/// Terminating 2F1 for `b = -n`, evaluated innermost-first.
///
/// On `0 < z <= 1` (with `c` and `c - a` positive) the nesting runs over the
/// Pfaff-transformed sum `Σ_k (c-a)_k/(c)_k C(n, k) z^k (1-z)^(n-k)`:
///
/// U_n = 1,  U_k = (1-z)^(n-k) + z (c-a+k)(n-k) / ((c+k)(k+1)) U_{k+1}
///
/// and 2F1 = U_0. Every step adds positive quantities, so no digits are lost
/// to cancellation near `z = 1`. Elsewhere the plain power form is nested:
///
/// 1 + (a)(b)z/(1·c) (1 + (a+1)(b+1)z/(2·(c+1)) (1 + ...))
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursiveFactored;

impl Hyp2F1 for RecursiveFactored {
    fn hyp2f1(&self, a: f64, b: f64, c: f64, z: f64) -> f64 {
        let n = terminating_order(b).unwrap_or_else(|| {
            panic!("recursively factored 2F1 needs a non-positive integer b, got {b}")
        });

        if z > 0.0 && z <= 1.0 && c > 0.0 && c - a > 0.0 {
            let d = c - a;
            let nf = n as f64;
            let mut result = 1.0;
            let mut tail = 1.0;
            for i in (0..n).rev() {
                let k = i as f64;
                tail *= 1.0 - z;
                result = tail + z * (d + k) * (nf - k) / ((c + k) * (k + 1.0)) * result;
            }
            return result;
        }

        let mut result = 1.0;
        for i in (0..n).rev() {
            let k = i as f64;
            result = 1.0 + result * z * (a + k) * (b + k) / ((k + 1.0) * (c + k));
        }
        result
    }
}

// ============================================================================
// Provider selection
// ============================================================================

/// Caller-selected 2F1 implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hyp2F1Method {
    #[default]
    Series,
    RecursiveFactored,
}

impl Hyp2F1Method {
    /// The density calls 2F1 with `b = 1 - b1` and `b = 1 - b2`; the
    /// factored form applies when both failure shapes are integers >= 1.
    pub fn for_shapes(b1: f64, b2: f64) -> Self {
        let integral = |x: f64| x >= 1.0 && x == x.round();
        if integral(b1) && integral(b2) {
            Hyp2F1Method::RecursiveFactored
        } else {
            Hyp2F1Method::Series
        }
    }
}

impl Hyp2F1 for Hyp2F1Method {
    fn hyp2f1(&self, a: f64, b: f64, c: f64, z: f64) -> f64 {
        match self {
            Hyp2F1Method::Series => GaussSeries.hyp2f1(a, b, c, z),
            Hyp2F1Method::RecursiveFactored => RecursiveFactored.hyp2f1(a, b, c, z),
        }
    }
}
