//! Quantiles by composite Simpson integration over the half line.
//!
//! To find `x` with `∫_origin^x f = q` for a density whose support runs out
//! to `+inf`, the integral is carried to the unit interval with
//! `w = g(t) = origin + t / (1 - t)`, `g'(t) = 1 / (1 - t)^2`, and the
//! transformed integrand `f(g(t)) g'(t)` is summed with Simpson's rule from
//! `t = 0` until the running sum reaches `q`. The grid location where that
//! happens is the quantile at the resolution of the current step.
//!
//! Each refinement pass halves the step. Grid points of earlier passes are
//! kept in [`EvalSet`] levels and reused through [`navigate`], so every grid
//! point is evaluated exactly once over the whole run. The loop stops once
//! successive mass estimates agree to the configured tolerance.
//!
//! If a pass walks the whole grid without collecting `q` the step is too
//! coarse to see where the mass lives, and the integration restarts with a
//! ten times smaller initial step.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, debug_span, warn};

use crate::eval_set::EvalSet;
use crate::indexing::navigate;

/// Tuning knobs for [`simpson_quant_hp`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantConfig {
    /// Relative agreement required between successive mass estimates
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Initial Simpson step in the transformed coordinate, in (0, 1)
    #[serde(default = "default_h_init")]
    pub h_init: f64,

    /// Abort when an accepted mass estimate exceeds this value
    #[serde(default)]
    pub max_sum: Option<f64>,

    /// Missing-mass restarts allowed, each with a tenfold smaller step
    #[serde(default = "default_max_restarts")]
    pub max_restarts: usize,

    /// Refinement passes allowed per attempt
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_tolerance() -> f64 { 5e-4 }
fn default_h_init() -> f64 { 0.005 }
fn default_max_restarts() -> usize { 4 }
fn default_max_depth() -> usize { 16 }

impl Default for QuantConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            h_init: default_h_init(),
            max_sum: None,
            max_restarts: default_max_restarts(),
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantError {
    #[error("accumulated mass {sum} exceeded the ceiling {max_sum}")]
    MaxSumReached { sum: f64, max_sum: f64 },

    #[error("target mass not found after {restarts} restarts (smallest initial step {h_init:e})")]
    RestartsExhausted { restarts: usize, h_init: f64 },

    #[error("no convergence within {passes} refinement passes (last estimate {estimate})")]
    DepthExhausted { passes: usize, estimate: f64 },
}

/// Outcome of one refinement pass, handed to a [`LevelObserver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReport {
    pub depth: usize,
    pub h: f64,
    /// Simpson estimate of the mass up to `t`
    pub sum: f64,
    /// Stopping location in the transformed coordinate
    pub t: f64,
    /// Stopping location in the original coordinate
    pub x: f64,
    /// Function evaluations stored across all levels so far
    pub evaluations: usize,
}

/// Receives progress from one [`simpson_quant_hp_observed`] call.
pub trait LevelObserver {
    fn level(&mut self, report: &LevelReport);

    fn missing_mass(&mut self, _h_init: f64) {}
}

/// Emits refinement progress as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceObserver;

impl LevelObserver for TraceObserver {
    fn level(&mut self, report: &LevelReport) {
        debug!(
            depth = report.depth,
            h = report.h,
            sum = report.sum,
            t = report.t,
            x = report.x,
            evaluations = report.evaluations,
            "refinement level"
        );
    }

    fn missing_mass(&mut self, h_init: f64) {
        warn!(h_init, "missing mass, decreasing initial step");
    }
}

/// Find `x` with `∫_origin^x f = q` for `f` supported on `[origin, inf)`.
///
/// Progress is reported through `tracing` at debug level.
pub fn simpson_quant_hp<F>(f: F, q: f64, origin: f64, config: &QuantConfig) -> Result<f64, QuantError>
where
    F: Fn(f64) -> f64,
{
    simpson_quant_hp_observed(f, q, origin, config, &mut TraceObserver)
}

/// [`simpson_quant_hp`] with an explicit progress observer.
///
/// # Panics
///
/// If `q` is outside (0, 1), `config.h_init` is outside (0, 1), or
/// `config.tolerance` is not positive.
pub fn simpson_quant_hp_observed<F, O>(
    f: F,
    q: f64,
    origin: f64,
    config: &QuantConfig,
    observer: &mut O,
) -> Result<f64, QuantError>
where
    F: Fn(f64) -> f64,
    O: LevelObserver + ?Sized,
{
    assert!(q > 0.0 && q < 1.0, "quantile level must lie in (0, 1), got {q}");
    assert!(
        config.h_init > 0.0 && config.h_init < 1.0,
        "initial step must lie in (0, 1), got {}",
        config.h_init
    );
    assert!(config.tolerance > 0.0, "tolerance must be positive, got {}", config.tolerance);

    let _span = debug_span!("simpson_quant_hp", q, origin).entered();

    let transformed = |t: f64| f(to_half_line(origin, t)) * jacobian(t);

    let mut h_init = config.h_init;
    let mut restarts = 0;
    loop {
        match attempt(&transformed, q, origin, h_init, config, &mut *observer) {
            Ok(t) => return Ok(to_half_line(origin, t)),
            Err(Failure::Quant(err)) => return Err(err),
            Err(Failure::MissingMass) => {
                observer.missing_mass(h_init);
                if restarts == config.max_restarts {
                    return Err(QuantError::RestartsExhausted { restarts, h_init });
                }
                restarts += 1;
                h_init *= 0.1;
            }
        }
    }
}

// ============================================================================
// Half-line transform
// ============================================================================

fn to_half_line(origin: f64, t: f64) -> f64 {
    origin + t / (1.0 - t)
}

fn jacobian(t: f64) -> f64 {
    1.0 / ((1.0 - t) * (1.0 - t))
}

// ============================================================================
// Refinement
// ============================================================================

enum Failure {
    MissingMass,
    Quant(QuantError),
}

/// One full integration from `h_init`, returning the converged location in
/// the transformed coordinate.
fn attempt<G, O>(
    f_: &G,
    q: f64,
    origin: f64,
    h_init: f64,
    config: &QuantConfig,
    observer: &mut O,
) -> Result<f64, Failure>
where
    G: Fn(f64) -> f64,
    O: LevelObserver + ?Sized,
{
    let head = f_(0.0);
    let mut levels: Vec<EvalSet> = Vec::new();
    let mut sums: VecDeque<f64> = VecDeque::with_capacity(3);
    let mut h = h_init;
    let mut t = 0.0;

    while still_converging(&sums, config.tolerance) {
        if levels.len() == config.max_depth {
            return Err(Failure::Quant(QuantError::DepthExhausted {
                passes: config.max_depth,
                estimate: sums.back().copied().unwrap_or(f64::NAN),
            }));
        }

        let (raw, reached) = next_level(f_, head, q, h, &mut levels).ok_or(Failure::MissingMass)?;
        let sum = raw * h / 3.0;
        t = reached;

        observer.level(&LevelReport {
            depth: levels.len() - 1,
            h,
            sum,
            t,
            x: to_half_line(origin, t),
            evaluations: levels.iter().map(EvalSet::len).sum::<usize>() + 1,
        });

        if let Some(max_sum) = config.max_sum {
            if sum > max_sum {
                return Err(Failure::Quant(QuantError::MaxSumReached { sum, max_sum }));
            }
        }

        if sums.len() == 3 {
            sums.pop_front();
        }
        sums.push_back(sum);
        h /= 2.0;
    }

    Ok(t)
}

/// Adds the level for step `h` and walks the Simpson sum until it reaches
/// `q`. Returns the unscaled sum and the stopping location, or `None` when
/// the grid is exhausted first.
fn next_level<G>(f_: &G, head: f64, q: f64, h: f64, levels: &mut Vec<EvalSet>) -> Option<(f64, f64)>
where
    G: Fn(f64) -> f64,
{
    // Simpson's h/3 factor is applied by the caller.
    let stop_at = q * 3.0 / h;
    let mut cur_sum = head;

    // New midpoints sit at odd multiples of h; level 0 holds every multiple.
    let step = if levels.is_empty() { h } else { 2.0 * h };
    levels.push(EvalSet::new(h, step));

    let max_iter = (1.0 / h) as u64;
    for s in navigate(levels.len(), max_iter) {
        let level = &mut levels[s.level];
        let val = level.get(s.inner, f_);
        if s.outer % 2 == 1 {
            cur_sum += 4.0 * val;
        } else {
            if cur_sum + val > stop_at {
                return Some((cur_sum + val, level.x_at(s.inner)));
            }
            cur_sum += 2.0 * val;
        }
    }
    None
}

/// True while both of the last two relative changes exceed `tolerance`.
/// Fewer than three estimates never count as converged.
fn still_converging(sums: &VecDeque<f64>, tolerance: f64) -> bool {
    if sums.len() < 3 {
        return true;
    }
    let not_within_tol = |s1: f64, s2: f64| (1.0 - s1 / s2).abs() > tolerance;
    not_within_tol(sums[2], sums[1]) && not_within_tol(sums[1], sums[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp_density(x: f64) -> f64 {
        (-x).exp()
    }

    #[test]
    fn test_still_converging() {
        let tol = 1e-3;
        assert!(still_converging(&VecDeque::from(vec![0.5, 0.5]), tol));
        assert!(still_converging(&VecDeque::from(vec![0.50, 0.52, 0.51]), tol));
        assert!(!still_converging(&VecDeque::from(vec![0.50, 0.52, 0.5201]), tol));
        assert!(!still_converging(&VecDeque::from(vec![0.52, 0.5201, 0.55]), tol));
    }

    #[test]
    fn test_transform() {
        assert_eq!(to_half_line(0.0, 0.0), 0.0);
        assert_eq!(to_half_line(0.0, 0.5), 1.0);
        assert_eq!(to_half_line(2.0, 0.75), 5.0);
        assert_eq!(jacobian(0.5), 4.0);
    }

    #[test]
    fn test_exponential_median() {
        let config = QuantConfig {
            tolerance: 1e-5,
            h_init: 0.001,
            ..QuantConfig::default()
        };
        let x = simpson_quant_hp(exp_density, 0.5, 0.0, &config).unwrap();
        assert!((x - 2.0_f64.ln()).abs() < 2e-3, "got {x}");
    }

    #[test]
    fn test_origin_shift() {
        let config = QuantConfig {
            tolerance: 1e-5,
            h_init: 0.001,
            ..QuantConfig::default()
        };
        let shifted = |x: f64| exp_density(x - 3.0);
        let x = simpson_quant_hp(shifted, 0.5, 3.0, &config).unwrap();
        assert!((x - 3.0 - 2.0_f64.ln()).abs() < 2e-3, "got {x}");
    }

    #[test]
    fn test_max_sum_reached() {
        let config = QuantConfig {
            max_sum: Some(10.0),
            ..QuantConfig::default()
        };
        let heavy = |x: f64| 1e4 * (-x).exp();
        let err = simpson_quant_hp(heavy, 0.5, 0.0, &config).unwrap_err();
        assert!(matches!(err, QuantError::MaxSumReached { max_sum, .. } if max_sum == 10.0));
    }

    #[test]
    fn test_restarts_exhausted() {
        let config = QuantConfig {
            max_restarts: 2,
            ..QuantConfig::default()
        };
        let err = simpson_quant_hp(|_| 0.0, 0.5, 0.0, &config).unwrap_err();
        match err {
            QuantError::RestartsExhausted { restarts, h_init } => {
                assert_eq!(restarts, 2);
                assert!((h_init - 5e-5).abs() < 1e-12);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_depth_exhausted() {
        let config = QuantConfig {
            max_depth: 2,
            ..QuantConfig::default()
        };
        let err = simpson_quant_hp(exp_density, 0.5, 0.0, &config).unwrap_err();
        assert!(matches!(err, QuantError::DepthExhausted { passes: 2, .. }));
    }

    #[test]
    #[should_panic(expected = "quantile level")]
    fn test_rejects_q_outside_unit_interval() {
        let _ = simpson_quant_hp(exp_density, 1.0, 0.0, &QuantConfig::default());
    }

    #[test]
    #[should_panic(expected = "initial step")]
    fn test_rejects_bad_step() {
        let config = QuantConfig {
            h_init: 0.0,
            ..QuantConfig::default()
        };
        let _ = simpson_quant_hp(exp_density, 0.5, 0.0, &config);
    }
}
