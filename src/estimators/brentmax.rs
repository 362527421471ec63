/******************************************************************************/
/*                                                                            */
/*  BRENTMAX - Use Brent's method to find a local maximum of a                */
/*             univariate function.                                           */
/*                                                                            */
/*  This is given a bracket whose center has greater function value than      */
/*  its neighbors, typically the output of glob_max.  Parabolic steps are     */
/*  taken while they shrink the interval, golden-section steps otherwise.     */
/*                                                                            */
/******************************************************************************/

use crate::Bracket;

const GOLDEN: f64 = 0.3819660;

/// Refined location of a local maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Maximum {
    /// Best abscissa found
    pub x: f64,
    /// Function value at `x`
    pub y: f64,
    /// Final interval still known to contain the maximum
    pub lower: f64,
    pub upper: f64,
}

/// Refine `bracket` to a local maximum of `c_func`.
///
/// * `itmax` - Iteration limit
/// * `eps` - Function convergence tolerance
/// * `tol` - X convergence tolerance
pub fn brentmax<F>(itmax: usize, eps: f64, tol: f64, c_func: F, bracket: &Bracket) -> Maximum
where
    F: Fn(f64) -> f64,
{
    // x0 is the best point so far, x1 the second best, x2 the third
    let (mut x0, mut x1, mut x2) = (bracket.x2, bracket.x2, bracket.x2);
    let (mut y0, mut y1, mut y2) = (bracket.y2, bracket.y2, bracket.y2);
    let mut lower = bracket.x1;
    let mut upper = bracket.x3;

    // Zero movement forces golden section on the first iteration
    let mut movement: f64 = 0.0;
    let mut trial: f64 = 0.0;

    for iter in 0..itmax {
        let small_step = x0.abs().max(1.0) * tol;
        let small_dist = 2.0 * small_step;
        let xmid = 0.5 * (lower + upper);

        // Interval is small AND x0 sits near its middle
        if (x0 - xmid).abs() <= small_dist - 0.5 * (upper - lower) {
            break;
        }

        if iter >= 4 && (y2 - y0).abs() / (y0.abs() + 1.0) < eps {
            break;
        }

        let golden = |x0: f64| {
            let movement = if xmid > x0 { upper - x0 } else { lower - x0 };
            (movement, GOLDEN * movement)
        };

        if movement.abs() > small_step {
            let t1 = (x0 - x2) * (y0 - y1);
            let t2 = (x0 - x1) * (y0 - y2);
            let numer = (x0 - x1) * t2 - (x0 - x2) * t1;
            let denom = 2.0 * (t1 - t2);
            let previous = movement; // Intervals must get smaller
            movement = trial;

            trial = if denom.abs() > 1.0e-40 { numer / denom } else { 1.0e40 };

            let candidate = x0 + trial;
            if 2.0 * trial.abs() < previous.abs() && candidate > lower && candidate < upper {
                if candidate - lower < small_dist || upper - candidate < small_dist {
                    trial = if x0 < xmid { small_step } else { -small_step };
                }
            } else {
                (movement, trial) = golden(x0);
            }
        } else {
            (movement, trial) = golden(x0);
        }

        let this_x = if trial.abs() >= small_step {
            x0 + trial
        } else if trial > 0.0 {
            x0 + small_step
        } else {
            x0 - small_step
        };
        let this_y = c_func(this_x);

        if this_y >= y0 {
            if this_x < x0 {
                upper = x0;
            } else {
                lower = x0;
            }
            (x2, x1, x0) = (x1, x0, this_x);
            (y2, y1, y0) = (y1, y0, this_y);
        } else {
            if this_x >= x0 {
                upper = this_x;
            } else {
                lower = this_x;
            }

            if this_y >= y1 || x1 == x0 {
                (x2, x1) = (x1, this_x);
                (y2, y1) = (y1, this_y);
            } else if this_y >= y2 || x2 == x0 || x2 == x1 {
                x2 = this_x;
                y2 = this_y;
            }
        }
    }

    Maximum {
        x: x0,
        y: y0,
        lower,
        upper,
    }
}
