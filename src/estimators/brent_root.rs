/******************************************************************************/
/*                                                                            */
/*  BRENT_ROOT - Use Brent's method to find a root of a univariate function   */
/*               inside an interval where it changes sign.                    */
/*                                                                            */
/*  Inverse quadratic interpolation is accepted while it stays inside the     */
/*  interval and shrinks fast enough, bisection is used otherwise.            */
/*                                                                            */
/******************************************************************************/

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RootError {
    #[error("f({lower}) = {f_lower} and f({upper}) = {f_upper} do not differ in sign")]
    NotBracketed {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },

    #[error("no root within tolerance after {maxiter} iterations, last estimate {estimate}")]
    MaxIterations { maxiter: usize, estimate: f64 },
}

/// Root of `c_func` in `[lower, upper]`.
///
/// The interval is accepted when its half width falls below
/// `xtol / 2 + 2 eps |x|`, mirroring the usual `brentq` stopping rule.
pub fn brent_root<F>(
    c_func: F,
    lower: f64,
    upper: f64,
    xtol: f64,
    maxiter: usize,
) -> Result<f64, RootError>
where
    F: Fn(f64) -> f64,
{
    let mut a = lower;
    let mut b = upper;
    let mut fa = c_func(a);
    let mut fb = c_func(b);

    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if (fa > 0.0) == (fb > 0.0) {
        return Err(RootError::NotBracketed {
            lower,
            upper,
            f_lower: fa,
            f_upper: fb,
        });
    }

    // c is the contrapoint: f(b) and f(c) always differ in sign
    let mut c = b;
    let mut fc = fb;
    let mut d = 0.0;
    let mut e = 0.0;

    for _ in 0..maxiter {
        if (fb > 0.0) == (fc > 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * xtol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // Secant
                (2.0 * xm * s, 1.0 - s)
            } else {
                // Inverse quadratic
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol1 { d } else { tol1.copysign(xm) };
        fb = c_func(b);
    }

    Err(RootError::MaxIterations {
        maxiter,
        estimate: b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqrt_two() {
        let root = brent_root(|x| x * x - 2.0, 0.0, 2.0, 1e-12, 100).unwrap();
        assert!((root - 2.0_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_dottie_number() {
        let root = brent_root(|x: f64| x.cos() - x, 0.0, 1.0, 1e-12, 100).unwrap();
        assert!((root - 0.7390851332151607).abs() < 1e-10);
    }

    #[test]
    fn test_root_at_endpoint() {
        assert_eq!(brent_root(|x| x - 1.0, 1.0, 3.0, 1e-12, 100), Ok(1.0));
    }

    #[test]
    fn test_not_bracketed() {
        let err = brent_root(|x| x * x + 1.0, -1.0, 1.0, 1e-12, 100).unwrap_err();
        assert!(matches!(err, RootError::NotBracketed { .. }));
    }

    #[test]
    fn test_iteration_limit() {
        let err = brent_root(|x: f64| x.powi(3) - 0.3, 0.0, 10.0, 1e-15, 2).unwrap_err();
        assert!(matches!(err, RootError::MaxIterations { maxiter: 2, .. }));
    }
}
