/******************************************************************************/
/*                                                                            */
/*  GLOB_MAX - Check equispaced intervals to find rough global maximum        */
/*             of a univariate function                                       */
/*                                                                            */
/*  This is called with a lower and upper bound for the domain to be          */
/*  searched.  If the function is still increasing at one of these endpoints  */
/*  the search will continue beyond the specified endpoint.                   */
/*  The total interval is equally divided into npts-1 subintervals, spaced    */
/*  arithmetically or logarithmically according to log_space.                 */
/*  The returned bracket has its center point (x2,y2) at least as high as     */
/*  its neighbors, ready for refinement by brentmax.                          */
/*                                                                            */
/******************************************************************************/

/// Cap on the endpoint extension loops.
const MAX_EXTENSIONS: usize = 200;

/// Three abscissae with the middle one highest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub x3: f64,
    pub y3: f64,
}

pub fn glob_max<F>(low: f64, high: f64, npts: usize, log_space: bool, c_func: F) -> Bracket
where
    F: Fn(f64) -> f64,
{
    assert!(npts >= 2, "glob_max needs at least two points, got {npts}");
    if log_space {
        assert!(low > 0.0, "log-spaced search needs a positive lower bound, got {low}");
    }

    let rate = if log_space {
        (high / low).ln() / (npts as f64 - 1.0)
    } else {
        (high - low) / (npts as f64 - 1.0)
    };
    let advance = |x: f64, r: f64| if log_space { x * r.exp() } else { x + r };
    let retreat = |x: f64, r: f64| if log_space { x / r.exp() } else { x - r };

    let mut b = Bracket {
        x1: low,
        y1: 0.0,
        x2: low,
        y2: f64::NEG_INFINITY,
        x3: low,
        y3: 0.0,
    };

    let mut x = low;
    let mut previous = 0.0;
    let mut ibest = 0;
    let mut turned = false; // Has the best point got a lower right neighbour?

    for i in 0..npts {
        let y = c_func(x);

        if i == 0 || y > b.y2 {
            ibest = i;
            b.x2 = x;
            b.y2 = y;
            b.y1 = previous;
            turned = false;
        } else if i == ibest + 1 {
            b.y3 = y;
            turned = true;
        }

        previous = y;
        x = advance(x, rate);
    }

    b.x1 = retreat(b.x2, rate);
    b.x3 = advance(b.x2, rate);

    /*
       The function may still be improving at an endpoint of the range,
       in which case the search continues beyond it.
    */

    if !turned {
        // Extend to the right
        let mut rate = rate;
        for _ in 0..MAX_EXTENSIONS {
            b.y3 = c_func(b.x3);

            // NaN counts as a decrease
            if !(b.y3 >= b.y2) {
                break;
            }
            if b.y1 == b.y2 && b.y2 == b.y3 {
                break; // Flat
            }

            b.x1 = b.x2;
            b.y1 = b.y2;
            b.x2 = b.x3;
            b.y2 = b.y3;

            rate *= 3.0;
            b.x3 = advance(b.x3, rate);
        }
    } else if ibest == 0 {
        // Extend to the left
        let mut rate = rate;
        for _ in 0..MAX_EXTENSIONS {
            b.y1 = c_func(b.x1);

            if !(b.y1 >= b.y2) {
                break;
            }
            if b.y1 == b.y2 && b.y2 == b.y3 {
                break;
            }

            b.x3 = b.x2;
            b.y3 = b.y2;
            b.x2 = b.x1;
            b.y2 = b.y1;

            rate *= 3.0;
            b.x1 = retreat(b.x1, rate);
        }
    }

    b
}
