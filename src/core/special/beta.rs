use statrs::function::beta::checked_ln_beta;

// ============================================================================
// Beta function
// ============================================================================

/// ln B(x, y) of the complete Beta function, `+inf` on the poles
/// (non-positive arguments).
///
/// B(x, y) underflows once the shapes reach a few hundred; ratios of Beta
/// functions should be formed from these logs.
pub fn ln_beta(x: f64, y: f64) -> f64 {
    checked_ln_beta(x, y).unwrap_or(f64::INFINITY)
}
