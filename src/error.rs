use quadrature::QuantError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RatioError {
    #[error(transparent)]
    Quant(#[from] QuantError),

    #[error("cdf never exceeded {q} before the upper bound reached {upper} ({doublings} doublings)")]
    NoBracket { q: f64, upper: f64, doublings: usize },

    #[error("cdf(x) = {q} not solved within {maxiter} iterations (last estimate {estimate})")]
    RootNotFound { q: f64, maxiter: usize, estimate: f64 },

    #[error("recursively factored 2F1 needs integer failure shapes >= 1, got b1 = {b1}, b2 = {b2}")]
    FactoredNeedsIntegerShapes { b1: f64, b2: f64 },
}
