//! Statistics of the ratio `X1 / X2` of two independent Beta variables, the
//! posterior of the ratio of two success proportions in a 2x2 table.
//!
//! ```text
//!                 X1   X2
//!          succ   a    b
//!          fail   c    d
//! ```
//!
//! [`BetaRatio`] exposes the density, distribution function, mode and
//! quantiles. Quantiles come either from the adaptive half-line Simpson
//! integrator in the `quadrature` crate or from root finding on the
//! distribution function.

pub mod beta_ratio;
pub mod config;
pub mod error;

pub use beta_ratio::{BetaRatio, Ppf, PpfMethod, Prior};
pub use config::{Config, Hyp2F1Choice, MapConfig, OptimConfig};
pub use error::RatioError;
pub use quadrature::{GaussConfig, QuantConfig, QuantError};
pub use special::Hyp2F1Method;
