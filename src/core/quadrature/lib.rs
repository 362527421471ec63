//! Numerical integration for densities on the half line.
//!
//! The centrepiece is [`simpson_quant_hp`], which walks a composite Simpson
//! sum outwards until a target mass is reached and refines the step until the
//! location converges. [`gauss_quadrature`] is the plain definite integral
//! used for CDFs.

mod eval_set;
mod gauss_legendre;
mod indexing;
mod simpson_quant;

pub use eval_set::*;
pub use gauss_legendre::*;
pub use indexing::*;
pub use simpson_quant::*;
