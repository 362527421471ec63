//! Special functions needed by the Beta ratio density: the Beta function and
//! the Gaussian hypergeometric function 2F1 behind a swappable provider.

mod beta;
mod gamma;
mod hyp2f1;

pub use beta::*;
pub use gamma::*;
pub use hyp2f1::*;
