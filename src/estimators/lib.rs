mod brent_root;
mod brentmax;
mod glob_max;

pub use brent_root::*;
pub use brentmax::*;
pub use glob_max::*;
