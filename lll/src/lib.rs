//! LLL reduction of lattice bases and Gram matrices over the integers, the
//! rationals and the reals.

pub mod error;
pub mod gram;
pub mod lattice;
pub mod matrix;
pub mod params;
pub mod rings;
pub mod vector;

mod dispatch;
mod floating;
mod gso;
mod integral;
mod reduce;
mod scratch;

pub use dispatch::{lll_complex, lll_integer, lll_rational, lll_real, lll_reals};
pub use error::{LllError, Result};
pub use params::{Delta, GsoMethod, LllOptions, PrecisionConfig, Representation, Strategy, Want};
pub use reduce::{Reduction, Stats};
