//! The two ways of keeping track of the Gram-Schmidt orthogonalization
//! while a basis is being reduced.
//!
//! [`IntegralGso`] stores it exactly, as integer numerators over a chain of
//! integer denominators, so no division ever leaves the integers.
//! [`FloatGso`] stores approximations at some precision and reports when
//! the approximations can't be trusted anymore.

mod exact;
mod float;

pub(crate) use exact::IntegralGso;
pub(crate) use float::{FloatGso, FloatSettings};
