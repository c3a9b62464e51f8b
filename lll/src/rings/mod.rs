//! The kinds of numbers
//! ([rings](https://en.wikipedia.org/wiki/Ring_(mathematics))) the reduction
//! works with.
//!
//! The most important trait is [`Ring`] which stores information about the
//! ring we are working in and all operations on the ring are implemented in
//! this trait. For [`Z`], [`Q`] and [`F64`] the ring value is empty, but for
//! [`Reals`] it contains the working precision. This is how the precision of
//! the floating point reduction is threaded through every computation
//! instead of living in some global state.
//!
//! An instance of [`Ring`] needs to be passed to any function that uses the
//! ring which seems unnecessary for [`Z`] but for [`Reals`] we don't know how
//! to (e.g.) multiply elements otherwise. The other option would be to store
//! the precision with every element, which would waste memory and we'd have
//! to decide what happens when precisions differ.

mod float;
mod integers;
mod rationals;
mod real;
mod traits;

pub use float::*;
pub use integers::*;
pub use rationals::*;
pub use real::*;
pub use traits::*;

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

impl_ring_element!(BigInt);
impl_ring_element!(BigRational);

/// Negates an element without allocating. There should really be a `NegAssign`
/// trait for this in `num_traits`.
pub(crate) fn neg_assign<T: std::ops::Neg<Output = T> + Default>(e: &mut T) {
    *e = -std::mem::take(e);
}

/// Number of bits of the absolute value of `i`, 0 for 0.
pub(crate) fn bit_length(i: &BigInt) -> u64 {
    i.magnitude().bits()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn neg_assign_in_place() {
        let mut i = BigInt::from(-17);
        neg_assign(&mut i);
        assert_eq!(i, BigInt::from(17));
        let mut q = BigRational::new(3.into(), (-4).into());
        neg_assign(&mut q);
        assert_eq!(q, BigRational::new(3.into(), 4.into()));
    }

    #[test]
    fn bit_length_of_small_numbers() {
        assert_eq!(bit_length(&<BigInt as Zero>::zero()), 0);
        assert_eq!(bit_length(&<BigInt as One>::one()), 1);
        assert_eq!(bit_length(&BigInt::from(-8)), 4);
        assert_eq!(bit_length(&BigInt::from(255u32)), 8);
    }
}
