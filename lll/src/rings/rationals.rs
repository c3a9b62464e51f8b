use super::*;

/// The rationals, with [`BigRational`] elements.
///
/// The reduction itself never computes with rationals (rational input is
/// scaled to an integral lattice first), but exact Gram-Schmidt and the
/// reducedness checks in [`crate::lattice`] do.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Q;

impl Ring for Q {
    type Element = BigRational;

    fn neg_assign(&self, e: &mut Self::Element) {
        neg_assign(e)
    }

    fn add_assign(&self, l: &mut Self::Element, r: &Self::Element) {
        *l += r;
    }

    fn sub_assign(&self, l: &mut Self::Element, r: &Self::Element) {
        *l -= r;
    }

    fn mul_assign(&self, l: &mut Self::Element, r: &Self::Element) {
        *l *= r;
    }

    fn element_from_usize(&self, n: usize) -> Self::Element {
        BigInt::from(n).into()
    }

    fn element_from_biguint(&self, n: &BigUint) -> Self::Element {
        BigInt::from(n.clone()).into()
    }

    fn element_from_bigint(&self, n: &BigInt) -> Self::Element {
        n.clone().into()
    }
}

impl SqrtRing for Q {
    fn sqrt(&self, e: &Self::Element) -> Self::Element {
        BigRational::new(e.numer().sqrt(), e.denom().sqrt())
    }
}

impl Field for Q {
    fn div_assign(&self, l: &mut Self::Element, r: &Self::Element) {
        *l /= r;
    }
}

impl OrderedRing for Q {
    fn cmp(&self, l: &Self::Element, r: &Self::Element) -> std::cmp::Ordering {
        l.cmp(r)
    }

    fn is_lt(&self, l: &Self::Element, r: &Self::Element) -> bool {
        l < r
    }

    fn is_le(&self, l: &Self::Element, r: &Self::Element) -> bool {
        l <= r
    }

    fn is_ge(&self, l: &Self::Element, r: &Self::Element) -> bool {
        l >= r
    }

    fn is_gt(&self, l: &Self::Element, r: &Self::Element) -> bool {
        l > r
    }

    fn is_positive(&self, e: &Self::Element) -> bool {
        e.is_positive()
    }

    fn is_negative(&self, e: &Self::Element) -> bool {
        e.is_negative()
    }

    fn abs_assign(&self, e: &mut Self::Element) {
        if e.is_negative() {
            self.neg_assign(e);
        }
    }

    fn cmp_abs(&self, l: &Self::Element, r: &Self::Element) -> std::cmp::Ordering {
        // Cross multiplying the magnitudes avoids the two allocations of
        // `abs` but `Ratio::cmp` already short circuits the common cases.
        l.abs().cmp(&r.abs())
    }
}

impl Q {
    /// Rounds `e` to the nearest integer, rounding halves up.
    pub fn round_half_up(e: &BigRational) -> BigInt {
        Z::round_fraction(e.numer(), e.denom())
    }
}
