use super::*;

/// Floating point numbers aren't actually a ring (or a field) for
/// multiple reasons:
/// - Addition and multiplication are not associative
/// - Infinities, NaNs, -0
///
/// But we act like it so we can store them in vectors, matrices.
///
/// This is the type of real input to [`crate::lll_real`]. The input is
/// checked for NaNs and infinities and then converted exactly to
/// [`Reals`] before any reduction happens.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct F64;

impl_ring_element!(f64);

impl Ring for F64 {
    type Element = f64;

    fn neg_assign(&self, e: &mut Self::Element) {
        *e = -*e;
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

    fn mul_add_assign(&self, acc: &mut Self::Element, a: &Self::Element, b: &Self::Element) {
        *acc = a.mul_add(*b, *acc);
    }

    fn element_from_usize(&self, n: usize) -> Self::Element {
        n as f64
    }

    fn element_from_biguint(&self, n: &BigUint) -> Self::Element {
        use num_traits::cast::ToPrimitive;
        n.to_f64().unwrap_or(f64::INFINITY)
    }
}

impl SqrtRing for F64 {
    fn sqrt(&self, e: &Self::Element) -> Self::Element {
        e.sqrt()
    }
}

impl Field for F64 {
    fn div_assign(&self, l: &mut Self::Element, r: &Self::Element) {
        *l /= r;
    }
}

impl OrderedRing for F64 {
    fn cmp(&self, l: &Self::Element, r: &Self::Element) -> std::cmp::Ordering {
        l.partial_cmp(r).unwrap_or(std::cmp::Ordering::Equal)
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
        *e > 0.
    }

    fn is_negative(&self, e: &Self::Element) -> bool {
        *e < 0.
    }

    fn abs_assign(&self, e: &mut Self::Element) {
        *e = e.abs();
    }

    fn abs(&self, e: Self::Element) -> Self::Element {
        e.abs()
    }

    fn cmp_abs(&self, l: &Self::Element, r: &Self::Element) -> std::cmp::Ordering {
        l.abs()
            .partial_cmp(&r.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    }

    fn is_abs_le(&self, l: &Self::Element, r: &Self::Element) -> bool {
        l.abs() <= r.abs()
    }

    fn is_abs_gt(&self, l: &Self::Element, r: &Self::Element) -> bool {
        l.abs() > r.abs()
    }
}
