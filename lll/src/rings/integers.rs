use super::*;
use num_integer::Integer as _;

/// The integers, with [`BigInt`] elements.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Z;

impl Ring for Z {
    type Element = BigInt;

    fn neg_assign(&self, e: &mut Self::Element) {
        neg_assign(e);
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
        BigInt::from(n)
    }

    fn element_from_biguint(&self, n: &BigUint) -> Self::Element {
        n.clone().into()
    }

    fn element_from_bigint(&self, n: &BigInt) -> Self::Element {
        n.clone()
    }
}

impl SqrtRing for Z {
    fn sqrt(&self, e: &Self::Element) -> Self::Element {
        e.sqrt()
    }
}

impl Z {
    /// Divides `l` by `r` where the caller knows the division is exact.
    ///
    /// The fraction-free Gram-Schmidt recurrences only ever divide exactly.
    /// A remainder here means the state was corrupted, which is checked in
    /// debug builds.
    pub fn div_exact(l: &BigInt, r: &BigInt) -> BigInt {
        let (q, rem) = l.div_rem(r);
        debug_assert!(Zero::is_zero(&rem), "inexact division {l} / {r}");
        q
    }

    /// Rounds the fraction `n / d` (`d > 0`) to the nearest integer,
    /// rounding halves up, i.e. computes `⌊(2n + d) / 2d⌋`.
    pub fn round_fraction(n: &BigInt, d: &BigInt) -> BigInt {
        let two_d: BigInt = d << 1u32;
        let twice_n: BigInt = n << 1u32;
        (twice_n + d).div_floor(&two_d)
    }
}

impl OrderedRing for Z {
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
        l.magnitude().cmp(r.magnitude())
    }

    fn is_abs_le(&self, l: &Self::Element, r: &Self::Element) -> bool {
        l.magnitude() <= r.magnitude()
    }

    fn is_abs_gt(&self, l: &Self::Element, r: &Self::Element) -> bool {
        l.magnitude() > r.magnitude()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_fraction_rounds_halves_up() {
        let r = |n: i32, d: i32| Z::round_fraction(&n.into(), &d.into());
        assert_eq!(r(1, 2), BigInt::from(1));
        assert_eq!(r(-1, 2), BigInt::from(0));
        assert_eq!(r(-3, 2), BigInt::from(-1));
        assert_eq!(r(7, 3), BigInt::from(2));
        assert_eq!(r(-7, 3), BigInt::from(-2));
        assert_eq!(r(5, 3), BigInt::from(2));
    }

    #[test]
    fn exact_division() {
        assert_eq!(Z::div_exact(&(-45).into(), &9.into()), BigInt::from(-5));
        assert_eq!(Z::div_exact(&0.into(), &7.into()), BigInt::from(0));
    }
}
