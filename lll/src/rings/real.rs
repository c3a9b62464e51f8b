use super::*;
use num_bigint::Sign;
use num_traits::{Float as _, ToPrimitive as _};
use std::cmp::Ordering;

/// A binary floating point number `mantissa * 2^exponent` of arbitrary size.
///
/// The mantissa is odd (or zero, in which case the exponent is zero too), so
/// every value has exactly one representation and the derived `PartialEq` is
/// equality of values.
///
/// Elements don't know their precision. Arithmetic happens through a
/// [`Reals`] ring value which rounds every result to its precision.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Real {
    mantissa: BigInt,
    exponent: i64,
}

impl Real {
    /// Builds the exact value `mantissa * 2^exponent`.
    pub fn new(mantissa: BigInt, exponent: i64) -> Self {
        if Zero::is_zero(&mantissa) {
            return Self::default();
        }
        let tz = mantissa.trailing_zeros().unwrap_or(0);
        Self {
            mantissa: mantissa >> tz,
            exponent: exponent + tz as i64,
        }
    }

    /// Converts a finite float exactly. Returns `None` for NaN and infinities.
    pub fn from_f64(f: f64) -> Option<Self> {
        if !f.is_finite() {
            return None;
        }
        let (mantissa, exponent, sign) = f.integer_decode();
        let mantissa = BigInt::from(mantissa);
        let mantissa = if sign < 0 { -mantissa } else { mantissa };
        Some(Self::new(mantissa, exponent as i64))
    }

    /// Converts an integer exactly.
    pub fn from_bigint(i: &BigInt) -> Self {
        Self::new(i.clone(), 0)
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// The number of significant bits of the mantissa.
    pub fn significant_bits(&self) -> u64 {
        bit_length(&self.mantissa)
    }

    /// The smallest `t` with `|self| < 2^t`. `None` for zero.
    pub fn top_bit(&self) -> Option<i64> {
        if Zero::is_zero(&self.mantissa) {
            None
        } else {
            Some(self.exponent + self.significant_bits() as i64)
        }
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    /// Rounds to the nearest integer, rounding halves up, i.e. `⌊x + 1/2⌋`.
    pub fn round(&self) -> BigInt {
        if self.exponent >= 0 {
            return &self.mantissa << self.exponent as u64;
        }
        let d = <BigInt as One>::one() << (-self.exponent) as u64;
        Z::round_fraction(&self.mantissa, &d)
    }

    /// Closest `f64`. Saturates to infinity (or zero) outside of its range.
    pub fn to_f64(&self) -> f64 {
        if Zero::is_zero(&self.mantissa) {
            return 0.;
        }

        // Keep the top 64 bits, `f64` can't use more anyway.
        let bits = self.significant_bits();
        let (m, mut e) = if bits > 64 {
            let shift = bits - 64;
            (&self.mantissa >> shift, self.exponent + shift as i64)
        } else {
            (self.mantissa.clone(), self.exponent)
        };

        let mut f = m.to_f64().unwrap_or(0.);
        while e != 0 {
            let step = e.clamp(-1000, 1000);
            f *= 2f64.powi(step as i32);
            e -= step;
            if f == 0. || f.is_infinite() {
                break;
            }
        }
        f
    }

    fn cmp_abs(&self, other: &Self) -> Ordering {
        match (self.top_bit(), other.top_bit()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l != r => return l.cmp(&r),
            _ => {}
        }

        // Same top bit, so shifting to the smaller exponent doesn't
        // grow the numbers beyond the longer of the two mantissas.
        let e = self.exponent.min(other.exponent);
        let l = self.mantissa.magnitude() << (self.exponent - e) as u64;
        let r = other.mantissa.magnitude() << (other.exponent - e) as u64;
        l.cmp(&r)
    }
}

impl std::fmt::Display for Real {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl RingElement for Real {
    fn zero() -> Self {
        Self::default()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(&self.mantissa)
    }

    fn one() -> Self {
        Self {
            mantissa: <BigInt as One>::one(),
            exponent: 0,
        }
    }

    fn is_one(&self) -> bool {
        self.exponent == 0 && One::is_one(&self.mantissa)
    }
}

/// The real numbers, approximated by [`Real`]s with `prec` bits of mantissa.
///
/// All operations are rounded to the nearest representable number, ties to
/// even, like IEEE floats. Changing the precision means using a different ring
/// value, elements can be moved between precisions with
/// [`Reals::round_to_precision`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Reals {
    prec: u32,
}

impl Reals {
    /// The smallest supported precision.
    pub const MIN_PRECISION: u32 = 8;

    pub fn new(prec: u32) -> Self {
        Self {
            prec: prec.max(Self::MIN_PRECISION),
        }
    }

    /// The number of mantissa bits of results.
    pub fn precision(&self) -> u32 {
        self.prec
    }

    /// Rounds `mantissa * 2^exponent` to the precision of the ring.
    fn make(&self, mantissa: BigInt, exponent: i64) -> Real {
        let bits = bit_length(&mantissa);
        let prec = self.prec as u64;
        if bits <= prec {
            return Real::new(mantissa, exponent);
        }

        // Round to nearest, ties to even.
        let shift = bits - prec;
        let (sign, mag) = mantissa.into_parts();
        let sticky = mag.trailing_zeros().is_some_and(|tz| tz < shift - 1);
        let round_up = mag.bit(shift - 1) && (sticky || mag.bit(shift));
        let mut mag = mag >> shift;
        if round_up {
            mag += 1u32;
        }
        Real::new(BigInt::from_biguint(sign, mag), exponent + shift as i64)
    }

    /// Rounds an element (e.g. from a ring with a higher precision) to this
    /// precision.
    pub fn round_to_precision(&self, e: &Real) -> Real {
        self.make(e.mantissa.clone(), e.exponent)
    }

    /// Converts a float, rounding to the precision of the ring.
    /// Returns `None` for NaN and infinities.
    pub fn from_f64(&self, f: f64) -> Option<Real> {
        Real::from_f64(f).map(|r| self.round_to_precision(&r))
    }

    /// Converts a rational, rounding to the precision of the ring.
    pub fn from_rational(&self, q: &BigRational) -> Real {
        let n = self.element_from_bigint(q.numer());
        let d = self.element_from_bigint(q.denom());
        self.div(n, &d)
    }
}

impl Ring for Reals {
    type Element = Real;

    fn neg_assign(&self, e: &mut Self::Element) {
        neg_assign(&mut e.mantissa);
    }

    fn add_assign(&self, l: &mut Self::Element, r: &Self::Element) {
        let (Some(lt), Some(rt)) = (l.top_bit(), r.top_bit()) else {
            if RingElement::is_zero(l) {
                *l = r.clone();
            }
            return;
        };

        // If one operand is less than a quarter ulp of the other, the
        // rounded sum is the larger operand.
        let gap = self.prec as i64 + 2;
        if lt - rt > gap {
            return;
        }
        if rt - lt > gap {
            *l = r.clone();
            return;
        }

        let e = l.exponent.min(r.exponent);
        let lm = std::mem::take(&mut l.mantissa) << (l.exponent - e) as u64;
        let rm = &r.mantissa << (r.exponent - e) as u64;
        *l = self.make(lm + rm, e);
    }

    fn sub_assign(&self, l: &mut Self::Element, r: &Self::Element) {
        let r = self.neg(r.clone());
        self.add_assign(l, &r);
    }

    fn mul_assign(&self, l: &mut Self::Element, r: &Self::Element) {
        let m = std::mem::take(&mut l.mantissa) * &r.mantissa;
        *l = self.make(m, l.exponent + r.exponent);
    }

    fn element_from_usize(&self, n: usize) -> Self::Element {
        self.make(BigInt::from(n), 0)
    }

    fn element_from_biguint(&self, n: &BigUint) -> Self::Element {
        self.make(BigInt::from(n.clone()), 0)
    }

    fn element_from_bigint(&self, n: &BigInt) -> Self::Element {
        self.make(n.clone(), 0)
    }
}

impl Field for Reals {
    /// Panics if `r` is zero.
    fn div_assign(&self, l: &mut Self::Element, r: &Self::Element) {
        if RingElement::is_zero(l) {
            return;
        }

        // Shift the numerator so the quotient has at least `prec + 2` bits.
        let lb = l.significant_bits() as i64;
        let rb = r.significant_bits() as i64;
        let shift = (self.prec as i64 + 2 + rb - lb).max(0);
        let n = std::mem::take(&mut l.mantissa) << shift as u64;
        let (mut q, rem) = num_integer::Integer::div_rem(&n, &r.mantissa);
        let mut e = l.exponent - r.exponent - shift;

        // Sticky bit so that rounding sees an inexact quotient.
        if !Zero::is_zero(&rem) {
            q = (q << 1u32) + if n.sign() == r.mantissa.sign() { 1 } else { -1 };
            e -= 1;
        }
        *l = self.make(q, e);
    }
}

impl SqrtRing for Reals {
    /// The square root of a non-negative number. Negative numbers have
    /// their sign dropped.
    fn sqrt(&self, e: &Self::Element) -> Self::Element {
        if RingElement::is_zero(e) {
            return Real::default();
        }
        debug_assert!(!e.is_negative(), "square root of negative number {e}");

        let (mut m, mut exp) = (e.mantissa.magnitude().clone(), e.exponent);
        if exp % 2 != 0 {
            m <<= 1u32;
            exp -= 1;
        }

        // `m << 2s` has at least `2 (prec + 2)` bits.
        let want = 2 * (self.prec as i64 + 2);
        let s = ((want - m.bits() as i64 + 1) / 2).max(0);
        let m = m << (2 * s) as u64;
        let mut r = m.sqrt();
        let mut exp = exp / 2 - s;
        if &r * &r != m {
            r = (r << 1u32) + 1u32;
            exp -= 1;
        }
        self.make(BigInt::from_biguint(Sign::Plus, r), exp)
    }
}

impl OrderedRing for Reals {
    fn cmp(&self, l: &Self::Element, r: &Self::Element) -> Ordering {
        match (l.mantissa.sign(), r.mantissa.sign()) {
            (Sign::Minus, Sign::Minus) => l.cmp_abs(r).reverse(),
            (Sign::Minus, _) => Ordering::Less,
            (_, Sign::Minus) => Ordering::Greater,
            _ => l.cmp_abs(r),
        }
    }

    fn is_positive(&self, e: &Self::Element) -> bool {
        e.mantissa.is_positive()
    }

    fn is_negative(&self, e: &Self::Element) -> bool {
        e.mantissa.is_negative()
    }

    fn abs_assign(&self, e: &mut Self::Element) {
        if e.mantissa.is_negative() {
            neg_assign(&mut e.mantissa);
        }
    }

    fn cmp_abs(&self, l: &Self::Element, r: &Self::Element) -> Ordering {
        l.cmp_abs(r)
    }
}
