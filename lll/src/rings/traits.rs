use num_bigint::{BigInt, BigUint, Sign};

/// An element of a ring.
/// This exists mostly for convenience, so we can call `e.is_zero` on ring
/// elements, but this should really all be implemented on the `Ring` itself,
/// so we'd have to call `r.is_zero(e)`.
pub trait RingElement: 'static + Clone + PartialEq + std::fmt::Debug + std::fmt::Display {
    /// Returns the "zero" element of the ring.
    fn zero() -> Self;

    /// Is the given element "zero"?
    fn is_zero(&self) -> bool;

    /// Returns the "one" element of the ring.
    fn one() -> Self;

    /// Is the given element "one"?
    fn is_one(&self) -> bool;
}

macro_rules! impl_ring_element {
    ($t:ident) => {
        impl RingElement for $t {
            fn zero() -> Self {
                Zero::zero()
            }

            fn is_zero(&self) -> bool {
                Zero::is_zero(self)
            }

            fn one() -> Self {
                One::one()
            }

            fn is_one(&self) -> bool {
                One::is_one(self)
            }
        }
    };
}

pub(crate) use impl_ring_element;

/// A ring.
///
/// The ring value carries whatever runtime information is needed to do
/// arithmetic, e.g. the working precision of [`super::Reals`]. An instance
/// of the ring needs to be passed to every function that computes with its
/// elements.
///
/// `Clone` is here for convenience. All current implementations have
/// reasonably efficient clones.
pub trait Ring: 'static + Clone + PartialEq + Eq + std::fmt::Debug {
    /// The type of the elements of the ring.
    type Element: RingElement;

    /// Returns the "zero" element of the ring.
    fn zero() -> Self::Element {
        Self::Element::zero()
    }

    /// Returns the "one" element of the ring.
    fn one() -> Self::Element {
        Self::Element::one()
    }

    /// Negates the element in place.
    fn neg_assign(&self, e: &mut Self::Element);

    /// Negates the element, i.e. computes `0 - e`.
    fn neg(&self, mut e: Self::Element) -> Self::Element {
        self.neg_assign(&mut e);
        e
    }

    /// Add an element to another element.
    fn add_assign(&self, l: &mut Self::Element, r: &Self::Element);

    /// Add two elements.
    fn add(&self, mut l: Self::Element, r: &Self::Element) -> Self::Element {
        self.add_assign(&mut l, r);
        l
    }

    /// Subtract one element from another.
    fn sub_assign(&self, l: &mut Self::Element, r: &Self::Element);

    /// Subtract one element from another.
    fn sub(&self, mut l: Self::Element, r: &Self::Element) -> Self::Element {
        self.sub_assign(&mut l, r);
        l
    }

    /// Multiply two elements.
    fn mul_assign(&self, l: &mut Self::Element, r: &Self::Element);

    /// Multiply two elements.
    fn mul(&self, mut l: Self::Element, r: &Self::Element) -> Self::Element {
        self.mul_assign(&mut l, r);
        l
    }

    /// Multiply two elements and add the result to another element.
    ///
    /// This exists as an optimization and has a default implementation that
    /// just allocates a new element for the product and adds that.
    fn mul_add_assign(&self, acc: &mut Self::Element, a: &Self::Element, b: &Self::Element) {
        self.add_assign(acc, &self.mul(a.clone(), b))
    }

    /// Multiply two elements and add the result to another element.
    /// See [`Ring::mul_add_assign`].
    fn mul_add(
        &self,
        mut acc: Self::Element,
        a: &Self::Element,
        b: &Self::Element,
    ) -> Self::Element {
        self.mul_add_assign(&mut acc, a, b);
        acc
    }

    /// [`Ring::mul_add_assign`] but with [`Ring::sub`].
    fn mul_sub_assign(&self, acc: &mut Self::Element, a: &Self::Element, b: &Self::Element) {
        self.sub_assign(acc, &self.mul(a.clone(), b));
    }

    /// Square a number.
    fn square(&self, a: Self::Element) -> Self::Element {
        self.mul(a.clone(), &a)
    }

    /// Converts the `usize` `n` into an element.
    /// The element is the result of adding `1` `n`-times to itself.
    fn element_from_usize(&self, n: usize) -> Self::Element;

    /// Converts the [`BigUint`] `n` into an element.
    /// The element is the result of adding `1` `n`-times to itself.
    fn element_from_biguint(&self, n: &BigUint) -> Self::Element;

    /// Converts the [`BigInt`] `n` into an element.
    ///
    /// - If `n` is non-negative, this is the result of adding `1` `n`-times to
    ///   itself.
    ///
    /// - If `n` is negative, this is the result of adding `-1` `-n`-times to
    ///   itself.
    fn element_from_bigint(&self, n: &BigInt) -> Self::Element {
        match n.sign() {
            Sign::NoSign => Self::zero(),
            Sign::Plus => self.element_from_biguint(n.magnitude()),
            Sign::Minus => self.neg(self.element_from_biguint(n.magnitude())),
        }
    }
}

/// A field.
pub trait Field: Ring {
    /// Divide an element by another element.
    fn div_assign(&self, l: &mut Self::Element, r: &Self::Element);

    /// Divide an element by another element.
    fn div(&self, mut l: Self::Element, r: &Self::Element) -> Self::Element {
        self.div_assign(&mut l, r);
        l
    }
}

/// A ring where you can take approximate square roots of positive (whatever
/// that means) elements. This is used for vectors that should have an (L2)
/// norm and for Householder reflections.
///
/// Unlike the other operations this takes the ring by reference, because the
/// result of an approximate square root depends on the working precision,
/// which lives in the ring value for [`super::Reals`].
pub trait SqrtRing: Ring {
    /// Compute an approximate square root.
    fn sqrt(&self, e: &Self::Element) -> Self::Element;
}

/// A ring where you can compare two elements.
///
/// In the lattice algorithms we need to compare two elements of a
/// [`crate::lattice::WorkingType`], e.g. in the Lovász condition. For this
/// reason this is also implemented for [`super::F64`] which rust doesn't
/// consider to be ordered ([`Ord`]) because of NaNs. The implementation for
/// it treats NaNs as equal to everything; inputs are checked for NaNs before
/// they ever reach the reduction.
pub trait OrderedRing: Ring {
    /// Compare two elements.
    fn cmp(&self, l: &Self::Element, r: &Self::Element) -> std::cmp::Ordering;

    /// Is `l` less than `r`?
    fn is_lt(&self, l: &Self::Element, r: &Self::Element) -> bool {
        self.cmp(l, r).is_lt()
    }

    /// Is `l` less than or equal to `r`?
    fn is_le(&self, l: &Self::Element, r: &Self::Element) -> bool {
        self.cmp(l, r).is_le()
    }

    /// Is `l` greater than or equal to `r`?
    fn is_ge(&self, l: &Self::Element, r: &Self::Element) -> bool {
        self.cmp(l, r).is_ge()
    }

    /// Is `l` greater than `r`?
    fn is_gt(&self, l: &Self::Element, r: &Self::Element) -> bool {
        self.cmp(l, r).is_gt()
    }

    /// Is the given element greater than 0?
    fn is_positive(&self, e: &Self::Element) -> bool {
        self.is_gt(e, &Self::zero())
    }

    /// Is the given element less than 0?
    fn is_negative(&self, e: &Self::Element) -> bool {
        self.is_lt(e, &Self::zero())
    }

    /// Compute the absolute value of the element, which is defined here as
    /// `is_negative(e) ? neg(e) : e`.
    fn abs_assign(&self, e: &mut Self::Element) {
        if self.is_negative(e) {
            self.neg_assign(e);
        }
    }

    /// Compute the absolute value of the element.
    /// See [`OrderedRing::abs_assign`].
    fn abs(&self, mut e: Self::Element) -> Self::Element {
        self.abs_assign(&mut e);
        e
    }

    /// Compare the absolute value of two elements.
    fn cmp_abs(&self, l: &Self::Element, r: &Self::Element) -> std::cmp::Ordering {
        self.cmp(&self.abs(l.clone()), &self.abs(r.clone()))
    }

    /// Is the absolute value of `l` less than or equal to the absolute value of
    /// `r`?
    fn is_abs_le(&self, l: &Self::Element, r: &Self::Element) -> bool {
        self.cmp_abs(l, r).is_le()
    }

    /// Is the absolute value of `l` greater than the absolute value of `r`?
    fn is_abs_gt(&self, l: &Self::Element, r: &Self::Element) -> bool {
        self.cmp_abs(l, r).is_gt()
    }
}
