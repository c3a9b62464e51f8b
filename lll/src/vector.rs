//! Vectors.
//!
//! The [`OwnedVector`]s are aware of what kind of ring the elements come
//! from, i.e. the generic is the [`Ring`] and not the ring element. Which means
//! you can't have vectors of things that are not in rings. The reason is that
//! we otherwise wouldn't be able to implement functions that depend on what
//! the ring is, e.g. arithmetic operations: the ring type would be
//! unconstrained in the impl block.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use crate::rings::{Ring, RingElement};

/// A vector that owns its entries.
pub struct OwnedVector<R: Ring> {
    entries: Vec<R::Element>,
    marker: PhantomData<R>,
}

impl<R: Ring> OwnedVector<R> {
    /// Returns a zero vector.
    pub fn zero(dim: usize) -> Self {
        Self::from_raw_entries(vec![R::zero(); dim])
    }

    /// Creates a vector from a slice of things that can be converted into
    /// ring elements.
    pub fn from_entries<U, V>(a: U) -> Self
    where
        U: AsRef<[V]>,
        V: Into<R::Element> + Clone,
    {
        Self::from_raw_entries(a.as_ref().iter().map(|e| e.clone().into()).collect())
    }

    /// Creates a vector from an iterator.
    pub fn from_iter<I: Iterator<Item = R::Element>>(iter: I) -> Self {
        Self::from_raw_entries(iter.collect())
    }

    /// Takes ownership of the entries.
    pub fn from_raw_entries(entries: Vec<R::Element>) -> Self {
        Self {
            entries,
            marker: PhantomData,
        }
    }

    /// The dimension (number of entries) of the vector.
    pub fn dim(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R::Element> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, R::Element> {
        self.entries.iter_mut()
    }

    pub fn as_slice(&self) -> &[R::Element] {
        &self.entries
    }

    pub fn as_slice_mut(&mut self) -> &mut [R::Element] {
        &mut self.entries
    }

    /// Call a function on each entry and return the resulting vector.
    pub fn transform<U, F>(&self, f: F) -> OwnedVector<U>
    where
        U: Ring,
        F: FnMut(&R::Element) -> U::Element,
    {
        OwnedVector::from_iter(self.iter().map(f))
    }

    /// Are all entries zero?
    pub fn is_zero(&self) -> bool {
        self.iter().all(|e| e.is_zero())
    }

    /// Computes `self += c * v`.
    pub fn mul_add_assign(&mut self, c: &R::Element, v: &Self, r: &R) {
        assert_eq!(self.dim(), v.dim());
        for (e, f) in self.iter_mut().zip(v.iter()) {
            r.mul_add_assign(e, f, c);
        }
    }

    /// Computes `self -= c * v`.
    pub fn mul_sub_assign(&mut self, c: &R::Element, v: &Self, r: &R) {
        assert_eq!(self.dim(), v.dim());
        for (e, f) in self.iter_mut().zip(v.iter()) {
            r.mul_sub_assign(e, f, c);
        }
    }

    /// Computes the dot product of two vectors.
    pub fn dot(&self, other: &Self, r: &R) -> R::Element {
        assert_eq!(self.dim(), other.dim());
        self.iter()
            .zip(other.iter())
            .fold(R::zero(), |acc, (c, d)| r.mul_add(acc, c, d))
    }

    /// Computes the dot product of the vector with itself.
    pub fn norm_sqr(&self, r: &R) -> R::Element {
        self.iter().fold(R::zero(), |acc, e| r.mul_add(acc, e, e))
    }
}

impl<R: Ring> Clone for OwnedVector<R> {
    fn clone(&self) -> Self {
        Self::from_raw_entries(self.entries.clone())
    }
}

impl<R: Ring> Index<usize> for OwnedVector<R> {
    type Output = R::Element;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

impl<R: Ring> IndexMut<usize> for OwnedVector<R> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.entries[index]
    }
}

impl<'a, R: Ring> IntoIterator for &'a OwnedVector<R> {
    type Item = &'a R::Element;
    type IntoIter = std::slice::Iter<'a, R::Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, R: Ring> IntoIterator for &'a mut OwnedVector<R> {
    type Item = &'a mut R::Element;
    type IntoIter = std::slice::IterMut<'a, R::Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<R: Ring, I: ?Sized, U> PartialEq<I> for OwnedVector<R>
where
    for<'a> &'a I: IntoIterator<Item = &'a U>,
    U: 'static,
    R::Element: PartialEq<U>,
{
    fn eq(&self, other: &I) -> bool {
        let mut other = other.into_iter();
        for e in self.iter() {
            match other.next() {
                Some(o) if e == o => {}
                _ => return false,
            }
        }
        other.next().is_none()
    }
}

impl<R: Ring> Debug for OwnedVector<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rings::{Q, Z};
    use num_bigint::BigInt;
    use num_rational::BigRational;

    #[test]
    fn arithmetic() {
        let r = Z;
        let mut v = OwnedVector::<Z>::from_entries([1, -2, 3]);
        let w = OwnedVector::<Z>::from_entries([4, 5, 6]);
        assert_eq!(v.dot(&w, &r), BigInt::from(12));
        assert_eq!(v.norm_sqr(&r), BigInt::from(14));

        v.mul_sub_assign(&BigInt::from(2), &w, &r);
        assert_eq!(v, [-7, -12, -9].map(BigInt::from));

        v.mul_add_assign(&BigInt::from(1), &w, &r);
        assert_eq!(v, [-3, -7, -3].map(BigInt::from));
        assert!(!v.is_zero());
        assert!(OwnedVector::<Z>::zero(3).is_zero());
    }

    #[test]
    fn transform_to_rationals() {
        let v = OwnedVector::<Z>::from_entries([3, 6]);
        let q = v.transform::<Q, _>(|e| BigRational::new(e.clone(), BigInt::from(4)));
        assert_eq!(q[0], BigRational::new(3.into(), 4.into()));
        assert_eq!(q[1], BigRational::new(3.into(), 2.into()));
        assert_eq!(q.dot(&q, &Q), BigRational::new(45.into(), 16.into()));
    }
}
