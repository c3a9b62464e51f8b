//! Integer lattices, exact checks and the rings the reductions compute in.

use crate::error::Result;
use crate::params::{Delta, LllOptions};
use crate::reduce::Reduction;
use crate::rings::{
    F64, Field, OrderedRing, Q, Real, Reals, Ring, RingElement as _, SqrtRing, Z, bit_length,
};
use crate::matrix::*;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::ToPrimitive;

/// A "lattice", i.e. the span of a set of vectors.
/// This can never be empty because it always contains the zero vector even if
/// [`Lattice::basis`] has zero rows. The matrix always stores the ambient
/// dimension (the number of columns) even if there are zero rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice<R: Ring> {
    /// The basis matrix of the lattice.
    /// The basis vectors are the rows of the matrix.
    pub basis: OwnedMatrix<R>,
}

impl<R: Ring> Lattice<R> {
    /// The lattice basis are the rows of the matrix.
    pub fn from_basis(basis: OwnedMatrix<R>) -> Self {
        Self { basis }
    }

    /// Returns the number of basis vectors. If they are dependent, this is
    /// more than the rank of the lattice.
    pub fn num_vectors(&self) -> usize {
        self.basis.num_rows()
    }

    /// Returns the dimension of the ambient space.
    pub fn ambient_dim(&self) -> usize {
        self.basis.num_cols()
    }

    /// Returns the Gram matrix of the basis.
    pub fn gram(&self, r: &R) -> OwnedMatrix<R> {
        crate::gram::gram_matrix(&self.basis, r)
    }
}

impl Lattice<Z> {
    /// Performs LLL basis reduction. The basis is replaced by the reduced
    /// basis, the rest of the result (e.g. the transform) is returned.
    pub fn lll(&mut self, options: &LllOptions) -> Result<Reduction<Z>> {
        let mut options = options.clone();
        options.want.basis = true;
        let mut reduction = crate::lll_integer(&self.basis, &options)?;
        if let Some(basis) = reduction.basis.take() {
            self.basis = basis;
        }
        Ok(reduction)
    }

    /// Is the basis LLL reduced with respect to `delta`?
    pub fn is_lll_reduced(&self, delta: &Delta) -> bool {
        is_lll_reduced(&self.basis, delta)
    }
}

/// Gram-Schmidt of the rows of the matrix `a`.
///
/// Returns the orthogonalized rows and the coefficients `mu[i][j]` (`j < i`)
/// with `a_i = b*_i + Σ mu[i][j] b*_j`. Rows that depend on the previous
/// ones become zero and all coefficients with respect to them are zero.
pub fn gram_schmidt<R: Field>(
    mut a: OwnedMatrix<R>,
    r: &R,
) -> (OwnedMatrix<R>, Vec<Vec<R::Element>>) {
    let n = a.num_rows();
    let mut mu = vec![Vec::new(); n];
    let mut norms = Vec::with_capacity(n);
    for i in 0..n {
        mu[i] = vec![R::zero(); i];
        for j in 0..i {
            let norm: &R::Element = &norms[j];
            if norm.is_zero() {
                continue;
            }
            let (a_i, a_j) = a.get_rows_mut(i, j);
            let f = r.div(a_j.dot(a_i, r), norm);
            a_i.mul_sub_assign(&f, a_j, r);
            mu[i][j] = f;
        }
        norms.push(a[i].norm_sqr(r));
    }

    (a, mu)
}

/// Checks exactly whether the rows of `basis` are LLL reduced.
///
/// That is, all Gram-Schmidt coefficients with respect to non-zero
/// orthogonalized vectors are at most 1/2 in absolute value and the Lovász
/// condition holds for every pair of consecutive vectors whose predecessor
/// has a non-zero orthogonalized vector. Dependent vectors need to come
/// first.
pub fn is_lll_reduced(basis: &OwnedMatrix<Z>, delta: &Delta) -> bool {
    let q = basis.transform::<Q, _>(|e| BigRational::from_integer(e.clone()));
    let (b, mu) = gram_schmidt(q, &Q);
    let norms: Vec<_> = b.rows().map(|v| v.norm_sqr(&Q)).collect();
    let half = BigRational::new(1.into(), 2.into());
    let delta = delta.to_rational();

    for k in 0..basis.num_rows() {
        for j in 0..k {
            if !norms[j].is_zero() && Q.is_abs_gt(&mu[k][j], &half) {
                return false;
            }
        }

        if k == 0 || norms[k - 1].is_zero() {
            continue;
        }

        // δ ‖b*_{k-1}‖² ≤ ‖b*_k‖² + μ² ‖b*_{k-1}‖²
        let lhs = &delta * &norms[k - 1];
        let rhs = &norms[k] + &mu[k][k - 1] * &mu[k][k - 1] * &norms[k - 1];
        if lhs > rhs {
            return false;
        }
    }

    true
}

/// Computes the determinant of a square matrix using Gaussian elimination.
pub fn determinant<R: Field + OrderedRing>(mut a: OwnedMatrix<R>, r: &R) -> R::Element {
    assert!(a.is_square(), "The determinant is only defined for square matrices.");
    let n = a.num_rows();
    let mut det = R::one();
    for i in 0..n {
        // Choose a pivot in the i-th column.
        let Some(pivot) = a
            .col(i)
            .enumerate()
            .skip(i)
            .filter(|e| !e.1.is_zero())
            .max_by(|e, f| r.cmp_abs(e.1, f.1))
            .map(|e| e.0)
        else {
            return R::zero();
        };

        // Swap the pivot row with the current row.
        if pivot != i {
            a.swap_rows(pivot, i);
            det = r.neg(det);
        }
        for k in i + 1..n {
            let (pivot_row, row) = a.get_rows_mut(i, k);
            let fac = r.div(row[i].clone(), &pivot_row[i]);
            for c in i..n {
                r.mul_sub_assign(&mut row[c], &fac, &pivot_row[c]);
            }
        }
        r.mul_assign(&mut det, &a[(i, i)]);
    }
    det
}

/// Lattice algorithms are possibly internally working with a different ring.
/// These rings need to implement this.
pub trait WorkingType: Field + OrderedRing + SqrtRing {
    /// The number of mantissa bits, `None` for exact types.
    fn precision(&self) -> Option<u32>;

    /// The same kind of numbers with a different precision. Types with a
    /// fixed precision return themselves.
    fn with_precision(&self, prec: u32) -> Self;

    /// Rounds to the nearest integer, halves up.
    fn round_nearest(&self, e: &Self::Element) -> BigInt;

    /// The smallest `t` with `|e| < 2^t`, `None` for zero.
    /// Exact types may return an approximation.
    fn top_bit(&self, e: &Self::Element) -> Option<i64>;

    /// One half.
    fn half(&self) -> Self::Element {
        self.div(Self::one(), &self.element_from_usize(2))
    }
}

/// This trait facilitates the conversion between the ring of the lattice and
/// the ring used internally.
pub trait WorkingTypeFor<R: Ring>: WorkingType {
    #[allow(clippy::wrong_self_convention)]
    fn from_ring(&self, e: &R::Element, r: &R) -> Self::Element;

    fn to_ring(s: &Self::Element, r: &R) -> R::Element;
}

impl WorkingType for Reals {
    fn precision(&self) -> Option<u32> {
        Some(Reals::precision(self))
    }

    fn with_precision(&self, prec: u32) -> Self {
        Reals::new(prec)
    }

    fn round_nearest(&self, e: &Real) -> BigInt {
        e.round()
    }

    fn top_bit(&self, e: &Real) -> Option<i64> {
        e.top_bit()
    }
}

impl WorkingTypeFor<Z> for Reals {
    fn from_ring(&self, e: &BigInt, _: &Z) -> Real {
        self.element_from_bigint(e)
    }

    fn to_ring(s: &Real, _: &Z) -> BigInt {
        s.round()
    }
}

impl WorkingTypeFor<Reals> for Reals {
    fn from_ring(&self, e: &Real, _: &Reals) -> Real {
        self.round_to_precision(e)
    }

    fn to_ring(s: &Real, r: &Reals) -> Real {
        r.round_to_precision(s)
    }
}

impl WorkingType for F64 {
    fn precision(&self) -> Option<u32> {
        Some(f64::MANTISSA_DIGITS)
    }

    fn with_precision(&self, _: u32) -> Self {
        F64
    }

    fn round_nearest(&self, e: &f64) -> BigInt {
        Real::from_f64(*e).map(|r| r.round()).unwrap_or_default()
    }

    fn top_bit(&self, e: &f64) -> Option<i64> {
        Real::from_f64(*e).and_then(|r| r.top_bit())
    }

    fn half(&self) -> f64 {
        0.5
    }
}

impl WorkingTypeFor<Z> for F64 {
    fn from_ring(&self, e: &BigInt, _: &Z) -> f64 {
        e.to_f64().unwrap_or(f64::INFINITY)
    }

    fn to_ring(s: &f64, _: &Z) -> BigInt {
        F64.round_nearest(s)
    }
}

impl WorkingType for Q {
    fn precision(&self) -> Option<u32> {
        None
    }

    fn with_precision(&self, _: u32) -> Self {
        Q
    }

    fn round_nearest(&self, e: &BigRational) -> BigInt {
        Q::round_half_up(e)
    }

    fn top_bit(&self, e: &BigRational) -> Option<i64> {
        (!e.is_zero()).then(|| bit_length(e.numer()) as i64 - bit_length(e.denom()) as i64 + 1)
    }
}

impl WorkingTypeFor<Z> for Q {
    fn from_ring(&self, e: &BigInt, _: &Z) -> BigRational {
        BigRational::from_integer(e.clone())
    }

    fn to_ring(s: &BigRational, _: &Z) -> BigInt {
        Q::round_half_up(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rationals<const N: usize>(rows: &[[i32; N]]) -> OwnedMatrix<Q> {
        OwnedMatrix::<Z>::from_rows(rows).transform::<Q, _>(|e| BigRational::from_integer(e.clone()))
    }

    #[test]
    fn gram_schmidt_test() {
        let a = rationals(&[[1, 2, 3], [3, 4, 5], [4, 6, 8]]);
        let (b, mu) = gram_schmidt(a.clone(), &Q);

        // The third row is the sum of the first two.
        assert!(b[2].is_zero());
        assert!(!b[1].is_zero());
        assert_eq!(b[0].dot(&b[1], &Q), BigRational::from_integer(0.into()));
        assert_eq!(mu[1][0], BigRational::new(26.into(), 14.into()));

        // a_i = b*_i + Σ mu[i][j] b*_j
        for i in 0..3 {
            let mut v = b[i].clone();
            for j in 0..i {
                v.mul_add_assign(&mu[i][j], &b[j], &Q);
            }
            assert_eq!(v, a[i]);
        }
    }

    #[test]
    fn lll_reduced_check() {
        let delta = Delta::new(3, 4).unwrap();
        let reduced = OwnedMatrix::<Z>::from_rows(&[[1, 0], [0, 1]]);
        assert!(is_lll_reduced(&reduced, &delta));

        // Not size reduced.
        let b = OwnedMatrix::<Z>::from_rows(&[[1, 0], [1, 1]]);
        assert!(!is_lll_reduced(&b, &delta));

        // Lovász condition fails: the second vector is much shorter.
        let b = OwnedMatrix::<Z>::from_rows(&[[4, 0], [0, 1]]);
        assert!(!is_lll_reduced(&b, &delta));

        // Dependent vectors first is fine, after an independent one it isn't.
        let b = OwnedMatrix::<Z>::from_rows(&[[0, 0], [1, 2]]);
        assert!(is_lll_reduced(&b, &delta));
        let b = OwnedMatrix::<Z>::from_rows(&[[1, 2], [0, 0]]);
        assert!(!is_lll_reduced(&b, &delta));
    }

    #[test]
    fn determinant_test() {
        let a = rationals(&[[2, 1, 0], [1, 3, 1], [0, 1, 4]]);
        assert_eq!(determinant(a, &Q), BigRational::from_integer(18.into()));

        let a = rationals(&[[0, 1], [1, 0]]);
        assert_eq!(determinant(a, &Q), BigRational::from_integer((-1).into()));

        let a = rationals(&[[1, 2], [2, 4]]);
        assert_eq!(determinant(a, &Q), BigRational::from_integer(0.into()));
    }

    #[test]
    fn working_type_rounding() {
        assert_eq!(F64.round_nearest(&2.5), BigInt::from(3));
        assert_eq!(F64.round_nearest(&-2.5), BigInt::from(-2));
        assert_eq!(F64.top_bit(&4.0), Some(3));
        assert_eq!(F64.top_bit(&0.0), None);
        let r = Reals::new(100);
        assert_eq!(r.with_precision(200).precision(), 200);
        assert_eq!(
            <Reals as WorkingTypeFor<Z>>::to_ring(&r.half(), &Z),
            BigInt::from(1)
        );
        assert_eq!(Q.round_nearest(&BigRational::new((-7).into(), 2.into())), BigInt::from(-3));
    }

    #[test]
    fn lattice_reduction() {
        let mut l = Lattice::from_basis(OwnedMatrix::<Z>::from_rows(&[[1, 2], [3, 4], [5, 6]]));
        assert_eq!(l.num_vectors(), 3);
        assert_eq!(l.ambient_dim(), 2);
        let input = l.basis.clone();

        let delta = Delta::default();
        assert!(!l.is_lll_reduced(&delta));
        let r = l.lll(&LllOptions::default()).unwrap();
        assert!(l.is_lll_reduced(&delta));
        assert_eq!(r.rank, 2);
        assert!(l.basis[0].is_zero());
        assert_eq!(r.transform.unwrap().mul(&input, &Z), l.basis);
        assert_eq!(l.gram(&Z), crate::gram::gram_matrix(&l.basis, &Z));
    }
}
