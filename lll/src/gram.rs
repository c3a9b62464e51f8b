//! Gram matrices and the conversions the dispatcher needs before it can
//! hand an input to one of the reductions.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::One;

use crate::error::{LllError, Result};
use crate::matrix::OwnedMatrix;
use crate::rings::{Ring, Z};

/// The matrix of inner products of the rows of `basis`.
pub fn gram_matrix<R: Ring>(basis: &OwnedMatrix<R>, r: &R) -> OwnedMatrix<R> {
    basis.mul_transposed(basis, r)
}

/// `H G Hᵀ`, the Gram matrix of the basis `H B` if `G` is the (symmetric)
/// Gram matrix of `B`.
pub fn congruence<R: Ring>(h: &OwnedMatrix<Z>, g: &OwnedMatrix<R>, r: &R) -> OwnedMatrix<R> {
    // (H G)ᵀ = G Hᵀ because G is symmetric.
    let hg = apply_transform(h, g, r);
    apply_transform(h, &hg.transposed(), r)
}

/// `H B` for an integer matrix `H` and a matrix `B` over any ring.
pub fn apply_transform<R: Ring>(h: &OwnedMatrix<Z>, b: &OwnedMatrix<R>, r: &R) -> OwnedMatrix<R> {
    assert_eq!(h.num_cols(), b.num_rows());
    let mut out = OwnedMatrix::zero(h.num_rows(), b.num_cols());
    for (i, coeffs) in h.rows().enumerate() {
        for (c, v) in coeffs.iter().zip(b.rows()) {
            if num_traits::Zero::is_zero(c) {
                continue;
            }
            out[i].mul_add_assign(&r.element_from_bigint(c), v, r);
        }
    }
    out
}

/// Embeds complex vectors into real space of twice the dimension.
///
/// Row `i` of the result is `(re[i][0], im[i][0], re[i][1], im[i][1], ...)`.
/// The embedding preserves the real part of the hermitian inner product, so
/// a reduction of the embedded vectors is a reduction over the Gaussian
/// integer combinations that are real.
pub fn embed_complex<R: Ring>(re: &OwnedMatrix<R>, im: &OwnedMatrix<R>) -> Result<OwnedMatrix<R>> {
    if re.num_rows() != im.num_rows() {
        return Err(LllError::DimensionMismatch {
            what: "rows of the imaginary part",
            expected: re.num_rows(),
            found: im.num_rows(),
        });
    }
    if re.num_cols() != im.num_cols() {
        return Err(LllError::DimensionMismatch {
            what: "columns of the imaginary part",
            expected: re.num_cols(),
            found: im.num_cols(),
        });
    }

    let m = re.num_cols();
    Ok(OwnedMatrix::from_iter(
        re.num_rows(),
        2 * m,
        re.rows()
            .zip(im.rows())
            .flat_map(|(a, b)| a.iter().zip(b.iter()).flat_map(|(x, y)| [x.clone(), y.clone()])),
    ))
}

/// Undoes [`embed_complex`].
pub fn split_complex<R: Ring>(m: &OwnedMatrix<R>) -> (OwnedMatrix<R>, OwnedMatrix<R>) {
    debug_assert!(m.num_cols() % 2 == 0);
    let cols = m.num_cols() / 2;
    let part = |offset: usize| {
        OwnedMatrix::from_iter(
            m.num_rows(),
            cols,
            m.rows()
                .flat_map(move |r| r.iter().skip(offset).step_by(2).cloned()),
        )
    };
    (part(0), part(1))
}

/// The least common multiple of the denominators of the entries.
pub fn common_denominator(m: &OwnedMatrix<crate::rings::Q>) -> BigInt {
    m.entries_row_major()
        .fold(BigInt::one(), |acc, e: &BigRational| acc.lcm(e.denom()))
}
