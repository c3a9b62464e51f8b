//! The entry points. They check the input, bring it into a form one of the
//! reductions accepts and pick the reduction.

use num_rational::BigRational;

use crate::error::{LllError, Result};
use crate::floating::{FloatInput, lll_floating};
use crate::gram::{common_denominator, embed_complex};
use crate::integral::lll_integral;
use crate::matrix::OwnedMatrix;
use crate::params::{LllOptions, Representation, Strategy};
use crate::reduce::{BasisState, Finish, Reduction, Stats};
use crate::rings::{F64, Q, Real, Reals, Ring, RingElement as _, Z};

/// Checks the shape of the input against the options.
fn validate<R: Ring>(m: &OwnedMatrix<R>, options: &LllOptions) -> Result<()> {
    if options.representation == Representation::Gram && !m.is_square() {
        return Err(LllError::NotSquare {
            rows: m.num_rows(),
            cols: m.num_cols(),
        });
    }
    options.check_indices(m.num_rows())
}

/// LLL reduces the rows of an integer matrix (or an integer Gram matrix).
///
/// This always succeeds for valid input. The floating point reduction is
/// used for large inputs (see [`Strategy`]), but it falls back to the exact
/// reduction whenever it can't make progress.
pub fn lll_integer(basis: &OwnedMatrix<Z>, options: &LllOptions) -> Result<Reduction<Z>> {
    validate(basis, options)?;
    let n = basis.num_rows();
    if options.probe.is_some() || n <= 1 {
        return lll_integral(basis, options);
    }

    let floating = match options.strategy {
        Strategy::Exact => false,
        Strategy::Floating => true,
        Strategy::Auto => {
            let bits = Z::max_bits(basis);
            (n as u64).saturating_mul(bits) > options.precision.exact_cutoff
        }
    };

    if floating {
        lll_floating(basis, &Z, options)
    } else {
        lll_integral(basis, options)
    }
}

/// LLL reduces the rows of a rational matrix.
///
/// The matrix is scaled to an integer matrix by the common denominator of
/// its entries, which doesn't change the transform.
pub fn lll_rational(basis: &OwnedMatrix<Q>, options: &LllOptions) -> Result<Reduction<Q>> {
    validate(basis, options)?;
    let d = common_denominator(basis);
    let scale = BigRational::from_integer(d.clone());
    let scaled = basis.transform::<Z, _>(|e| (e * &scale).to_integer());
    let reduction = lll_integer(&scaled, options)?;
    Ok(reduction.map_basis(|b| b.transform::<Q, _>(|e| BigRational::new(e.clone(), d.clone()))))
}

/// LLL reduces the rows of a matrix of floats.
///
/// The floats are converted exactly, so matrices with integral entries are
/// reduced exactly. Everything else is reduced at 64 bits or more, see
/// [`lll_reals`].
pub fn lll_real(basis: &OwnedMatrix<F64>, options: &LllOptions) -> Result<Reduction<F64>> {
    let exact = basis.try_transform::<Reals, _, _>(|row, col, e| {
        Real::from_f64(*e).ok_or(LllError::NonFinite { row, col })
    })?;
    let reduction = lll_reals(&exact, &Reals::new(64), options)?;
    Ok(reduction.map_basis(|b| b.transform::<F64, _>(Real::to_f64)))
}

/// LLL reduces the rows of a matrix of arbitrary precision floats.
///
/// Integral input is reduced exactly. Otherwise the reduction works at the
/// precision of `ring` or higher and the result is computed at the
/// precision of `ring`. Since it is impossible to tell whether inexact
/// vectors are dependent, the kernel, the image and probes need integral
/// input, and dependent vectors usually end in
/// [`LllError::PrecisionExhausted`].
pub fn lll_reals(
    basis: &OwnedMatrix<Reals>,
    ring: &Reals,
    options: &LllOptions,
) -> Result<Reduction<Reals>> {
    validate(basis, options)?;
    if let Some(integers) = Reals::as_integers(basis) {
        let reduction = lll_integer(&integers, options)?;
        return Ok(reduction.map_basis(|b| b.transform::<Reals, _>(|e| ring.element_from_bigint(e))));
    }

    if options.want.kernel || options.want.image || options.probe.is_some() {
        return Err(LllError::InexactKernel);
    }

    if basis.num_rows() <= 1 {
        return Ok(trivial(basis, ring, options));
    }

    lll_floating(basis, ring, options)
}

/// LLL reduces complex vectors given by their real and imaginary parts.
///
/// The vectors are embedded into real space of twice the dimension (see
/// [`embed_complex`]) and the basis of the result is in that form. For Gram
/// matrix input the real part is the Gram matrix of the embedded vectors,
/// the imaginary part only has to have the same shape.
pub fn lll_complex(
    re: &OwnedMatrix<F64>,
    im: &OwnedMatrix<F64>,
    options: &LllOptions,
) -> Result<Reduction<F64>> {
    match options.representation {
        Representation::Basis => lll_real(&embed_complex(re, im)?, options),
        Representation::Gram => {
            // Only for the shape check.
            embed_complex(re, im)?;
            lll_real(re, options)
        }
    }
}

/// The result for at most one vector, which is reduced already.
fn trivial<R: Ring>(basis: &OwnedMatrix<R>, ring: &R, options: &LllOptions) -> Reduction<R> {
    let n = basis.num_rows();
    let state = BasisState::new(ring.clone(), basis.clone(), options.representation, true);
    let flags = (0..n)
        .map(|i| match options.representation {
            Representation::Basis => !state.basis[i].is_zero(),
            Representation::Gram => !state.basis[(i, i)].is_zero(),
        })
        .collect();
    let finish = Finish {
        flags,
        marked: options.marked,
        probe_hit: None,
    };
    Reduction::assemble(state, finish, &options.want, None, Stats::default())
}
