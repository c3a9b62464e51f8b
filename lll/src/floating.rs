//! LLL with floating point Gram-Schmidt data.
//!
//! Each attempt runs at a fixed precision. If the approximations become
//! unreliable, the transform found so far is kept, the basis is rebuilt as
//! `H * input` and the next attempt runs at a higher precision. Integer
//! input never fails: if raising the precision doesn't look promising, the
//! exact reduction takes over.

use crate::error::{LllError, Result};
use crate::gram::{apply_transform, congruence};
use crate::gso::{FloatGso, FloatSettings};
use crate::integral::reduce_exact;
use crate::lattice::WorkingTypeFor;
use crate::matrix::OwnedMatrix;
use crate::params::{LllOptions, Representation};
use crate::reduce::{BasisState, DriveControl, Finish, Halt, Reduction, Stats, drive};
use crate::rings::{Reals, Ring, Z, bit_length};

/// Rings whose matrices the floating point reduction accepts.
pub(crate) trait FloatInput: Ring {
    /// Are basis updates in this ring exact?
    fn is_exact(&self) -> bool;

    /// The ring the basis is updated in during an attempt at `prec` bits.
    fn at_precision(&self, prec: u32) -> Self;

    /// The number of bits of the integral part of the largest entry.
    fn max_bits(m: &OwnedMatrix<Self>) -> u64;

    /// The entries as integers, if they all are integers.
    fn as_integers(m: &OwnedMatrix<Self>) -> Option<OwnedMatrix<Z>>;
}

impl FloatInput for Z {
    fn is_exact(&self) -> bool {
        true
    }

    fn at_precision(&self, _: u32) -> Self {
        Z
    }

    fn max_bits(m: &OwnedMatrix<Self>) -> u64 {
        m.entries_row_major().map(bit_length).max().unwrap_or(0)
    }

    fn as_integers(m: &OwnedMatrix<Self>) -> Option<OwnedMatrix<Z>> {
        Some(m.clone())
    }
}

impl FloatInput for Reals {
    fn is_exact(&self) -> bool {
        false
    }

    fn at_precision(&self, prec: u32) -> Self {
        Reals::new(prec.max(self.precision()))
    }

    fn max_bits(m: &OwnedMatrix<Self>) -> u64 {
        m.entries_row_major()
            .filter_map(|e| e.top_bit())
            .max()
            .map_or(0, |t| t.max(0) as u64)
    }

    fn as_integers(m: &OwnedMatrix<Self>) -> Option<OwnedMatrix<Z>> {
        m.try_transform(|_, _, e| {
            if e.exponent() >= 0 {
                Ok(e.mantissa() << e.exponent() as u64)
            } else {
                Err(())
            }
        })
        .ok()
    }
}

/// How an attempt ended.
enum Attempt<R: Ring> {
    Success { state: BasisState<R>, finish: Finish },

    /// The precision was too low at vector `at`.
    Retry {
        at: usize,
        reason: &'static str,
        progress: bool,
    },

    /// A decision at vector `at` should be made exactly.
    Ambiguous { at: usize },

    Fatal(LllError),
}

/// `input` after applying the transform `h`, in the ring `r`.
fn current_basis<R: Ring>(
    input: &OwnedMatrix<R>,
    h: &OwnedMatrix<Z>,
    representation: Representation,
    r: &R,
) -> OwnedMatrix<R> {
    match representation {
        Representation::Basis => apply_transform(h, &input, r),
        Representation::Gram => congruence(h, &input, r),
    }
}

/// `t * h`, or `h` if there is no `t`.
fn compose(t: Option<OwnedMatrix<Z>>, h: &OwnedMatrix<Z>) -> OwnedMatrix<Z> {
    t.map_or_else(|| h.clone(), |t| t.mul(h, &Z))
}

#[allow(clippy::too_many_arguments)]
fn attempt<R: FloatInput>(
    input: &OwnedMatrix<R>,
    ring: &R,
    prec: u32,
    h: &mut OwnedMatrix<Z>,
    options: &LllOptions,
    settings: &FloatSettings,
    control: &mut DriveControl,
    stats: &mut Stats,
) -> Attempt<R>
where
    Reals: WorkingTypeFor<R>,
{
    let n = input.num_rows();
    let r = ring.at_precision(prec);
    let basis = current_basis(input, h, options.representation, &r);
    let mut state = BasisState::new(r, basis, options.representation, true);
    let mut gso = FloatGso::<R, Reals>::new(
        n,
        Reals::new(prec),
        options.representation,
        &options.delta,
        &options.precision,
        settings,
    );

    let mut attempt_stats = Stats::default();
    let outcome = drive(&mut state, &mut gso, control, &mut attempt_stats);
    stats.add(&attempt_stats);
    *h = compose(state.transform.take(), h);

    match outcome {
        Ok(finish) => Attempt::Success { state, finish },
        Err(Halt::PrecisionLoss { at, reason }) => Attempt::Retry {
            at,
            reason,
            progress: attempt_stats.made_progress(),
        },
        Err(Halt::Ambiguous { at }) => Attempt::Ambiguous { at },
        Err(Halt::Fatal(e)) => Attempt::Fatal(e),
    }
}

/// Finishes the reduction of `H * input` exactly.
fn exact_fallback<R: FloatInput>(
    exact: &OwnedMatrix<Z>,
    h: OwnedMatrix<Z>,
    ring: &R,
    options: &LllOptions,
    mut control: DriveControl,
    mut stats: Stats,
) -> Result<Reduction<R>> {
    let basis = current_basis(exact, &h, options.representation, &Z);
    let mut state = BasisState::new(Z, basis, options.representation, true);
    let finish = reduce_exact(&mut state, &options.delta, &mut control, &mut stats)?;
    let h = compose(state.transform.take(), &h);

    let state = BasisState {
        basis: state.basis.transform(|e| ring.element_from_bigint(e)),
        ring: ring.clone(),
        representation: options.representation,
        transform: Some(h),
    };
    Ok(Reduction::assemble(state, finish, &options.want, None, stats))
}

/// Reduces `input` with floating point Gram-Schmidt data.
/// The options have been checked already.
pub(crate) fn lll_floating<R: FloatInput>(
    input: &OwnedMatrix<R>,
    ring: &R,
    options: &LllOptions,
) -> Result<Reduction<R>>
where
    Reals: WorkingTypeFor<R>,
{
    let n = input.num_rows();
    let config = &options.precision;
    let max_bits = R::max_bits(input);
    let exact = if ring.is_exact() {
        R::as_integers(input)
    } else {
        None
    };
    let small = (n as u64).saturating_mul(max_bits) <= config.exact_cutoff;

    let settings = FloatSettings {
        method: config.method,
        strict: exact.is_some(),
        swap_budget: config
            .swap_budget_factor
            .saturating_mul((n * n) as u64)
            .saturating_mul(1 + max_bits),
    };

    let mut h = OwnedMatrix::identity(n);
    let mut control = DriveControl {
        marked: options.marked,
        probe: None,
        compaction_interval: options.compaction_interval,
    };
    let mut stats = Stats::default();
    let mut prec = config.initial_precision(n, max_bits);
    let mut retries = 0;

    loop {
        log::debug!("floating point reduction of {n} vectors at {prec} bits");
        let outcome = attempt(
            input,
            ring,
            prec,
            &mut h,
            options,
            &settings,
            &mut control,
            &mut stats,
        );

        let (progress, ambiguous) = match outcome {
            Attempt::Success { mut state, finish } => {
                if !ring.is_exact() {
                    // Recompute at the precision of the input, the attempt
                    // only used its own.
                    state.basis = current_basis(input, &h, options.representation, ring);
                    state.ring = ring.clone();
                }
                state.transform = Some(h);
                return Ok(Reduction::assemble(
                    state,
                    finish,
                    &options.want,
                    Some(prec),
                    stats,
                ));
            }
            Attempt::Fatal(e) => return Err(e),
            Attempt::Retry {
                at,
                reason,
                progress,
            } => {
                log::debug!("precision loss at vector {at} with {prec} bits: {reason}");
                (progress, false)
            }
            Attempt::Ambiguous { at } => {
                log::debug!("decision at vector {at} is too close to call with {prec} bits");
                (true, true)
            }
        };

        let next = config.next_precision(prec);
        if let Some(exact) = &exact {
            if ambiguous || small || retries >= config.max_retries || next.is_none() {
                log::debug!("switching to the exact reduction after {retries} retries");
                return exact_fallback(exact, h, ring, options, control, stats);
            }
        }

        // An attempt that got nowhere is only repeated at a higher
        // precision, the initial one is just an estimate.
        if (next.is_none() && !progress) || retries >= config.max_retries {
            log::warn!("giving up the reduction at {prec} bits after {retries} retries");
            return Err(LllError::PrecisionExhausted {
                precision: prec,
                retries,
            });
        }

        // Without a higher precision another attempt still helps if the last
        // one got somewhere before it failed.
        prec = next.unwrap_or(prec);
        retries += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::integral::lll_integral;
    use crate::lattice::determinant;
    use crate::params::{GsoMethod, PrecisionConfig, Strategy};
    use crate::rings::{Q, Real, RingElement as _};
    use num_bigint::BigInt;
    use num_rational::BigRational;
    use num_traits::Signed;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn random_basis(rng: &mut StdRng, n: usize, m: usize, bits: u32) -> OwnedMatrix<Z> {
        let bound = 1i64 << bits;
        OwnedMatrix::from_iter(
            n,
            m,
            (0..n * m).map(|_| BigInt::from(rng.random_range(-bound..bound))),
        )
    }

    #[test]
    fn floating_matches_exact() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut inputs: Vec<_> = (0..12)
            .map(|i| random_basis(&mut rng, 2 + i % 5, 6, 4 + 3 * (i as u32 % 4)))
            .collect();

        // An exact tie and a dependency.
        inputs.push(OwnedMatrix::from_rows(&[[2, 0], [1, 3]]));
        inputs.push(OwnedMatrix::from_rows(&[[1, 2, 3], [2, 4, 6], [1, 0, 1]]));

        for method in [GsoMethod::Householder, GsoMethod::Classical] {
            let options = LllOptions::default()
                .with_strategy(Strategy::Floating)
                .with_precision(PrecisionConfig::default().with_method(method));
            for b in &inputs {
                let exact = lll_integral(b, &options).unwrap();
                let float = lll_floating(b, &Z, &options).unwrap();
                assert_eq!(exact.basis, float.basis);
                assert_eq!(exact.transform, float.transform);
                assert_eq!(exact.flags, float.flags);
            }
        }
    }

    #[test]
    fn large_entries_fall_back_to_exact() {
        let big = BigInt::from(1) << 90u32;
        let rows: Vec<Vec<BigInt>> = (0..3)
            .map(|i| {
                let mut row = vec![BigInt::from(0); 3];
                row[i] = BigInt::from(1);
                row.push(&big * (2 * i + 3) + i);
                row
            })
            .collect();
        let b = OwnedMatrix::<Z>::try_from_rows(rows).unwrap();

        let options = LllOptions::default()
            .with_precision(PrecisionConfig::default().with_initial(32).with_max_precision(32));
        let r = lll_floating(&b, &Z, &options).unwrap();
        assert_eq!(r.precision, None);
        assert_eq!(r.basis, lll_integral(&b, &options).unwrap().basis);
    }

    /// Rows `e_i | x_i` with huge `x_i` that aren't integers.
    fn knapsack(ring: &Reals) -> OwnedMatrix<Reals> {
        let mut rng = StdRng::seed_from_u64(99);
        let n = 4;
        let rows = (0..n)
            .map(|i| {
                let mut row: Vec<Real> = (0..n)
                    .map(|j| if i == j { Real::one() } else { Real::zero() })
                    .collect();
                let x = (BigInt::from(rng.random_range(1u64 << 60..1u64 << 61)) << 30u32) * 2 + 1;
                row.push(ring.round_to_precision(&Real::new(x, -1)));
                row
            })
            .collect();
        OwnedMatrix::try_from_rows(rows).unwrap()
    }

    #[test]
    fn precision_is_raised() {
        let ring = Reals::new(128);
        let b = knapsack(&ring);
        let options =
            LllOptions::default().with_precision(PrecisionConfig::default().with_initial(32));
        let r = lll_floating(&b, &ring, &options).unwrap();
        assert!(r.precision.unwrap() > 32);

        let h = r.transform.unwrap();
        let det = determinant(h.transform::<Q, _>(|e| BigRational::from_integer(e.clone())), &Q);
        assert_eq!(det.abs(), BigRational::from_integer(1.into()));
        assert_eq!(r.basis.unwrap(), apply_transform(&h, &b, &ring));
    }

    #[test]
    fn precision_can_run_out() {
        let ring = Reals::new(128);
        let b = knapsack(&ring);
        let options = LllOptions::default().with_precision(
            PrecisionConfig::default()
                .with_initial(32)
                .with_max_retries(0),
        );
        assert_eq!(
            lll_floating(&b, &ring, &options).unwrap_err(),
            LllError::PrecisionExhausted {
                precision: 32,
                retries: 0
            }
        );
    }

    #[test]
    fn no_progress_at_the_cap() {
        // The knapsack needs far more than 64 bits before the first
        // reduction, so neither attempt gets anywhere and the driver stops
        // at the cap with retries left.
        let ring = Reals::new(128);
        let b = knapsack(&ring);
        let options = LllOptions::default().with_precision(
            PrecisionConfig::default()
                .with_initial(32)
                .with_max_precision(64),
        );
        assert_eq!(
            lll_floating(&b, &ring, &options).unwrap_err(),
            LllError::PrecisionExhausted {
                precision: 64,
                retries: 1
            }
        );
    }

    #[test]
    fn integers_are_recognized() {
        let m = OwnedMatrix::<Reals>::from_iter(
            1,
            2,
            [Real::from_bigint(&BigInt::from(12)), Real::new(BigInt::from(3), 2)].into_iter(),
        );
        assert_eq!(
            Reals::as_integers(&m).unwrap(),
            OwnedMatrix::<Z>::from_rows(&[[12, 12]])
        );
        assert_eq!(Reals::max_bits(&m), 4);

        let half = OwnedMatrix::<Reals>::from_iter(1, 1, [Real::new(BigInt::from(1), -1)].into_iter());
        assert!(Reals::as_integers(&half).is_none());
    }
}
