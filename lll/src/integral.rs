//! The exact reduction of integer bases and Gram matrices.

use crate::error::Result;
use crate::gso::IntegralGso;
use crate::matrix::OwnedMatrix;
use crate::params::{Delta, LllOptions};
use crate::reduce::{BasisState, DriveControl, Finish, Halt, Reduction, Stats, drive};
use crate::rings::Z;

/// Runs the exact reduction on `state`.
pub(crate) fn reduce_exact(
    state: &mut BasisState<Z>,
    delta: &Delta,
    control: &mut DriveControl,
    stats: &mut Stats,
) -> Result<Finish> {
    log::debug!("exact reduction of {} vectors", state.len());
    let mut gso = IntegralGso::new(state.len(), delta);
    drive(state, &mut gso, control, stats).map_err(|halt| match halt {
        Halt::Fatal(e) => e,
        Halt::PrecisionLoss { .. } | Halt::Ambiguous { .. } => {
            unreachable!("the exact reduction can't lose precision")
        }
    })
}

/// Reduces `basis` exactly. The options have been checked already.
pub(crate) fn lll_integral(basis: &OwnedMatrix<Z>, options: &LllOptions) -> Result<Reduction<Z>> {
    let with_transform = options.want.needs_transform() || options.probe.is_some();
    let mut state = BasisState::new(Z, basis.clone(), options.representation, with_transform);
    let mut control = DriveControl {
        marked: options.marked,
        probe: options.probe,
        compaction_interval: options.compaction_interval,
    };
    let mut stats = Stats::default();
    let finish = reduce_exact(&mut state, &options.delta, &mut control, &mut stats)?;
    log::debug!(
        "exact reduction done: {} swaps, {} size reductions",
        stats.swaps,
        stats.reductions
    );
    Ok(Reduction::assemble(state, finish, &options.want, None, stats))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::LllError;
    use crate::params::{Representation, Want};
    use crate::vector::OwnedVector;
    use num_bigint::BigInt;

    fn combination(b: &OwnedMatrix<Z>, c: &OwnedVector<Z>) -> OwnedVector<Z> {
        b.rows()
            .zip(c.iter())
            .fold(OwnedVector::zero(b.num_cols()), |mut acc, (v, c)| {
                acc.mul_add_assign(c, v, &Z);
                acc
            })
    }

    #[test]
    fn probe_finds_relation() {
        // 3 b_0 - b_1 + b_2 = 0, which the reduction has to find.
        let b = OwnedMatrix::<Z>::from_rows(&[[1, 0, 5], [4, 1, 17], [1, 1, 2], [0, 7, 1]]);
        let options = LllOptions::default().with_probe(2);
        let r = lll_integral(&b, &options).unwrap();
        let rel = r.relation.unwrap();
        assert!(!rel.is_zero());
        assert!(combination(&b, &rel).is_zero());
    }

    #[test]
    fn kernel_of_gram_matrix() {
        let b = OwnedMatrix::<Z>::from_rows(&[[1, 1], [2, 2], [0, 1]]);
        let g = OwnedMatrix::<Z>::from_rows(&[[2, 4, 1], [4, 8, 2], [1, 2, 1]]);
        let options = LllOptions::default()
            .with_representation(Representation::Gram)
            .with_want(Want {
                basis: true,
                transform: false,
                kernel: true,
                image: false,
            });
        let r = lll_integral(&g, &options).unwrap();
        assert_eq!(r.rank, 2);
        let kernel = r.kernel.unwrap();
        assert_eq!(kernel.num_rows(), 1);
        let k = &kernel[0];
        assert!(!k.is_zero());
        assert_eq!(k[0], &k[1] * BigInt::from(-2));
        assert!(combination(&b, k).is_zero());

        // The reduced Gram matrix has a zero row and column for the
        // dependent vector.
        let basis = r.basis.unwrap();
        assert!(basis[0].is_zero());
    }

    #[test]
    fn marked_dependent_vector() {
        let want = Want {
            basis: true,
            transform: true,
            kernel: true,
            image: false,
        };

        let b = OwnedMatrix::<Z>::from_rows(&[[1, 0], [2, 0]]);
        let r = lll_integral(&b, &LllOptions::default().with_marked(1).with_want(want)).unwrap();
        assert_eq!(r.marked, Some(0));
        assert_eq!(r.rank, 1);
        assert_eq!(r.flags, vec![false, true]);
        let basis = r.basis.unwrap();
        assert!(basis[0].is_zero());
        assert_eq!(r.transform.unwrap().mul(&b, &Z), basis);
        assert_eq!(r.kernel.unwrap(), OwnedMatrix::from_rows(&[[-2, 1]]));

        // b_2 = b_0 + b_1.
        let b = OwnedMatrix::<Z>::from_rows(&[[1, 2, 3], [4, 5, 6], [5, 7, 9], [2, 0, 1]]);
        for marked in 0..4 {
            let options = LllOptions::default().with_marked(marked).with_want(want);
            let r = lll_integral(&b, &options).unwrap();
            assert_eq!(r.marked, Some(0));
            assert_eq!(r.rank, 3);
            let basis = r.basis.unwrap();
            assert_eq!(r.transform.unwrap().mul(&b, &Z), basis);
            let kernel = r.kernel.unwrap();
            assert_eq!(kernel.num_rows(), 1);
            assert!(combination(&b, &kernel[0]).is_zero());
        }
    }

    #[test]
    fn indefinite_gram_matrix_is_an_error() {
        let g = OwnedMatrix::<Z>::from_rows(&[[1, 2], [2, 1]]);
        let options = LllOptions::default().with_representation(Representation::Gram);
        assert_eq!(
            lll_integral(&g, &options).unwrap_err(),
            LllError::NotPositiveDefinite { index: 1 }
        );
    }
}
