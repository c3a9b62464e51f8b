use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::error::LllError;
use crate::params::Delta;
use crate::reduce::{BasisState, Halt, Orthogonalization};
use crate::rings::Z;
use crate::scratch::ScratchPool;

/// Fraction-free Gram-Schmidt data of an integer basis.
///
/// With `b*` the orthogonalized vectors, `d[0] = 1` and
/// `d[k + 1] = d[k] * |b*_k|^2` (or `d[k]` if `b*_k = 0`), the coefficients
/// are `mu[k][j] = lambda[k][j] / d[j + 1]`. All `lambda` and `d` are
/// integers, every division in the updates below is exact.
pub(crate) struct IntegralGso {
    lambda: Vec<Vec<BigInt>>,
    d: Vec<BigInt>,

    /// Whether `b*_k` is non-zero.
    resolved: Vec<bool>,

    delta: Delta,
    pool: ScratchPool<BigInt>,
}

impl IntegralGso {
    pub fn new(n: usize, delta: &Delta) -> Self {
        let mut d = vec![BigInt::zero(); n + 1];
        d[0] = BigInt::one();
        Self {
            lambda: vec![vec![BigInt::zero(); n]; n],
            d,
            resolved: vec![false; n],
            delta: delta.clone(),
            pool: ScratchPool::new(2),
        }
    }

    /// The denominators `d[0..=n]`.
    #[cfg(test)]
    pub fn denominators(&self) -> &[BigInt] {
        &self.d
    }
}

impl Orthogonalization<Z> for IntegralGso {
    fn orthogonalize(&mut self, state: &BasisState<Z>, k: usize) -> Result<(), Halt> {
        let mut u = self.pool.acquire(k + 1, BigInt::zero());
        for j in 0..=k {
            if j == k || self.resolved[j] {
                u[j] = state.inner(k, j);
            }
        }

        for j in 0..=k {
            if j < k && !self.resolved[j] {
                self.lambda[k][j].set_zero();
                continue;
            }

            let mut uj = std::mem::take(&mut u[j]);
            for i in (0..j).filter(|&i| self.resolved[i]) {
                let t = &self.d[i + 1] * uj - &self.lambda[k][i] * &self.lambda[j][i];
                uj = Z::div_exact(&t, &self.d[i]);
            }

            if j < k {
                self.lambda[k][j] = uj;
                continue;
            }

            if uj.is_positive() {
                self.resolved[k] = true;
                self.d[k + 1] = uj;
            } else if uj.is_zero() {
                self.resolved[k] = false;
                self.d[k + 1] = self.d[k].clone();
            } else {
                return Err(LllError::NotPositiveDefinite { index: k }.into());
            }
        }

        Ok(())
    }

    fn size_reduce(
        &mut self,
        state: &mut BasisState<Z>,
        k: usize,
        l: usize,
    ) -> Result<bool, Halt> {
        // |mu| <= 1/2 <=> |2 lambda| <= d.
        let d = &self.d[l + 1];
        let lambda = &self.lambda[k][l];
        if !self.resolved[l] || (lambda << 1u32).magnitude() <= d.magnitude() {
            return Ok(false);
        }

        let q = Z::round_fraction(lambda, d);
        state.reduce_by(k, l, &q);

        let (low, high) = self.lambda.split_at_mut(k);
        let (row_k, row_l) = (&mut high[0], &low[l]);
        row_k[l] -= &q * d;
        for i in (0..l).filter(|&i| self.resolved[i]) {
            row_k[i] -= &q * &row_l[i];
        }

        Ok(true)
    }

    fn swap(
        &mut self,
        state: &mut BasisState<Z>,
        k: usize,
        computed: usize,
    ) -> Result<Option<usize>, Halt> {
        if !self.resolved[k - 1] {
            return Ok(None);
        }

        let la = self.lambda[k][k - 1].clone();
        let d_old = self.d[k].clone();

        if self.resolved[k] {
            // Lovász condition in integers:
            // delta d[k]^2 <= d[k-1] d[k+1] + lambda^2.
            let q = &la * &la + &self.d[k - 1] * &self.d[k + 1];
            if self.delta.num() * &d_old * &d_old <= self.delta.den() * &q {
                return Ok(None);
            }

            self.d[k] = Z::div_exact(&q, &d_old);
            for i in k + 1..computed {
                let t = self.lambda[i][k].clone();
                let prev = &self.lambda[i][k - 1];
                let new_k = &self.d[k + 1] * prev - &la * &t;
                let new_prev = &la * prev + &self.d[k - 1] * &t;
                self.lambda[i][k] = Z::div_exact(&new_k, &d_old);
                self.lambda[i][k - 1] = Z::div_exact(&new_prev, &d_old);
            }
        } else if !la.is_zero() {
            // The dependent vector moves down and takes over the role of
            // b_{k-1}, so b*_{k-1} gets shorter by the factor p / d_old.
            let p = Z::div_exact(&(&la * &la), &d_old);
            self.d[k] = p.clone();
            self.d[k + 1] = p.clone();
            for v in k + 2..=computed {
                self.d[v] = Z::div_exact(&(&p * &self.d[v]), &d_old);
            }
            for i in k + 1..computed {
                self.lambda[i][k - 1] = Z::div_exact(&(&la * &self.lambda[i][k - 1]), &d_old);
            }
            for j in k + 1..computed {
                for i in j + 1..computed {
                    self.lambda[i][j] = Z::div_exact(&(&p * &self.lambda[i][j]), &d_old);
                }
            }
        } else {
            for i in k + 1..computed {
                let prev = std::mem::take(&mut self.lambda[i][k - 1]);
                self.lambda[i][k] = prev;
            }
            self.d[k] = self.d[k - 1].clone();
            self.resolved.swap(k - 1, k);
        }

        let (low, high) = self.lambda.split_at_mut(k);
        low[k - 1][..k - 1].swap_with_slice(&mut high[0][..k - 1]);
        state.swap(k - 1, k);

        Ok(Some(computed))
    }

    fn is_resolved(&self, k: usize) -> bool {
        self.resolved[k]
    }

    fn is_null(&self, k: usize) -> bool {
        !self.resolved[k]
            && (0..k).all(|j| !self.resolved[j] || self.lambda[k][j].is_zero())
    }

    fn compact(&mut self) {
        self.pool.compact();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lattice::is_lll_reduced;
    use crate::matrix::OwnedMatrix;
    use crate::params::Representation;
    use crate::reduce::{DriveControl, Stats, drive};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn orthogonalize_all(state: &BasisState<Z>, delta: &Delta) -> IntegralGso {
        let mut gso = IntegralGso::new(state.len(), delta);
        for k in 0..state.len() {
            gso.orthogonalize(state, k).unwrap();
        }
        gso
    }

    fn reduce(basis: OwnedMatrix<Z>, delta: &Delta) -> (BasisState<Z>, IntegralGso) {
        let n = basis.num_rows();
        let mut state = BasisState::new(Z, basis, Representation::Basis, true);
        let mut gso = IntegralGso::new(n, delta);
        let mut control = DriveControl {
            compaction_interval: 8,
            ..Default::default()
        };
        drive(&mut state, &mut gso, &mut control, &mut Stats::default()).unwrap();
        (state, gso)
    }

    #[test]
    fn denominators_are_gram_minors() {
        let b = OwnedMatrix::<Z>::from_rows(&[[1, 2, 3], [3, 4, 5], [4, 6, 8], [0, 1, 7]]);
        let state = BasisState::new(Z, b, Representation::Basis, false);
        let gso = orthogonalize_all(&state, &Delta::default());

        // The third vector is the sum of the first two.
        assert_eq!(gso.resolved, [true, true, false, true]);

        // d[1] = |b_0|^2, d[2] = det of the 2x2 Gram minor.
        let d = gso.denominators();
        assert_eq!(d[1], BigInt::from(14));
        assert_eq!(d[2], BigInt::from(14 * 50 - 26 * 26));
        assert_eq!(d[3], d[2]);
        assert!(d[4].is_positive());
        assert!(!gso.is_null(2));
    }

    #[test]
    fn gram_input_must_be_semidefinite() {
        let g = OwnedMatrix::<Z>::from_rows(&[[1, 2], [2, 1]]);
        let state = BasisState::new(Z, g, Representation::Gram, false);
        let mut gso = IntegralGso::new(2, &Delta::default());
        gso.orthogonalize(&state, 0).unwrap();
        assert!(matches!(
            gso.orthogonalize(&state, 1),
            Err(Halt::Fatal(LllError::NotPositiveDefinite { index: 1 }))
        ));
    }

    #[test]
    fn updates_stay_exact() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let delta = Delta::new(3, 4).unwrap();
        for i in 0..30 {
            let n = rng.random_range(2..7);
            let b = if i % 3 == 0 {
                // Fewer generators than vectors, so some swaps have to deal
                // with dependent vectors.
                let rank = rng.random_range(1..n);
                let generators = OwnedMatrix::<Z>::from_iter(
                    rank,
                    n,
                    (0..rank * n).map(|_| BigInt::from(rng.random_range(-30i64..30))),
                );
                let coefficients = OwnedMatrix::<Z>::from_iter(
                    n,
                    rank,
                    (0..n * rank).map(|_| BigInt::from(rng.random_range(-4i64..4))),
                );
                coefficients.mul(&generators, &Z)
            } else {
                OwnedMatrix::<Z>::from_iter(
                    n,
                    n,
                    (0..n * n).map(|_| BigInt::from(rng.random_range(-1000i64..1000))),
                )
            };
            let input = b.clone();
            let (state, gso) = reduce(b, &delta);
            assert!(is_lll_reduced(&state.basis, &delta));
            assert_eq!(state.transform.as_ref().unwrap().mul(&input, &Z), state.basis);

            // The updated data is what orthogonalizing from scratch gives.
            // Coefficients with respect to dependent vectors are never read,
            // so only those of the resolved ones are compared.
            let fresh = orthogonalize_all(&state, &delta);
            assert_eq!(fresh.resolved, gso.resolved);
            assert_eq!(fresh.d, gso.d);
            for k in 0..n {
                for j in (0..k).filter(|&j| gso.resolved[j]) {
                    assert_eq!(fresh.lambda[k][j], gso.lambda[k][j], "lambda[{k}][{j}]");
                }
            }
        }
    }

    #[test]
    fn dependent_vectors_become_zero() {
        let b = OwnedMatrix::<Z>::from_rows(&[[1, 2, 3], [3, 4, 5], [4, 6, 8], [2, 2, 2]]);
        let input = b.clone();
        let delta = Delta::default();
        let (state, gso) = reduce(b, &delta);

        // Rank 2, so the first two vectors are zero.
        assert_eq!(gso.resolved, [false, false, true, true]);
        assert!(state.basis[0].is_zero() && state.basis[1].is_zero());
        assert!(gso.is_null(0) && gso.is_null(1));
        assert!(is_lll_reduced(&state.basis, &delta));

        let h = state.transform.unwrap();
        for i in 0..2 {
            assert!(!h[i].is_zero());
            let v = input
                .rows()
                .zip(h[i].iter())
                .fold(crate::vector::OwnedVector::<Z>::zero(3), |mut acc, (r, c)| {
                    acc.mul_add_assign(c, r, &Z);
                    acc
                });
            assert!(v.is_zero());
        }
    }
}
