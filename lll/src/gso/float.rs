use std::marker::PhantomData;

use num_bigint::BigUint;
use num_traits::One;

use crate::error::LllError;
use crate::lattice::WorkingTypeFor;
use crate::params::{Delta, GsoMethod, PrecisionConfig, Representation};
use crate::reduce::{BasisState, Halt, Orthogonalization};
use crate::rings::{Ring, RingElement as _};
use crate::scratch::ScratchPool;

/// How a [`FloatGso`] behaves, decided by the floating point driver.
#[derive(Clone, Debug)]
pub(crate) struct FloatSettings {
    pub method: GsoMethod,

    /// Report near ties instead of deciding them. Only makes sense for exact
    /// input which can be handed to the exact reduction.
    pub strict: bool,

    /// The number of swaps after which the attempt is abandoned.
    pub swap_budget: u64,
}

/// Approximate Gram-Schmidt data in the working type `W`.
pub(crate) struct FloatGso<R: Ring, W: WorkingTypeFor<R>> {
    wt: W,
    method: GsoMethod,
    strict: bool,

    /// The input is a Gram matrix, which may fail to be positive definite.
    gram: bool,

    delta: W::Element,
    half: W::Element,
    tie_window: W::Element,

    prec: Option<i64>,
    norm_margin: i64,
    rounding_margin: i64,

    mu: Vec<Vec<W::Element>>,

    /// Approximations of `|b*_k|^2`.
    norms: Vec<W::Element>,

    /// The top bit of `|b_k|^2` when `b*_k` was computed. The errors of the
    /// data of vector `k` grow with it.
    sqr_bits: Vec<i64>,

    /// Householder vectors, scaling factors and `r_kk` of the reflections.
    reflections: Vec<Vec<W::Element>>,
    beta: Vec<W::Element>,
    diag: Vec<W::Element>,

    swaps: u64,
    swap_budget: u64,

    pool: ScratchPool<W::Element>,
    ring: PhantomData<R>,
}

impl<R: Ring, W: WorkingTypeFor<R>> FloatGso<R, W> {
    pub fn new(
        n: usize,
        wt: W,
        representation: Representation,
        delta: &Delta,
        config: &PrecisionConfig,
        settings: &FloatSettings,
    ) -> Self {
        // Without the vectors there is nothing to reflect.
        let method = match representation {
            Representation::Gram => GsoMethod::Classical,
            Representation::Basis => settings.method,
        };

        let prec = wt.precision().map(i64::from);
        let delta_w = wt.div(
            wt.element_from_bigint(delta.num()),
            &wt.element_from_bigint(delta.den()),
        );
        let window_bits = prec.map_or(0, |p| (p - config.tie_margin_bits as i64).max(1));
        let tie_window = wt.div(
            W::one(),
            &wt.element_from_biguint(&(BigUint::one() << window_bits as u64)),
        );

        Self {
            half: wt.half(),
            delta: delta_w,
            tie_window,
            method,
            strict: settings.strict,
            gram: representation == Representation::Gram,
            prec,
            norm_margin: config.norm_margin_bits as i64,
            rounding_margin: config.rounding_margin_bits as i64,
            mu: vec![vec![W::zero(); n]; n],
            norms: vec![W::zero(); n],
            sqr_bits: vec![0; n],
            reflections: vec![Vec::new(); n],
            beta: vec![W::zero(); n],
            diag: vec![W::zero(); n],
            swaps: 0,
            swap_budget: settings.swap_budget,
            pool: ScratchPool::new(2),
            ring: PhantomData,
            wt,
        }
    }

    /// Number of swaps so far.
    #[cfg(test)]
    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    /// Is `|a - b|` tiny compared to `a` and `b`? The window is widened by
    /// `2^extra_bits` for values that are known to be less accurate.
    fn is_tie(&self, a: &W::Element, b: &W::Element, extra_bits: i64) -> bool {
        let wt = &self.wt;
        let diff = wt.abs(wt.sub(a.clone(), b));
        let size = if wt.is_abs_gt(a, b) { a } else { b };
        let mut bound = wt.mul(wt.abs(size.clone()), &self.tie_window);
        if extra_bits > 0 {
            let scale = wt.element_from_biguint(&(BigUint::one() << extra_bits as u64));
            bound = wt.mul(bound, &scale);
        }
        wt.is_le(&diff, &bound)
    }

    /// Is `norm`, computed by cancellation from the diagonal entry `s`,
    /// negative by more than its error? The error is below
    /// `2^(top(s) - prec + norm_margin)`.
    fn is_surely_negative(&self, s: &W::Element, norm: &W::Element) -> bool {
        let wt = &self.wt;
        if !wt.is_negative(norm) {
            return false;
        }
        match (self.prec, wt.top_bit(s), wt.top_bit(norm)) {
            (None, _, _) => true,
            (Some(prec), Some(top_s), Some(top_norm)) => {
                top_norm > top_s - prec + self.norm_margin
            }
            _ => false,
        }
    }

    /// How many more bits of `mu[k][j]` are unreliable than for a
    /// coefficient of vectors of similar length.
    fn mu_error_bits(&self, k: usize, j: usize) -> i64 {
        let norm = self.wt.top_bit(&self.norms[j]).unwrap_or(0);
        ((self.sqr_bits[k] - norm) / 2).max(0)
    }

    /// Classical Gram-Schmidt from inner products. Returns `<b_k, b_k>`.
    fn classical(&mut self, state: &BasisState<R>, k: usize) -> W::Element {
        let wt = &self.wt;

        // r[j] = <b_k, b*_j>
        let mut r = self.pool.acquire(k, W::zero());
        for j in 0..k {
            let mut s = wt.from_ring(&state.inner(k, j), &state.ring);
            for i in 0..j {
                wt.mul_sub_assign(&mut s, &self.mu[j][i], &r[i]);
            }
            self.mu[k][j] = wt.div(s.clone(), &self.norms[j]);
            r[j] = s;
        }

        let s = wt.from_ring(&state.inner(k, k), &state.ring);
        let mut norm = s.clone();
        for i in 0..k {
            wt.mul_sub_assign(&mut norm, &self.mu[k][i], &r[i]);
        }
        self.norms[k] = norm;
        s
    }

    /// Householder QR, one row at a time. Returns `<b_k, b_k>`.
    fn householder(&mut self, state: &BasisState<R>, k: usize) -> W::Element {
        let wt = &self.wt;
        let row = &state.basis[k];
        let m = row.dim();

        let mut x = self.pool.acquire(m, W::zero());
        for (xi, e) in x.iter_mut().zip(row.iter()) {
            *xi = wt.from_ring(e, &state.ring);
        }
        let s = x.iter().fold(W::zero(), |acc, e| wt.mul_add(acc, e, e));

        // Apply the previous reflections.
        for j in 0..k.min(m) {
            let v = &self.reflections[j];
            let dot = v
                .iter()
                .zip(&x[j..])
                .fold(W::zero(), |acc, (a, b)| wt.mul_add(acc, a, b));
            let f = wt.mul(dot, &self.beta[j]);
            for (xi, vi) in x[j..].iter_mut().zip(v) {
                wt.mul_sub_assign(xi, &f, vi);
            }
        }

        // More vectors than dimensions, this one has to be dependent.
        if k >= m {
            self.norms[k] = W::zero();
            return s;
        }

        for j in 0..k {
            self.mu[k][j] = wt.div(x[j].clone(), &self.diag[j]);
        }

        let sigma_sqr = x[k..].iter().fold(W::zero(), |acc, e| wt.mul_add(acc, e, e));
        self.norms[k] = sigma_sqr.clone();
        if sigma_sqr.is_zero() {
            return s;
        }

        // The reflection maps x[k..] to r_kk e_0 with r_kk = -sign(x_k) sigma.
        let sigma = wt.sqrt(&sigma_sqr);
        let rkk = if wt.is_negative(&x[k]) {
            sigma.clone()
        } else {
            wt.neg(sigma.clone())
        };
        let mut v = x[k..].to_vec();
        wt.sub_assign(&mut v[0], &rkk);
        let abs_xk = wt.abs(x[k].clone());
        self.beta[k] = wt.div(W::one(), &wt.add(sigma_sqr, &wt.mul(abs_xk, &sigma)));
        self.reflections[k] = v;
        self.diag[k] = rkk;
        s
    }
}

impl<R: Ring, W: WorkingTypeFor<R>> Orthogonalization<R> for FloatGso<R, W> {
    fn orthogonalize(&mut self, state: &BasisState<R>, k: usize) -> Result<(), Halt> {
        let s = match self.method {
            GsoMethod::Classical => self.classical(state, k),
            GsoMethod::Householder => self.householder(state, k),
        };

        let wt = &self.wt;
        self.sqr_bits[k] = wt.top_bit(&s).unwrap_or(0);
        let norm = &self.norms[k];
        if !wt.is_positive(norm) {
            if self.strict {
                return Err(Halt::Ambiguous { at: k });
            }
            if self.gram && self.is_surely_negative(&s, norm) {
                return Err(Halt::Fatal(LllError::NotPositiveDefinite { index: k }));
            }
            return Err(Halt::PrecisionLoss {
                at: k,
                reason: "non-positive squared norm",
            });
        }

        if let (Some(prec), Some(top_s), Some(top_norm)) =
            (self.prec, wt.top_bit(&s), wt.top_bit(norm))
        {
            if top_s - top_norm > prec - self.norm_margin {
                return Err(Halt::PrecisionLoss {
                    at: k,
                    reason: "cancellation in squared norm",
                });
            }
        }

        Ok(())
    }

    fn size_reduce(
        &mut self,
        state: &mut BasisState<R>,
        k: usize,
        l: usize,
    ) -> Result<bool, Halt> {
        let wt = &self.wt;
        let mu = &self.mu[k][l];
        let error_bits = if self.strict { self.mu_error_bits(k, l) } else { 0 };

        if wt.is_abs_le(mu, &self.half) {
            if self.strict && self.is_tie(&wt.abs(mu.clone()), &self.half, error_bits) {
                return Err(Halt::Ambiguous { at: k });
            }
            return Ok(false);
        }

        if let (Some(prec), Some(top)) = (self.prec, wt.top_bit(mu)) {
            if top > prec - self.rounding_margin {
                return Err(Halt::PrecisionLoss {
                    at: k,
                    reason: "coefficient too large to round",
                });
            }
        }

        let q = wt.round_nearest(mu);
        let qw = wt.element_from_bigint(&q);
        if self.strict {
            // The error of mu is relative to its size, not to the fraction.
            let frac = wt.abs(wt.sub(mu.clone(), &qw));
            let size_bits = wt.top_bit(mu).unwrap_or(0).max(0);
            if self.is_tie(&frac, &self.half, error_bits + size_bits) {
                return Err(Halt::Ambiguous { at: k });
            }
        }

        state.reduce_by(k, l, &q);
        let (low, high) = self.mu.split_at_mut(k);
        let (row_k, row_l) = (&mut high[0], &low[l]);
        wt.sub_assign(&mut row_k[l], &qw);
        for i in 0..l {
            wt.mul_sub_assign(&mut row_k[i], &qw, &row_l[i]);
        }

        // Large multipliers amplify the errors in the updated coefficients,
        // recompute them from the vector instead.
        let recompute = match (self.prec, wt.top_bit(&qw)) {
            (Some(prec), Some(top)) => 2 * top > prec,
            _ => false,
        };
        if recompute {
            self.orthogonalize(state, k)?;
        }

        Ok(true)
    }

    fn swap(
        &mut self,
        state: &mut BasisState<R>,
        k: usize,
        computed: usize,
    ) -> Result<Option<usize>, Halt> {
        let wt = &self.wt;
        let prev = &self.norms[k - 1];
        let mu = &self.mu[k][k - 1];

        // delta |b*_{k-1}|^2 > |b*_k|^2 + mu^2 |b*_{k-1}|^2
        let lhs = wt.mul(self.delta.clone(), prev);
        let rhs = wt.add(self.norms[k].clone(), &wt.mul(wt.square(mu.clone()), prev));
        if self.strict {
            let cancelled = self.sqr_bits[k] - wt.top_bit(&self.norms[k]).unwrap_or(0);
            let error_bits = cancelled.max(self.mu_error_bits(k, k - 1));
            if self.is_tie(&lhs, &rhs, error_bits) {
                return Err(Halt::Ambiguous { at: k });
            }
        }
        if !wt.is_gt(&lhs, &rhs) {
            return Ok(None);
        }

        self.swaps += 1;
        if self.swaps > self.swap_budget {
            return Err(Halt::PrecisionLoss {
                at: k,
                reason: "swap budget exhausted",
            });
        }

        state.swap(k - 1, k);

        // The data of both vectors is stale now.
        Ok(Some(computed.min(k - 1)))
    }

    fn is_resolved(&self, _: usize) -> bool {
        true
    }

    fn is_null(&self, _: usize) -> bool {
        false
    }

    fn compact(&mut self) {
        self.pool.compact();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lattice::{gram_schmidt, is_lll_reduced};
    use crate::matrix::OwnedMatrix;
    use crate::reduce::{DriveControl, Stats, drive};
    use crate::rings::{F64, Q, Reals, Z};
    use num_bigint::BigInt;
    use num_rational::BigRational;
    use num_traits::ToPrimitive;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn settings(method: GsoMethod, strict: bool) -> FloatSettings {
        FloatSettings {
            method,
            strict,
            swap_budget: u64::MAX,
        }
    }

    fn engine<W: WorkingTypeFor<Z>>(
        n: usize,
        wt: W,
        representation: Representation,
        settings: &FloatSettings,
    ) -> FloatGso<Z, W> {
        FloatGso::new(
            n,
            wt,
            representation,
            &Delta::new(3, 4).unwrap(),
            &PrecisionConfig::default(),
            settings,
        )
    }

    #[test]
    fn matches_exact_gram_schmidt() {
        let b = OwnedMatrix::<Z>::from_rows(&[[3, 1, 4, 1], [5, 9, 2, 6], [5, 3, 5, 8]]);
        let (bstar, mu) = gram_schmidt(b.transform::<Q, _>(|e| BigRational::from_integer(e.clone())), &Q);
        let to_f64 = |q: &BigRational| q.to_f64().unwrap();

        for (representation, method) in [
            (Representation::Basis, GsoMethod::Householder),
            (Representation::Basis, GsoMethod::Classical),
            (Representation::Gram, GsoMethod::Householder),
        ] {
            let input = match representation {
                Representation::Basis => b.clone(),
                Representation::Gram => crate::gram::gram_matrix(&b, &Z),
            };
            let state = BasisState::new(Z, input, representation, false);
            let mut gso = engine(3, F64, representation, &settings(method, false));
            for k in 0..3 {
                gso.orthogonalize(&state, k).unwrap();
            }

            for k in 0..3 {
                let norm = to_f64(&bstar[k].norm_sqr(&Q));
                assert!((gso.norms[k] - norm).abs() < 1e-9 * norm);
                for j in 0..k {
                    assert!((gso.mu[k][j] - to_f64(&mu[k][j])).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn reduces_random_lattices() {
        let mut rng = StdRng::seed_from_u64(7);
        let delta = Delta::new(3, 4).unwrap();
        for method in [GsoMethod::Householder, GsoMethod::Classical] {
            for _ in 0..10 {
                let n = rng.random_range(2..8);
                let b = OwnedMatrix::<Z>::from_iter(
                    n,
                    n + 1,
                    (0..n * (n + 1)).map(|_| BigInt::from(rng.random_range(-10000i64..10000))),
                );
                let mut state = BasisState::new(Z, b.clone(), Representation::Basis, true);
                let mut gso = FloatGso::new(
                    n,
                    Reals::new(128),
                    Representation::Basis,
                    &delta,
                    &PrecisionConfig::default(),
                    &settings(method, false),
                );
                let mut control = DriveControl::default();
                drive(&mut state, &mut gso, &mut control, &mut Stats::default()).unwrap();
                assert!(is_lll_reduced(&state.basis, &delta));
                assert_eq!(state.transform.unwrap().mul(&b, &Z), state.basis);
            }
        }
    }

    #[test]
    fn ties_are_reported_for_exact_input() {
        // mu = 1/2 exactly.
        let b = OwnedMatrix::<Z>::from_rows(&[[2, 0], [1, 3]]);
        let mut control = DriveControl::default();

        let mut state = BasisState::new(Z, b.clone(), Representation::Basis, true);
        let mut gso = engine(2, F64, Representation::Basis, &settings(GsoMethod::Householder, true));
        assert!(matches!(
            drive(&mut state, &mut gso, &mut control, &mut Stats::default()),
            Err(Halt::Ambiguous { at: 1 })
        ));

        let mut state = BasisState::new(Z, b, Representation::Basis, true);
        let mut gso = engine(2, F64, Representation::Basis, &settings(GsoMethod::Householder, false));
        assert!(drive(&mut state, &mut gso, &mut control, &mut Stats::default()).is_ok());
    }

    #[test]
    fn dependent_vectors_are_not_decided() {
        let b = OwnedMatrix::<Z>::from_rows(&[[1, 2], [2, 4]]);
        let mut control = DriveControl::default();

        let mut state = BasisState::new(Z, b.clone(), Representation::Basis, false);
        let mut gso = engine(2, F64, Representation::Basis, &settings(GsoMethod::Classical, false));
        assert!(matches!(
            drive(&mut state, &mut gso, &mut control, &mut Stats::default()),
            Err(Halt::PrecisionLoss { .. })
        ));

        let mut state = BasisState::new(Z, b, Representation::Basis, false);
        let mut gso = engine(2, F64, Representation::Basis, &settings(GsoMethod::Classical, true));
        assert!(matches!(
            drive(&mut state, &mut gso, &mut control, &mut Stats::default()),
            Err(Halt::Ambiguous { .. })
        ));
    }

    #[test]
    fn swap_budget() {
        let b = OwnedMatrix::<Z>::from_rows(&[[10, 0], [0, 1]]);
        let mut state = BasisState::new(Z, b, Representation::Basis, false);
        let mut gso = engine(
            2,
            F64,
            Representation::Basis,
            &FloatSettings {
                swap_budget: 0,
                ..settings(GsoMethod::Householder, false)
            },
        );
        assert!(matches!(
            drive(&mut state, &mut gso, &mut DriveControl::default(), &mut Stats::default()),
            Err(Halt::PrecisionLoss {
                reason: "swap budget exhausted",
                ..
            })
        ));
        assert_eq!(gso.swaps(), 1);
    }
}
