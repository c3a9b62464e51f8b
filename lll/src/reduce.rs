//! The part of LLL that doesn't care how the Gram-Schmidt data is stored.
//!
//! [`drive`] is the loop that walks the index `k` through the basis, asks the
//! [`Orthogonalization`] to size reduce and to swap, and keeps track of the
//! marked vector. The exact and the floating point reduction both run this
//! loop, they differ only in the engine behind it.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::error::LllError;
use crate::matrix::OwnedMatrix;
use crate::params::Representation;
use crate::rings::{Ring, Z};
use crate::scratch::Checkpoint;
use crate::vector::OwnedVector;

/// The vectors being reduced and the transform accumulated so far.
pub(crate) struct BasisState<R: Ring> {
    pub ring: R,

    /// The basis vectors (rows), or their Gram matrix.
    pub basis: OwnedMatrix<R>,

    pub representation: Representation,

    /// `basis = transform * (basis at the start)`.
    pub transform: Option<OwnedMatrix<Z>>,
}

impl<R: Ring> BasisState<R> {
    pub fn new(
        ring: R,
        basis: OwnedMatrix<R>,
        representation: Representation,
        with_transform: bool,
    ) -> Self {
        let n = basis.num_rows();
        Self {
            ring,
            basis,
            representation,
            transform: with_transform.then(|| OwnedMatrix::identity(n)),
        }
    }

    /// The number of vectors.
    pub fn len(&self) -> usize {
        self.basis.num_rows()
    }

    /// The inner product of vectors `i` and `j`.
    pub fn inner(&self, i: usize, j: usize) -> R::Element {
        match self.representation {
            Representation::Basis => self.basis[i].dot(&self.basis[j], &self.ring),
            Representation::Gram => self.basis[(i, j)].clone(),
        }
    }

    /// `b_k -= q * b_l`.
    pub fn reduce_by(&mut self, k: usize, l: usize, q: &BigInt) {
        let c = self.ring.element_from_bigint(q);
        self.basis.row_multiply_sub(k, l, &c, &self.ring);
        if self.representation == Representation::Gram {
            self.basis.col_multiply_sub(k, l, &c, &self.ring);
        }
        if let Some(t) = &mut self.transform {
            t.row_multiply_sub(k, l, q, &Z);
        }
    }

    /// Exchanges vectors `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.basis.swap_rows(i, j);
        if self.representation == Representation::Gram {
            self.basis.swap_columns(i, j);
        }
        if let Some(t) = &mut self.transform {
            t.swap_rows(i, j);
        }
    }

    /// Moves vector `i` to the front, keeping the order of the others.
    pub fn rotate_to_front(&mut self, i: usize) {
        for j in (1..=i).rev() {
            self.swap(j - 1, j);
        }
    }
}

/// Why an attempt stopped before the basis was reduced.
#[derive(Debug)]
pub(crate) enum Halt {
    /// The floating point approximations became unreliable at vector `at`.
    PrecisionLoss { at: usize, reason: &'static str },

    /// A decision at vector `at` was too close to call at the current
    /// precision. Only raised for exact input, where it most likely is an
    /// exact tie (or a dependency) that more precision won't resolve.
    Ambiguous { at: usize },

    /// Something is wrong with the input.
    Fatal(LllError),
}

impl From<LllError> for Halt {
    fn from(e: LllError) -> Self {
        Self::Fatal(e)
    }
}

/// The Gram-Schmidt data of a basis that is being reduced.
pub(crate) trait Orthogonalization<R: Ring> {
    /// Computes the Gram-Schmidt data of vector `k` from the data of the
    /// previous vectors.
    fn orthogonalize(&mut self, state: &BasisState<R>, k: usize) -> Result<(), Halt>;

    /// Size reduces vector `k` with vector `l < k`. Returns whether the
    /// basis was changed.
    fn size_reduce(&mut self, state: &mut BasisState<R>, k: usize, l: usize)
    -> Result<bool, Halt>;

    /// Swaps vectors `k - 1` and `k` if the Lovász condition fails.
    /// `computed` is the number of vectors with Gram-Schmidt data. Returns
    /// that number after the swap, or `None` if nothing was swapped.
    fn swap(
        &mut self,
        state: &mut BasisState<R>,
        k: usize,
        computed: usize,
    ) -> Result<Option<usize>, Halt>;

    /// Is vector `k` known to be dependent on the previous ones?
    fn is_resolved(&self, k: usize) -> bool;

    /// Is vector `k` known to be the zero vector?
    fn is_null(&self, k: usize) -> bool;

    /// Gives back scratch space.
    fn compact(&mut self);
}

/// Counters of a reduction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of size reductions that changed the basis.
    pub reductions: u64,

    /// Number of swaps.
    pub swaps: u64,

    /// Number of times the loop visited a vector.
    pub visits: u64,
}

impl Stats {
    pub(crate) fn made_progress(&self) -> bool {
        self.reductions != 0 || self.swaps != 0
    }

    pub(crate) fn add(&mut self, other: &Stats) {
        self.reductions += other.reductions;
        self.swaps += other.swaps;
        self.visits += other.visits;
    }
}

/// What to do besides reducing.
#[derive(Clone, Debug, Default)]
pub(crate) struct DriveControl {
    /// The current position of the marked vector. Kept up to date even if
    /// the loop halts, so a later attempt can continue from there.
    pub marked: Option<usize>,
    pub probe: Option<usize>,
    pub compaction_interval: usize,
}

/// How the loop ended.
#[derive(Clone, Debug)]
pub(crate) struct Finish {
    /// Which vectors are independent of the ones before them.
    pub flags: Vec<bool>,

    /// Where the marked vector ended up.
    pub marked: Option<usize>,

    /// The null vector whose transform row shows that the probed vector is
    /// dependent, if there is one.
    pub probe_hit: Option<usize>,
}

/// Runs LLL on `state` with the Gram-Schmidt data of `engine`.
pub(crate) fn drive<R: Ring, E: Orthogonalization<R>>(
    state: &mut BasisState<R>,
    engine: &mut E,
    control: &mut DriveControl,
    stats: &mut Stats,
) -> Result<Finish, Halt> {
    let n = state.len();
    let mut checkpoint = Checkpoint::new(control.compaction_interval);

    // The probed input vector is dependent once some null vector needs it.
    let probe = control.probe;
    let probe_hit = |engine: &E, state: &BasisState<R>, slot: usize| {
        match (probe, &state.transform) {
            (Some(p), Some(t)) => engine.is_null(slot) && !t[(slot, p)].is_zero(),
            _ => false,
        }
    };

    if n == 0 {
        return Ok(Finish {
            flags: Vec::new(),
            marked: control.marked,
            probe_hit: None,
        });
    }

    engine.orthogonalize(state, 0)?;
    let mut computed = 1;
    let mut k = 1;
    let mut hit = probe_hit(&*engine, &*state, 0).then_some(0);

    while k < n && hit.is_none() {
        stats.visits += 1;
        if checkpoint.tick() {
            engine.compact();
        }

        while computed <= k {
            engine.orthogonalize(state, computed)?;
            computed += 1;
        }

        // The marked vector is left alone only once it is independent of
        // the vectors before it.
        let keep = control.marked == Some(k) && engine.is_resolved(k);
        if !keep && engine.size_reduce(state, k, k - 1)? {
            stats.reductions += 1;
        }

        if let Some(c) = engine.swap(state, k, computed)? {
            stats.swaps += 1;
            control.marked = match control.marked {
                Some(m) if m == k => Some(k - 1),
                Some(m) if m == k - 1 => Some(k),
                m => m,
            };
            computed = c;
            k = (k - 1).max(1);
            continue;
        }

        if !keep {
            for l in (0..k - 1).rev() {
                if engine.size_reduce(state, k, l)? {
                    stats.reductions += 1;
                }
            }
        }

        if probe_hit(&*engine, &*state, k) {
            hit = Some(k);
        }
        k += 1;
    }

    // Null vectors can also appear at positions that were checked before.
    if hit.is_none() {
        hit = (0..computed).find(|&s| probe_hit(&*engine, &*state, s));
    }

    // Vectors the loop never reached (only when stopping early) count as
    // independent.
    let mut flags: Vec<bool> = (0..n)
        .map(|i| i >= computed || engine.is_resolved(i))
        .collect();

    if let Some(m) = control.marked.filter(|&m| m != 0) {
        log::debug!("moving marked vector from {m} to the front");
        state.rotate_to_front(m);
        flags[..=m].rotate_right(1);
        control.marked = Some(0);
        hit = hit.map(|h| match h {
            h if h == m => 0,
            h if h < m => h + 1,
            h => h,
        });
    }

    Ok(Finish {
        flags,
        marked: control.marked,
        probe_hit: hit,
    })
}

/// The result of a reduction.
#[derive(Clone, Debug)]
pub struct Reduction<R: Ring> {
    /// The reduced basis, or `H G Hᵀ` for Gram matrix input.
    pub basis: Option<OwnedMatrix<R>>,

    /// The unimodular transform `H` with `basis = H * input`.
    pub transform: Option<OwnedMatrix<Z>>,

    /// Integer relations among the input vectors, one per dependency.
    pub kernel: Option<OwnedMatrix<Z>>,

    /// The transform rows of the independent output vectors.
    pub image: Option<OwnedMatrix<Z>>,

    /// `flags[i]` is false iff output vector `i` depends on the vectors
    /// before it (it is zero then).
    pub flags: Vec<bool>,

    /// The rank of the input.
    pub rank: usize,

    /// The precision of the floating point reduction that produced the
    /// result, `None` if the result was computed exactly.
    pub precision: Option<u32>,

    /// Where the marked vector ended up.
    pub marked: Option<usize>,

    /// If a probed vector was found to be dependent, the integer relation
    /// expressing that.
    pub relation: Option<OwnedVector<Z>>,

    pub stats: Stats,
}

impl<R: Ring> Reduction<R> {
    /// Packages the state after [`drive`] according to `want`.
    pub(crate) fn assemble(
        state: BasisState<R>,
        finish: Finish,
        want: &crate::params::Want,
        precision: Option<u32>,
        stats: Stats,
    ) -> Self {
        let Finish {
            flags,
            marked,
            probe_hit,
        } = finish;

        let rank = flags.iter().filter(|f| **f).count();
        let transform = state.transform;

        let select = |t: &OwnedMatrix<Z>, keep: bool| {
            let rows = t
                .rows()
                .zip(&flags)
                .filter(|(_, f)| **f == keep)
                .map(|(r, _)| r.clone())
                .collect();
            OwnedMatrix::from_row_vectors(rows, t.num_cols())
        };

        let kernel = transform
            .as_ref()
            .filter(|_| want.kernel)
            .map(|t| select(t, false));
        let image = transform
            .as_ref()
            .filter(|_| want.image)
            .map(|t| select(t, true));
        let relation = probe_hit.and_then(|h| transform.as_ref().map(|t| t[h].clone()));

        Self {
            basis: want.basis.then_some(state.basis),
            transform: transform.filter(|_| want.transform),
            kernel,
            image,
            flags,
            rank,
            precision,
            marked,
            relation,
            stats,
        }
    }

    /// Converts the basis to a different ring, e.g. back to the type of the
    /// input.
    pub(crate) fn map_basis<U: Ring>(self, f: impl FnOnce(OwnedMatrix<R>) -> OwnedMatrix<U>) -> Reduction<U> {
        Reduction {
            basis: self.basis.map(f),
            transform: self.transform,
            kernel: self.kernel,
            image: self.image,
            flags: self.flags,
            rank: self.rank,
            precision: self.precision,
            marked: self.marked,
            relation: self.relation,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::Want;

    /// Swaps whenever the second vector has a smaller first entry.
    /// Just enough to check the bookkeeping of the loop.
    struct SortByFirst;

    impl Orthogonalization<Z> for SortByFirst {
        fn orthogonalize(&mut self, _: &BasisState<Z>, _: usize) -> Result<(), Halt> {
            Ok(())
        }

        fn size_reduce(&mut self, _: &mut BasisState<Z>, _: usize, _: usize) -> Result<bool, Halt> {
            Ok(false)
        }

        fn swap(
            &mut self,
            state: &mut BasisState<Z>,
            k: usize,
            computed: usize,
        ) -> Result<Option<usize>, Halt> {
            if state.basis[(k, 0)] < state.basis[(k - 1, 0)] {
                state.swap(k - 1, k);
                Ok(Some(computed))
            } else {
                Ok(None)
            }
        }

        fn is_resolved(&self, _: usize) -> bool {
            true
        }

        fn is_null(&self, _: usize) -> bool {
            false
        }

        fn compact(&mut self) {}
    }

    #[test]
    fn marked_vector_is_followed() {
        let basis = OwnedMatrix::<Z>::from_rows(&[[3], [1], [4], [2]]);
        let mut state = BasisState::new(Z, basis, Representation::Basis, true);
        let mut control = DriveControl {
            marked: Some(2),
            ..Default::default()
        };
        let mut stats = Stats::default();
        let finish = drive(&mut state, &mut SortByFirst, &mut control, &mut stats).unwrap();

        // Sorted is [1, 2, 3, 4] with the marked 4 moved to the front.
        assert_eq!(state.basis, OwnedMatrix::from_rows(&[[4], [1], [2], [3]]));
        assert_eq!(finish.marked, Some(0));
        assert_eq!(
            state.transform.unwrap(),
            OwnedMatrix::from_rows(&[[0, 0, 1, 0], [0, 1, 0, 0], [0, 0, 0, 1], [1, 0, 0, 0]])
        );
        assert_eq!(stats.swaps, 3);
    }

    #[test]
    fn gram_state_operations() {
        // Gram matrix of [1, 0], [1, 1].
        let gram = OwnedMatrix::<Z>::from_rows(&[[1, 1], [1, 2]]);
        let mut state = BasisState::new(Z, gram, Representation::Gram, true);
        state.reduce_by(1, 0, &BigInt::from(1));
        assert_eq!(state.basis, OwnedMatrix::from_rows(&[[1, 0], [0, 1]]));
        assert_eq!(state.inner(0, 1), BigInt::from(0));
        state.swap(0, 1);
        assert_eq!(
            state.transform.as_ref().unwrap(),
            &OwnedMatrix::from_rows(&[[-1, 1], [1, 0]])
        );
    }

    #[test]
    fn assemble_splits_kernel_and_image() {
        let basis = OwnedMatrix::<Z>::from_rows(&[[0, 0], [1, 2]]);
        let mut state = BasisState::new(Z, basis, Representation::Basis, true);
        state.transform = Some(OwnedMatrix::from_rows(&[[2, -1], [0, 1]]));
        let finish = Finish {
            flags: vec![false, true],
            marked: None,
            probe_hit: Some(0),
        };
        let want = Want {
            basis: false,
            transform: false,
            kernel: true,
            image: true,
        };
        let r = Reduction::assemble(state, finish, &want, None, Stats::default());
        assert!(r.basis.is_none() && r.transform.is_none());
        assert_eq!(r.rank, 1);
        assert_eq!(r.kernel.unwrap(), OwnedMatrix::from_rows(&[[2, -1]]));
        assert_eq!(r.image.unwrap(), OwnedMatrix::from_rows(&[[0, 1]]));
        assert_eq!(r.relation.unwrap(), [2, -1].map(BigInt::from));
    }
}
