//! Parameters of the reductions.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;

use crate::error::{LllError, Result};

/// The quality ratio δ of the Lovász condition, a rational `1/4 < δ < 1`.
///
/// The larger δ is, the better (and slower) the reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delta {
    num: BigInt,
    den: BigInt,
}

impl Delta {
    /// Creates δ = `num / den`, failing unless `1/4 < δ < 1`.
    pub fn new(num: impl Into<BigInt>, den: impl Into<BigInt>) -> Result<Self> {
        let (mut num, mut den) = (num.into(), den.into());
        if den.is_negative() {
            num = -num;
            den = -den;
        }

        // 1/4 < num/den < 1 <=> den < 4 num and num < den (for den > 0).
        if !den.is_positive() || den >= (&num << 2u32) || num >= den {
            return Err(LllError::InvalidDelta {
                num: num.to_string(),
                den: den.to_string(),
            });
        }
        Ok(Self { num, den })
    }

    /// δ = `(d - 1) / d`, the way the quality is usually given.
    /// `d = 4` gives 3/4, `d = 100` gives 99/100.
    pub fn from_d(d: u64) -> Result<Self> {
        Self::new(BigInt::from(d) - 1, d)
    }

    pub fn num(&self) -> &BigInt {
        &self.num
    }

    pub fn den(&self) -> &BigInt {
        &self.den
    }

    pub fn to_rational(&self) -> BigRational {
        BigRational::new(self.num.clone(), self.den.clone())
    }
}

impl Default for Delta {
    /// 99/100.
    fn default() -> Self {
        Self {
            num: 99.into(),
            den: 100.into(),
        }
    }
}

/// How the input matrix is to be interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Representation {
    /// The rows are the basis vectors.
    #[default]
    Basis,

    /// The matrix is the (symmetric) Gram matrix of the basis.
    Gram,
}

/// Which parts of the result should be computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Want {
    /// The reduced basis (or reduced Gram matrix).
    pub basis: bool,

    /// The unimodular transform.
    pub transform: bool,

    /// Integer relations spanning the kernel.
    pub kernel: bool,

    /// The transform rows spanning the image.
    pub image: bool,
}

impl Default for Want {
    fn default() -> Self {
        Self {
            basis: true,
            transform: true,
            kernel: false,
            image: false,
        }
    }
}

impl Want {
    /// Does the reduction need to keep track of the transform?
    pub(crate) fn needs_transform(&self) -> bool {
        self.transform || self.kernel || self.image
    }
}

/// Which reduction algorithm to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Exact for small inputs, floating point otherwise.
    #[default]
    Auto,

    /// Always use the exact fraction-free reduction.
    Exact,

    /// Always start with the floating point reduction.
    /// It may still fall back to the exact one for integral input.
    Floating,
}

/// How the floating point reduction orthogonalizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GsoMethod {
    /// Householder reflections. Only available for explicit bases.
    #[default]
    Householder,

    /// Classical Gram-Schmidt on inner products.
    /// This is always used for Gram matrix input.
    Classical,
}

/// Tuning knobs of the floating point reduction.
///
/// The margins decide when the reduction considers its floating point
/// approximations unreliable and asks for more precision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecisionConfig {
    /// Start at exactly this precision instead of estimating one.
    pub initial: Option<u32>,

    /// Lower bound for the estimated initial precision.
    pub min_precision: u32,

    /// Extra bits on top of the estimate.
    pub guard_bits: u32,

    /// The precision is never raised above this.
    pub max_precision: u32,

    /// Factor the precision is multiplied with on every retry.
    pub growth: u32,

    /// How often the precision is raised before giving up.
    pub max_retries: u32,

    /// A squared norm that lost more than `precision - norm_margin_bits`
    /// bits to cancellation is unreliable.
    pub norm_margin_bits: u32,

    /// A Gram-Schmidt coefficient with more than
    /// `precision - rounding_margin_bits` integral bits can't be rounded
    /// reliably.
    pub rounding_margin_bits: u32,

    /// For exact input, two values are treated as a tie if they differ by
    /// less than `2^-(precision - tie_margin_bits)` relative to their size.
    /// Ties are handed to the exact reduction so both reductions make the
    /// same choices.
    pub tie_margin_bits: u32,

    /// An attempt may swap at most
    /// `swap_budget_factor * n^2 * (1 + max_entry_bits)` times.
    pub swap_budget_factor: u64,

    /// Integral inputs with `n * max_entry_bits` at most this are reduced
    /// exactly (by [`Strategy::Auto`], and by the floating reduction
    /// instead of retrying).
    pub exact_cutoff: u64,

    pub method: GsoMethod,
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self {
            initial: None,
            min_precision: 64,
            guard_bits: 16,
            max_precision: 1 << 14,
            growth: 2,
            max_retries: 4,
            norm_margin_bits: 16,
            rounding_margin_bits: 10,
            tie_margin_bits: 24,
            swap_budget_factor: 200,
            exact_cutoff: 2048,
            method: GsoMethod::Householder,
        }
    }
}

impl PrecisionConfig {
    pub fn with_initial(mut self, bits: u32) -> Self {
        self.initial = Some(bits);
        self
    }

    pub fn with_max_precision(mut self, bits: u32) -> Self {
        self.max_precision = bits;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_exact_cutoff(mut self, cutoff: u64) -> Self {
        self.exact_cutoff = cutoff;
        self
    }

    pub fn with_method(mut self, method: GsoMethod) -> Self {
        self.method = method;
        self
    }

    /// The precision of the first attempt for a basis of `n` vectors
    /// whose largest entry has `max_bits` bits.
    pub(crate) fn initial_precision(&self, n: usize, max_bits: u64) -> u32 {
        if let Some(p) = self.initial {
            return p.min(self.max_precision);
        }

        let estimate = max_bits
            .saturating_add(2 * n as u64)
            .saturating_add(self.guard_bits as u64)
            .max(self.min_precision as u64);
        let rounded = estimate.div_ceil(32).saturating_mul(32);
        rounded.min(self.max_precision as u64) as u32
    }

    /// The precision of the next attempt, `None` if the precision can't be
    /// raised any more.
    pub(crate) fn next_precision(&self, current: u32) -> Option<u32> {
        let next = current.saturating_mul(self.growth.max(2)).min(self.max_precision);
        (next > current).then_some(next)
    }
}

/// Options of a reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LllOptions {
    pub delta: Delta,
    pub representation: Representation,
    pub want: Want,

    /// A vector that ends up in front of the result. It is not size reduced
    /// unless it depends on the vectors before it.
    pub marked: Option<usize>,

    /// Stop as soon as this input vector is known to be dependent on the
    /// others. The integer relation that shows it is returned in
    /// [`crate::Reduction::relation`].
    pub probe: Option<usize>,

    pub strategy: Strategy,
    pub precision: PrecisionConfig,

    /// Scratch space is compacted every this many column visits.
    pub compaction_interval: usize,
}

impl Default for LllOptions {
    fn default() -> Self {
        Self {
            delta: Delta::default(),
            representation: Representation::Basis,
            want: Want::default(),
            marked: None,
            probe: None,
            strategy: Strategy::Auto,
            precision: PrecisionConfig::default(),
            compaction_interval: 64,
        }
    }
}

impl LllOptions {
    pub fn with_delta(mut self, delta: Delta) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    pub fn with_want(mut self, want: Want) -> Self {
        self.want = want;
        self
    }

    /// Only compute the kernel.
    pub fn kernel_only(self) -> Self {
        self.with_want(Want {
            basis: false,
            transform: false,
            kernel: true,
            image: false,
        })
    }

    /// Only compute the image.
    pub fn image_only(self) -> Self {
        self.with_want(Want {
            basis: false,
            transform: false,
            kernel: false,
            image: true,
        })
    }

    pub fn with_marked(mut self, marked: usize) -> Self {
        self.marked = Some(marked);
        self
    }

    pub fn with_probe(mut self, probe: usize) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_precision(mut self, precision: PrecisionConfig) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_compaction_interval(mut self, interval: usize) -> Self {
        self.compaction_interval = interval;
        self
    }

    /// Checks the vector indices against the number of vectors.
    pub(crate) fn check_indices(&self, n: usize) -> Result<()> {
        for (what, index) in [("marked", self.marked), ("probe", self.probe)] {
            match index {
                Some(index) if index >= n => {
                    return Err(LllError::IndexOutOfRange {
                        what,
                        index,
                        len: n,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn delta_range() {
        assert!(Delta::new(3, 4).is_ok());
        assert!(Delta::new(-3, -4).is_ok());
        assert!(Delta::new(1, 4).is_err());
        assert!(Delta::new(1, 1).is_err());
        assert!(Delta::new(5, 4).is_err());
        assert!(Delta::new(3, 0).is_err());
        assert_eq!(Delta::from_d(4).unwrap(), Delta::new(3, 4).unwrap());
        assert_eq!(Delta::from_d(100).unwrap(), Delta::default());
        assert!(Delta::from_d(1).is_err());
    }

    #[test]
    fn initial_precision() {
        let c = PrecisionConfig::default();
        assert_eq!(c.initial_precision(4, 10), 64);
        assert_eq!(c.initial_precision(10, 100), 160);
        assert_eq!(c.with_initial(100).initial_precision(10, 10000), 100);

        let c = PrecisionConfig::default().with_max_precision(200);
        assert_eq!(c.initial_precision(10, 1000), 200);
        assert_eq!(c.next_precision(128), Some(200));
        assert_eq!(c.next_precision(200), None);
    }

    #[test]
    fn index_checks() {
        let o = LllOptions::default().with_marked(3);
        assert!(o.check_indices(4).is_ok());
        assert_eq!(
            o.check_indices(3),
            Err(LllError::IndexOutOfRange {
                what: "marked",
                index: 3,
                len: 3
            })
        );
        assert!(LllOptions::default().with_probe(0).check_indices(0).is_err());
    }
}
