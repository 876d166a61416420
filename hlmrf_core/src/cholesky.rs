//! Cholesky factorization and its cache

use num_traits::Float;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::ReasonerError;
use crate::float::lit;

//

/// Lower-triangular Cholesky factor \\(L\\) of a symmetric positive-definite matrix \\(M = L L^T\\).
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor<F>
{
    n: usize,
    // packed by rows, (i, j) at i * (i + 1) / 2 + j for j <= i
    l: Vec<F>,
}

impl<F: Float> CholeskyFactor<F>
{
    fn idx(i: usize, j: usize) -> usize
    {
        assert!(j <= i);

        i * (i + 1) / 2 + j
    }

    /// Factorizes a symmetric matrix.
    ///
    /// Returns `Err` with [`ReasonerError::FactorizationFailed`] if the matrix is not positive-definite.
    /// * `n` is the dimension.
    /// * `mat` is the row-major \\(n \times n\\) matrix; only its lower triangle is read.
    pub fn factor(n: usize, mat: &[F]) -> Result<Self, ReasonerError>
    {
        assert_eq!(mat.len(), n * n);

        let mut l = vec![F::zero(); n * (n + 1) / 2];

        for i in 0.. n {
            for j in 0..= i {
                let mut sum = mat[i * n + j];
                for k in 0.. j {
                    sum = sum - l[Self::idx(i, k)] * l[Self::idx(j, k)];
                }

                if i == j {
                    if !(sum > F::zero()) || !sum.is_finite() {
                        return Err(ReasonerError::FactorizationFailed { row: i });
                    }
                    l[Self::idx(i, i)] = sum.sqrt();
                }
                else {
                    l[Self::idx(i, j)] = sum / l[Self::idx(j, j)];
                }
            }
        }

        Ok(CholeskyFactor { n, l })
    }

    /// Factorizes \\(M = 2 w a a^T + \rho I\\).
    ///
    /// * `step` is \\(\rho\\).
    /// * `weight` is \\(w\\).
    /// * `coeffs` is \\(a\\).
    pub fn factor_rank_one(step: F, weight: F, coeffs: &[F]) -> Result<Self, ReasonerError>
    {
        let n = coeffs.len();
        let f2 = lit::<F>(2.);

        let mut mat = vec![F::zero(); n * n];
        for i in 0.. n {
            for j in 0.. n {
                let mut v = f2 * weight * coeffs[i] * coeffs[j];
                if i == j {
                    v = v + step;
                }
                mat[i * n + j] = v;
            }
        }

        Self::factor(n, &mat)
    }

    pub fn dim(&self) -> usize
    {
        self.n
    }

    /// Element \\(L_{ij}\\), zero above the diagonal.
    pub fn get(&self, i: usize, j: usize) -> F
    {
        assert!(i < self.n && j < self.n);

        if j <= i {
            self.l[Self::idx(i, j)]
        }
        else {
            F::zero()
        }
    }

    /// Solves \\(M x = b\\) by forward and back substitution.
    ///
    /// * `x` is \\(b\\) before entry, \\(x\\) on exit.
    pub fn solve(&self, x: &mut [F])
    {
        assert_eq!(x.len(), self.n);

        // L u = b
        for i in 0.. self.n {
            let mut v = x[i];
            for j in 0.. i {
                v = v - self.l[Self::idx(i, j)] * x[j];
            }
            x[i] = v / self.l[Self::idx(i, i)];
        }

        // L^T x = u
        for i in (0.. self.n).rev() {
            let mut v = x[i];
            for j in (i + 1).. self.n {
                v = v - self.l[Self::idx(j, i)] * x[j];
            }
            x[i] = v / self.l[Self::idx(i, i)];
        }
    }
}

//

type Bits = (u64, i16, i8);

// compute locks; a key always maps to the same one
const STRIPES: usize = 16;

/// Structural key of a factorization: everything the matrix depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FactorKey
{
    step: Bits,
    weight: Bits,
    coeffs: Vec<Bits>,
}

impl FactorKey
{
    fn new<F: Float>(step: F, weight: F, coeffs: &[F]) -> Self
    {
        FactorKey {
            step: step.integer_decode(),
            weight: weight.integer_decode(),
            coeffs: coeffs.iter().map(|a| a.integer_decode()).collect(),
        }
    }

    fn stripe(&self) -> usize
    {
        let mut h = DefaultHasher::new();
        self.hash(&mut h);
        (h.finish() % STRIPES as u64) as usize
    }
}

/// Counters of [`CholeskyCache`] lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats
{
    /// Lookups served without computing.
    pub hits: usize,
    /// Lookups that found no entry on the first, lock-free check.
    pub misses: usize,
    /// Factorizations actually computed.
    pub factorizations: usize,
}

/// Cache of Cholesky factors of \\(2 w a a^T + \rho I\\) keyed by \\((\rho, w, a)\\).
///
/// Structurally identical terms share one factor.
/// Lookups take a shared read lock only; on a miss, the caller takes the compute lock of the key's stripe,
/// checks again, and only then factorizes and inserts, so exactly one factor per key is ever computed.
/// Misses on keys of different stripes factorize concurrently.
///
/// Entries are never evicted: a weight change adds entries for the new weight and keeps the old ones
/// until [`CholeskyCache::clear`].
#[derive(Debug)]
pub struct CholeskyCache<F>
{
    factors: RwLock<HashMap<FactorKey, Arc<CholeskyFactor<F>>>>,
    compute: Vec<Mutex<()>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    factorizations: AtomicUsize,
}

impl<F: Float> CholeskyCache<F>
{
    /// Creates an empty cache.
    pub fn new() -> Self
    {
        CholeskyCache {
            factors: RwLock::new(HashMap::new()),
            compute: (0.. STRIPES).map(|_| Mutex::new(())).collect(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            factorizations: AtomicUsize::new(0),
        }
    }

    /// Looks up the factor of \\(2 w a a^T + \rho I\\), computing it on a miss.
    ///
    /// Returns the shared factor, or `Err` if the factorization fails.
    pub fn get_or_factor(&self, step: F, weight: F, coeffs: &[F]) -> Result<Arc<CholeskyFactor<F>>, ReasonerError>
    {
        let key = FactorKey::new(step, weight, coeffs);

        if let Some(l) = self.factors.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(l.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let _guard = self.compute[key.stripe()].lock();

        // another worker may have won while we waited
        if let Some(l) = self.factors.read().get(&key) {
            return Ok(l.clone());
        }

        let l = Arc::new(CholeskyFactor::factor_rank_one(step, weight, coeffs)?);
        self.factorizations.fetch_add(1, Ordering::Relaxed);
        log::trace!("factorized {}x{} system", coeffs.len(), coeffs.len());

        self.factors.write().insert(key, l.clone());
        Ok(l)
    }

    /// Number of cached factors.
    pub fn len(&self) -> usize
    {
        self.factors.read().len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.factors.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats
    {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            factorizations: self.factorizations.load(Ordering::Relaxed),
        }
    }

    /// Drops all factors and resets the counters.
    pub fn clear(&self)
    {
        let _guards: Vec<_> = self.compute.iter().map(|m| m.lock()).collect();

        self.factors.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.factorizations.store(0, Ordering::Relaxed);
    }
}

impl<F: Float> Default for CholeskyCache<F>
{
    fn default() -> Self
    {
        Self::new()
    }
}
