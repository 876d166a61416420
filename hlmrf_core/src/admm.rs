//! Consensus ADMM reasoner

use num_traits::Float;
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use crate::{AdmmFloat, AdmmParam, ReasonerError, RuleTable, TermStore, LocalRecord, Term, CholeskyCache};
use crate::float::lit;

// atoms per reduction block; fixed so that the block partition does not depend on scheduling
const ATOM_BLOCK: usize = 1024;

//

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason
{
    /// Both residuals fell below their tolerances.
    Converged,
    /// Reached [`AdmmParam::max_iter`].
    MaxIter,
    /// Exceeded [`AdmmParam::time_limit`].
    TimeLimit,
    /// Stopped by a [`Canceller`].
    Cancelled,
}

/// Outcome of [`AdmmReasoner::optimize`].
///
/// The consensus array always holds a usable solution, whatever [`StopReason`] says.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmmReport<F>
{
    /// Completed iterations.
    pub iterations: usize,
    pub stop: StopReason,
    /// Primal residual \\(\\|x - z\\|\\) over all local copies.
    pub primal_res: F,
    /// Dual residual \\(\rho \\|z - z_{\rm prev}\\|\\) counted once per local copy.
    pub dual_res: F,
    /// Tolerance of the primal residual.
    pub eps_primal: F,
    /// Tolerance of the dual residual.
    pub eps_dual: F,
    /// \\(\sum y (x - z)\\)
    pub lagrange_penalty: F,
    /// \\(\sum {\rho \over 2} (x - z)^2\\)
    pub augmented_lagrange_penalty: F,
}

impl<F: Float> AdmmReport<F>
{
    pub fn converged(&self) -> bool
    {
        self.stop == StopReason::Converged
    }
}

/// Handle to stop a running [`AdmmReasoner::optimize`] from another thread.
///
/// The run finishes its current iteration and returns with [`StopReason::Cancelled`].
/// The request is consumed by the run that observes it.
#[derive(Debug, Clone)]
pub struct Canceller(Arc<AtomicBool>);

impl Canceller
{
    pub fn cancel(&self)
    {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool
    {
        self.0.load(Ordering::SeqCst)
    }
}

//

/// Consensus ADMM reasoner.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// This struct minimizes a sum of convex terms sharing consensus variables:
/// \\[
/// \begin{array}{ll}
/// {\rm minimize} & \sum_t f_t(x_t) \\\\
/// {\rm subject \ to} & x_{t,i} = z_{{\rm atom}(t,i)}, \quad z \in [0, 1]^N,
/// \end{array}
/// \\]
/// by alternating the local minimizations of [`Term::minimize`],
/// the consensus update \\(z_j = \Pi_{[0,1]} \left( {\rm mean}_{(t,i) \to j} (x_{t,i} + y_{t,i} / \rho) \right)\\)
/// and the multiplier update \\(y_{t,i} \leftarrow y_{t,i} + \rho (x_{t,i} - z_j)\\).
///
/// A run resumes from the local copies and multipliers left in the [`TermStore`] by the previous run,
/// so re-optimizing after weights change needs no re-grounding.
///
/// With [`AdmmParam::num_threads`] set, a dedicated thread pool is built by the first run
/// and reused by later runs until the thread count changes or [`AdmmReasoner::close`] is called.
pub struct AdmmReasoner<F: Float>
{
    /// reasoner parameters.
    pub par: AdmmParam<F>,

    cache: CholeskyCache<F>,
    cancel: Arc<AtomicBool>,
    pool: Mutex<Option<(usize, Arc<ThreadPool>)>>,
}

impl<F: Float> AdmmReasoner<F>
{
    /// Creates an instance.
    ///
    /// Returns [`AdmmReasoner`] instance.
    pub fn new() -> Self
    {
        AdmmReasoner {
            par: AdmmParam::default(),
            cache: CholeskyCache::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            pool: Mutex::new(None),
        }
    }

    /// Changes reasoner parameters.
    ///
    /// Returns [`AdmmReasoner`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut AdmmParam<F>)
    {
        f(&mut self.par);
        self
    }

    /// Returns a handle to cancel runs of this reasoner.
    pub fn canceller(&self) -> Canceller
    {
        Canceller(self.cancel.clone())
    }

    /// Factorization cache shared by all terms of all runs.
    pub fn cache(&self) -> &CholeskyCache<F>
    {
        &self.cache
    }

    /// Releases cached factorizations and the dedicated thread pool.
    pub fn close(&mut self)
    {
        self.cache.clear();
        *self.pool.get_mut() = None;
    }

    /// Dedicated pool for [`AdmmParam::num_threads`], built on first use; `None` for the global pool.
    pub(crate) fn thread_pool(&self) -> Result<Option<Arc<ThreadPool>>, ReasonerError>
    {
        let n = match self.par.num_threads {
            Some(n) => n,
            None => return Ok(None),
        };

        let mut pool = self.pool.lock();
        if let Some((threads, p)) = pool.as_ref() {
            if *threads == n {
                return Ok(Some(p.clone()));
            }
        }

        log::debug!("building a pool of {} threads", n);
        let p = Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ReasonerError::ThreadPool(e.to_string()))?
        );
        *pool = Some((n, p.clone()));
        Ok(Some(p))
    }
}

impl<F: Float> Default for AdmmReasoner<F>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<F: AdmmFloat> AdmmReasoner<F>
{
    /// Runs ADMM iterations until convergence, the iteration cap, the time limit or cancellation.
    ///
    /// Returns `Ok` with [`AdmmReport`], or `Err` with [`ReasonerError`] on invalid input or internal failure.
    /// Not converging is not an error.
    /// * `store` holds the terms; their local copies and multipliers are the warm start.
    /// * `rules` gives the weights terms read on every minimization.
    /// * `consensus` is \\(z\\) indexed by atom, the starting point on entry and the solution on exit.
    pub fn optimize(&self, store: &mut TermStore<F>, rules: &RuleTable<F>, consensus: &mut [F])
    -> Result<AdmmReport<F>, ReasonerError>
    {
        self.par.check()?;

        if consensus.len() < store.num_atoms() {
            log::error!("Consensus length {} must be >= {}", consensus.len(), store.num_atoms());
            return Err(ReasonerError::ConsensusTooShort { len: consensus.len(), required: store.num_atoms() });
        }
        if let Some(rule) = store.max_rule() {
            if rule >= rules.len() {
                return Err(ReasonerError::UnknownRule { rule, len: rules.len() });
            }
        }
        if consensus.iter().any(|z| !z.is_finite()) {
            return Err(ReasonerError::NonFinite("consensus"));
        }

        log::debug!("{:?}", self.par);

        let core = AdmmCore {
            par: &self.par,
            cache: &self.cache,
            cancel: &*self.cancel,
            store,
            rules,
            consensus,
        };

        let rslt = if let Some(pool) = self.thread_pool()? {
            pool.install(|| core.solve())
        }
        else {
            core.solve()
        };

        self.cancel.store(false, Ordering::SeqCst);
        rslt
    }
}

//

#[derive(Debug, Clone, Copy)]
struct Residuals<F>
{
    primal: F,
    dual: F,
    x_norm: F,
    z_norm: F,
    y_norm: F,
    lagrange: F,
    augmented: F,
}

impl<F: Float> Residuals<F>
{
    fn zero() -> Self
    {
        let f0 = F::zero();

        Residuals {
            primal: f0, dual: f0,
            x_norm: f0, z_norm: f0, y_norm: f0,
            lagrange: f0, augmented: f0,
        }
    }

    fn merge(self, o: Self) -> Self
    {
        Residuals {
            primal: self.primal + o.primal,
            dual: self.dual + o.dual,
            x_norm: self.x_norm + o.x_norm,
            z_norm: self.z_norm + o.z_norm,
            y_norm: self.y_norm + o.y_norm,
            lagrange: self.lagrange + o.lagrange,
            augmented: self.augmented + o.augmented,
        }
    }
}

struct AdmmCore<'a, F: AdmmFloat>
{
    par: &'a AdmmParam<F>,
    cache: &'a CholeskyCache<F>,
    cancel: &'a AtomicBool,

    store: &'a mut TermStore<F>,
    rules: &'a RuleTable<F>,
    consensus: &'a mut [F],
}

impl<'a, F: AdmmFloat> AdmmCore<'a, F>
{
    fn solve(mut self) -> Result<AdmmReport<F>, ReasonerError>
    {
        log::info!("----- Initializing");
        log::debug!("{} terms, {} atoms, {} local copies",
            self.store.len(), self.store.num_atoms(), self.store.num_records());

        let started = Instant::now();
        let deadline = self.par.time_limit.map(|d| started + d);

        let finf = F::infinity();
        let mut report = AdmmReport {
            iterations: 0,
            stop: StopReason::MaxIter,
            primal_res: finf,
            dual_res: finf,
            eps_primal: F::zero(),
            eps_dual: F::zero(),
            lagrange_penalty: F::zero(),
            augmented_lagrange_penalty: F::zero(),
        };

        log::info!("----- Started");
        let mut i = 0;
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                log::warn!("----- Cancelled");
                report.stop = StopReason::Cancelled;
                break;
            }
            if deadline.map_or(false, |d| Instant::now() >= d) {
                log::warn!("----- TimeLimit");
                report.stop = StopReason::TimeLimit;
                break;
            }

            let excess_iter = i + 1 >= self.par.max_iter;
            let check = excess_iter || i % self.par.stop_check == 0;

            let log_trig = if self.par.log_period > 0 {
                i % self.par.log_period == 0
            }
            else {
                if i == 0 && log::log_enabled!(log::Level::Debug) {
                    log::warn!("log_period == 0: no periodic log");
                }
                false
            };

            // Local minimize phase, reading the previous consensus
            self.minimize_terms()?;

            // Consensus phase
            let res = self.update_consensus(check);

            // Multiplier phase
            self.update_lagranges();

            // Termination criteria of convergence, on check iterations only
            report.iterations = i + 1;
            let term_conv = if let Some(res) = res {
                self.criteria_conv(&res, &mut report);
                (report.primal_res <= report.eps_primal) && (report.dual_res <= report.eps_dual)
            }
            else {
                false
            };

            if log_trig || excess_iter || term_conv {
                log::debug!("{}: pri_dual {:.2e} {:.2e} eps {:.2e} {:.2e}",
                    i, report.primal_res, report.dual_res, report.eps_primal, report.eps_dual);
            }
            else {
                log::trace!("{}: pri_dual {:.2e} {:.2e} eps {:.2e} {:.2e}",
                    i, report.primal_res, report.dual_res, report.eps_primal, report.eps_dual);
            }
            if log_trig && log::log_enabled!(log::Level::Debug) {
                let obj = self.store.objective(self.rules, &*self.consensus, self.par.eps_abs);
                log::debug!("{}: objective {:.6e}, violated constraints {}", i, obj.value, obj.violated_constraints);
            }

            if term_conv && !self.par.run_full_iterations {
                report.stop = StopReason::Converged;
                break;
            }
            if excess_iter {
                report.stop = if term_conv {StopReason::Converged} else {StopReason::MaxIter};
                break;
            }

            i += 1;
        } // end of loop

        match report.stop {
            StopReason::Converged => log::info!("----- Converged"),
            StopReason::MaxIter => log::warn!("----- ExcessIter"),
            _ => {},
        }
        log::info!("{} iterations in {:.3?}: primal res {:.2e}, dual res {:.2e}",
            report.iterations, started.elapsed(), report.primal_res, report.dual_res);

        Ok(report)
    }

    fn minimize_terms(&mut self) -> Result<(), ReasonerError>
    {
        let step = self.par.step_size;
        let z = &*self.consensus;
        let rules = self.rules;
        let cache = self.cache;

        self.store.terms_mut().par_iter_mut()
            .try_for_each(|t| t.minimize(step, z, rules, cache))
    }

    fn update_consensus(&mut self, check: bool) -> Option<Residuals<F>>
    {
        let step = self.par.step_size;
        let terms = self.store.terms();
        let records = self.store.all_records();
        let n = records.len();

        let partials: Vec<Residuals<F>> = self.consensus[..n].par_chunks_mut(ATOM_BLOCK)
            .zip(records.par_chunks(ATOM_BLOCK))
            .map(|(zs, recs)| {
                let mut res = Residuals::zero();
                for (z, rec) in zs.iter_mut().zip(recs) {
                    Self::update_atom(step, terms, rec, z, if check {Some(&mut res)} else {None});
                }
                res
            })
            .collect();

        if !check {
            return None;
        }
        // combined in block order
        Some(partials.into_iter().fold(Residuals::zero(), Residuals::merge))
    }

    fn update_atom(step: F, terms: &[Term<F>], rec: &[LocalRecord], z: &mut F, res: Option<&mut Residuals<F>>)
    {
        if rec.is_empty() {
            return;
        }

        let f0 = F::zero();
        let f1 = F::one();
        let half = lit::<F>(0.5);
        let count = F::from(rec.len()).unwrap_or_else(F::one);

        let mut total = f0;
        for r in rec {
            let t = &terms[r.term];
            total = total + t.values()[r.slot] + t.lagranges()[r.slot] / step;
        }

        let new_z = (total / count).max(f0).min(f1);
        let diff = *z - new_z;
        *z = new_z;

        let res = match res {
            Some(res) => res,
            None => return,
        };

        res.dual = res.dual + diff * diff * count;
        res.z_norm = res.z_norm + new_z * new_z * count;

        for r in rec {
            let t = &terms[r.term];
            let x = t.values()[r.slot];
            let y = t.lagranges()[r.slot];
            let d = x - new_z;

            res.x_norm = res.x_norm + x * x;
            res.y_norm = res.y_norm + y * y;
            res.primal = res.primal + d * d;
            res.lagrange = res.lagrange + y * d;
            res.augmented = res.augmented + half * step * d * d;
        }
    }

    fn update_lagranges(&mut self)
    {
        let step = self.par.step_size;
        let z = &*self.consensus;

        self.store.terms_mut().par_iter_mut()
            .for_each(|t| t.update_lagrange(step, z));
    }

    fn criteria_conv(&self, res: &Residuals<F>, report: &mut AdmmReport<F>)
    {
        let n_local = F::from(self.store.num_records()).unwrap_or_else(F::zero);
        let eps_abs_term = n_local.sqrt() * self.par.eps_abs;

        report.primal_res = res.primal.sqrt();
        report.dual_res = self.par.step_size * res.dual.sqrt();
        report.eps_primal = eps_abs_term + self.par.eps_rel * res.x_norm.sqrt().max(res.z_norm.sqrt());
        report.eps_dual = eps_abs_term + self.par.eps_rel * res.y_norm.sqrt();
        report.lagrange_penalty = res.lagrange;
        report.augmented_lagrange_penalty = res.augmented;
    }
}
