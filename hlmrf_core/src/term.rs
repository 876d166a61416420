//! ADMM objective terms

use num_traits::Float;
use serde::{Serialize, Deserialize};
use std::sync::Arc;
use crate::{ReasonerError, Hyperplane, RuleId, RuleTable, CholeskyCache, CholeskyFactor};

//

/// Comparator of a linear constraint \\(a^T x \ \square\ c\\).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator
{
    /// \\(a^T x = c\\)
    Eq,
    /// \\(a^T x \le c\\)
    Lte,
    /// \\(a^T x \ge c\\)
    Gte,
}

/// Shape of the potential a [`Term`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind
{
    /// Hard constraint \\(a^T x \ \square\ c\\), weight-free.
    LinearConstraint(Comparator),
    /// \\(w (a^T x - c)\\)
    LinearLoss,
    /// \\(w \max(0, a^T x - c)\\)
    HingeLoss,
    /// \\(w (a^T x - c)^2\\)
    SquaredLinearLoss,
    /// \\(w \max(0, a^T x - c)^2\\)
    SquaredHingeLoss,
}

impl TermKind
{
    pub fn is_constraint(&self) -> bool
    {
        matches!(self, TermKind::LinearConstraint(_))
    }
}

//

/// One grounded convex potential and its ADMM local state.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Each term keeps local copies \\(x\\) of the consensus variables it touches
/// and their multipliers \\(y\\). [`Term::minimize`] solves
/// \\[
/// {\rm minimize} \quad f(x) + {\rho \over 2} \\| x - z + y / \rho \\|_2^2
/// \\]
/// in closed form for the shape \\(f\\) given by [`TermKind`].
/// The shape and hyperplane never change after creation; only \\(x\\) and \\(y\\) do.
#[derive(Debug, Clone)]
pub struct Term<F>
{
    kind: TermKind,
    rule: RuleId,
    hyperplane: Hyperplane<F>,

    values: Vec<F>,
    lagranges: Vec<F>,

    // last factor used with its (step, weight)
    factor: Option<(F, F, Arc<CholeskyFactor<F>>)>,
}

impl<F: Float> Term<F>
{
    /// Creates a term with local values and multipliers set to zero.
    ///
    /// * `kind` is the potential shape.
    /// * `rule` is the rule whose weight the term reads on every minimization.
    /// * `hyperplane` is the already validated hyperplane.
    pub fn new(kind: TermKind, rule: RuleId, hyperplane: Hyperplane<F>) -> Self
    {
        let n = hyperplane.size();

        Term {
            kind,
            rule,
            hyperplane,
            values: vec![F::zero(); n],
            lagranges: vec![F::zero(); n],
            factor: None,
        }
    }

    pub fn kind(&self) -> TermKind
    {
        self.kind
    }

    pub fn rule(&self) -> RuleId
    {
        self.rule
    }

    pub fn hyperplane(&self) -> &Hyperplane<F>
    {
        &self.hyperplane
    }

    pub fn size(&self) -> usize
    {
        self.hyperplane.size()
    }

    pub fn atoms(&self) -> &[usize]
    {
        self.hyperplane.atoms()
    }

    /// Local copies \\(x\\).
    pub fn values(&self) -> &[F]
    {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [F]
    {
        &mut self.values
    }

    /// Local multipliers \\(y\\).
    pub fn lagranges(&self) -> &[F]
    {
        &self.lagranges
    }

    pub fn lagranges_mut(&mut self) -> &mut [F]
    {
        &mut self.lagranges
    }

    /// Sets every local copy to `value_of(atom)` and every multiplier to zero.
    pub fn reset<V: FnMut(usize) -> F>(&mut self, mut value_of: V)
    {
        for (v, i) in self.values.iter_mut().zip(self.hyperplane.atoms()) {
            *v = value_of(*i);
        }
        for y in self.lagranges.iter_mut() {
            *y = F::zero();
        }
    }

    /// Minimizes the augmented term and stores the minimizer in the local copies.
    ///
    /// Returns `Err` if the rule of a loss term is not a weighted rule of `rules`,
    /// or if a factorization fails.
    /// * `step` is \\(\rho\\).
    /// * `consensus` is \\(z\\) indexed by atom, read-only.
    /// * `rules` gives the current weight.
    /// * `cache` shares factorizations among structurally identical terms.
    pub fn minimize(&mut self, step: F, consensus: &[F], rules: &RuleTable<F>, cache: &CholeskyCache<F>)
    -> Result<(), ReasonerError>
    {
        match self.kind {
            TermKind::LinearConstraint(cmp) => {
                self.min_linear_constraint(cmp, step, consensus);
                Ok(())
            },
            TermKind::LinearLoss => {
                let weight = rules.weight(self.rule)?;
                self.hyperplane.linear_step(step, weight, consensus, &self.lagranges, &mut self.values);
                Ok(())
            },
            TermKind::HingeLoss => {
                let weight = rules.weight(self.rule)?;
                self.min_hinge(step, weight, consensus);
                Ok(())
            },
            TermKind::SquaredLinearLoss => {
                let weight = rules.weight(self.rule)?;
                self.min_weighted_squared(step, weight, consensus, cache)
            },
            TermKind::SquaredHingeLoss => {
                let weight = rules.weight(self.rule)?;
                if self.flat_region(step, consensus) {
                    Ok(())
                }
                else {
                    self.min_weighted_squared(step, weight, consensus, cache)
                }
            },
        }
    }

    fn min_linear_constraint(&mut self, cmp: Comparator, step: F, consensus: &[F])
    {
        let hp = &self.hyperplane;

        hp.step(step, consensus, &self.lagranges, &mut self.values);

        let satisfied = match cmp {
            Comparator::Eq => false,
            Comparator::Lte => hp.dot(&self.values) <= hp.constant(),
            Comparator::Gte => hp.dot(&self.values) >= hp.constant(),
        };

        if !satisfied {
            hp.project(&mut self.values);
        }
    }

    // Takes the step ignoring the loss; `true` if it lies on the flat side of the hinge.
    fn flat_region(&mut self, step: F, consensus: &[F]) -> bool
    {
        let hp = &self.hyperplane;

        hp.step(step, consensus, &self.lagranges, &mut self.values);
        hp.dot(&self.values) <= hp.constant()
    }

    fn min_hinge(&mut self, step: F, weight: F, consensus: &[F])
    {
        if self.flat_region(step, consensus) {
            return;
        }

        let hp = &self.hyperplane;

        hp.linear_step(step, weight, consensus, &self.lagranges, &mut self.values);
        if hp.dot(&self.values) >= hp.constant() {
            return;
        }

        // on the hinge
        hp.step(step, consensus, &self.lagranges, &mut self.values);
        hp.project(&mut self.values);
    }

    fn min_weighted_squared(&mut self, step: F, weight: F, consensus: &[F], cache: &CholeskyCache<F>)
    -> Result<(), ReasonerError>
    {
        let hp = &self.hyperplane;

        hp.squared_rhs(step, weight, consensus, &self.lagranges, &mut self.values);

        if hp.solve_squared_small(step, weight, &mut self.values) {
            return Ok(());
        }

        let memo = match &self.factor {
            Some((s, w, l)) if *s == step && *w == weight => Some(l.clone()),
            _ => None,
        };
        let l = match memo {
            Some(l) => l,
            None => {
                let l = cache.get_or_factor(step, weight, hp.coeffs())?;
                self.factor = Some((step, weight, l.clone()));
                l
            },
        };
        l.solve(&mut self.values);

        Ok(())
    }

    /// Updates the multipliers \\(y_i \leftarrow y_i + \rho (x_i - z_i)\\) against the new consensus.
    pub fn update_lagrange(&mut self, step: F, consensus: &[F])
    {
        for ((y, x), i) in self.lagranges.iter_mut().zip(&self.values).zip(self.hyperplane.atoms()) {
            *y = *y + step * (*x - consensus[*i]);
        }
    }

    // Weight-free potential value given a^T x.
    fn potential(&self, ax: F) -> F
    {
        let f0 = F::zero();
        let c = self.hyperplane.constant();

        match self.kind {
            TermKind::LinearConstraint(Comparator::Eq) => (ax - c).abs(),
            TermKind::LinearConstraint(Comparator::Lte) => (ax - c).max(f0),
            TermKind::LinearConstraint(Comparator::Gte) => (c - ax).max(f0),
            TermKind::LinearLoss => ax - c,
            TermKind::HingeLoss => (ax - c).max(f0),
            TermKind::SquaredLinearLoss => (ax - c) * (ax - c),
            TermKind::SquaredHingeLoss => {
                let h = (ax - c).max(f0);
                h * h
            },
        }
    }

    fn weighted(&self, rules: &RuleTable<F>, p: F) -> F
    {
        if self.kind.is_constraint() {
            p
        }
        else {
            rules.weight_or_zero(self.rule) * p
        }
    }

    /// Weight-free value of the potential at the consensus.
    ///
    /// For a constraint this is the amount of violation, zero when satisfied.
    pub fn incompatibility(&self, consensus: &[F]) -> F
    {
        self.potential(self.hyperplane.dot_consensus(consensus))
    }

    /// Weight-free value of the potential at the local copies.
    pub fn dual_incompatibility(&self) -> F
    {
        self.potential(self.hyperplane.dot(&self.values))
    }

    /// Value of the potential at the consensus, weighted unless the term is a constraint.
    pub fn evaluate(&self, rules: &RuleTable<F>, consensus: &[F]) -> F
    {
        self.weighted(rules, self.incompatibility(consensus))
    }

    /// Value of the potential at the local copies, weighted unless the term is a constraint.
    pub fn evaluate_local(&self, rules: &RuleTable<F>) -> F
    {
        self.weighted(rules, self.dual_incompatibility())
    }
}
