use num_traits::Float;
use hlmrf_core::{Hyperplane, RuleId, Term, TermKind, TermStore};
use crate::{AtomStore, LinearExpr, Model, ModelError, RuleShape};

/// Generator of ADMM terms from the ground rules of a [`Model`].
pub struct TermGenerator;

impl TermGenerator
{
    /// Generates a term for every non-trivial ground rule and adds it to `store`.
    ///
    /// Returns the number of added terms.
    pub fn generate<F: Float>(model: &Model<F>, store: &mut TermStore<F>) -> Result<usize, ModelError>
    {
        let ground = model.ground_rules();
        let initial = store.len();

        store.reserve(ground.len());
        store.ensure_atom_capacity(model.atoms().len());

        for g in ground {
            if let Some(term) = Self::create_term(model, g.rule, &g.expr)? {
                store.add(term);
            }
        }

        let added = store.len() - initial;
        log::debug!("generated {} terms from {} ground rules", added, ground.len());
        Ok(added)
    }

    /// Creates a term of a ground rule without adding it anywhere.
    ///
    /// Returns `None` if the ground rule is trivial.
    pub fn create_term<F: Float>(model: &Model<F>, rule: RuleId, expr: &LinearExpr<F>) -> Result<Option<Term<F>>, ModelError>
    {
        let shape = model.shape(rule)?;
        let hinge = matches!(shape, RuleShape::Loss { hinge: true, .. });

        let hp = match Self::process_hyperplane(expr, model.atoms(), hinge)? {
            Some(hp) => hp,
            None => return Ok(None),
        };

        let kind = match shape {
            RuleShape::Constraint(cmp) => TermKind::LinearConstraint(cmp),
            RuleShape::Loss { hinge: true, squared: true } => TermKind::SquaredHingeLoss,
            RuleShape::Loss { hinge: true, squared: false } => TermKind::HingeLoss,
            RuleShape::Loss { hinge: false, squared: true } => TermKind::SquaredLinearLoss,
            RuleShape::Loss { hinge: false, squared: false } => TermKind::LinearLoss,
        };

        Ok(Some(Term::new(kind, rule, hp)))
    }

    /// Builds the hyperplane \\(a^T x = c\\) of an expression \\(a^T x - c\\).
    ///
    /// Summands of the same atom are merged and cancelled ones dropped.
    /// Observed atoms are folded into \\(c\\) with their current values.
    /// Returns `None` if no random variable atom remains, or if `hinge` and
    /// \\(\max(0, a^T x - c)\\) is zero on the whole box \\([0, 1]^n\\).
    pub fn process_hyperplane<F: Float>(expr: &LinearExpr<F>, atoms: &AtomStore<F>, hinge: bool)
    -> Result<Option<Hyperplane<F>>, ModelError>
    {
        let mut coeffs: Vec<F> = Vec::new();
        let mut ids: Vec<usize> = Vec::new();
        let mut constant = -expr.constant_value();

        for (atom, a) in expr.summands() {
            let value = atoms.value(*atom)?;

            if atoms.is_observed(*atom)? {
                constant = constant - *a * value;
                continue;
            }

            match ids.iter().position(|i| *i == atom.0) {
                Some(slot) => {
                    coeffs[slot] = coeffs[slot] + *a;
                },
                None => {
                    coeffs.push(*a);
                    ids.push(atom.0);
                },
            }
        }

        let before = ids.len();
        let (coeffs, ids): (Vec<F>, Vec<usize>) = coeffs.into_iter().zip(ids)
            .filter(|(a, _)| !a.is_zero())
            .unzip();
        if ids.len() < before {
            log::debug!("{} cancelled atoms dropped", before - ids.len());
        }

        if ids.is_empty() {
            return Ok(None);
        }

        let hp = Hyperplane::new(coeffs, ids, constant)?;

        if hinge {
            // max of a^T x over the box
            let sup = hp.coeffs().iter().fold(F::zero(), |acc, a| acc + a.max(F::zero()));
            if sup <= hp.constant() {
                log::debug!("hinge is never active: trivial");
                return Ok(None);
            }
        }

        Ok(Some(hp))
    }
}
