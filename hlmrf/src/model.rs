use num_traits::Float;
use hlmrf_core::{Comparator, ReasonerError, RuleId, RuleTable};
use crate::{AtomStore, LinearExpr, ModelError};

//

/// Shape of the potentials a rule grounds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleShape
{
    /// Weighted potential of a ground expression \\(e\\):
    /// \\(\max(0, e)\\) if `hinge`, \\(e\\) otherwise, squared if `squared`.
    Loss { hinge: bool, squared: bool },
    /// Hard constraint \\(e \ \square\ 0\\).
    Constraint(Comparator),
}

/// One grounding of a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundRule<F>
{
    pub rule: RuleId,
    pub expr: LinearExpr<F>,
}

/// HL-MRF model: atoms, rules with their shapes and weights, and ground rules.
#[derive(Debug, Clone, Default)]
pub struct Model<F>
{
    atoms: AtomStore<F>,
    rules: RuleTable<F>,
    shapes: Vec<RuleShape>,
    ground: Vec<GroundRule<F>>,
}

impl<F: Float> Model<F>
{
    pub fn new() -> Self
    {
        Model {
            atoms: AtomStore::new(),
            rules: RuleTable::new(),
            shapes: Vec::new(),
            ground: Vec::new(),
        }
    }

    /// Adds a weighted rule.
    ///
    /// Returns the [`RuleId`], or `Err` if the weight is negative or not finite.
    pub fn add_loss_rule(&mut self, name: &str, weight: F, hinge: bool, squared: bool) -> Result<RuleId, ModelError>
    {
        let id = self.rules.add_weighted(name, weight)?;
        self.shapes.push(RuleShape::Loss { hinge, squared });
        Ok(id)
    }

    /// Adds a hard constraint rule.
    pub fn add_constraint_rule(&mut self, name: &str, cmp: Comparator) -> RuleId
    {
        let id = self.rules.add_constraint(name);
        self.shapes.push(RuleShape::Constraint(cmp));
        id
    }

    /// Adds a grounding of a rule.
    ///
    /// Returns `Err` if the rule or an atom of `expr` is unknown.
    pub fn ground(&mut self, rule: RuleId, expr: LinearExpr<F>) -> Result<(), ModelError>
    {
        self.shape(rule)?;
        for (atom, _) in expr.summands() {
            self.atoms.value(*atom)?;
        }

        self.ground.push(GroundRule { rule, expr });
        Ok(())
    }

    pub fn shape(&self, rule: RuleId) -> Result<RuleShape, ModelError>
    {
        self.shapes.get(rule.0).copied()
            .ok_or(ModelError::Reasoner(ReasonerError::UnknownRule { rule: rule.0, len: self.shapes.len() }))
    }

    pub fn atoms(&self) -> &AtomStore<F>
    {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut AtomStore<F>
    {
        &mut self.atoms
    }

    pub fn rules(&self) -> &RuleTable<F>
    {
        &self.rules
    }

    /// Changes the weight of a weighted rule.
    pub fn set_weight(&mut self, rule: RuleId, weight: F) -> Result<(), ModelError>
    {
        self.rules.set_weight(rule, weight)?;
        Ok(())
    }

    pub fn ground_rules(&self) -> &[GroundRule<F>]
    {
        &self.ground
    }

    // rules to read and the consensus array to write, borrowed together for a reasoner run
    pub(crate) fn split_mut(&mut self) -> (&RuleTable<F>, &mut [F])
    {
        (&self.rules, self.atoms.values_mut())
    }

    /// Drops all ground rules, keeping atoms and rules.
    pub fn clear_groundings(&mut self)
    {
        self.ground.clear();
    }
}
