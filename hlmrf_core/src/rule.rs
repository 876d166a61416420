use num_traits::Float;
use crate::ReasonerError;

/// Index of a rule in a [`RuleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub usize);

#[derive(Debug, Clone)]
struct RuleEntry<F>
{
    name: String,
    weight: Option<F>,
}

/// Table of rules that terms refer to by [`RuleId`].
///
/// Terms never copy a weight; they look it up here on every minimization,
/// so weights changed by [`RuleTable::set_weight`] take effect on the next run without re-grounding.
/// Hard constraint rules carry no weight.
#[derive(Debug, Clone, Default)]
pub struct RuleTable<F>
{
    rules: Vec<RuleEntry<F>>,
    revision: u64,
}

impl<F: Float> RuleTable<F>
{
    /// Creates an empty table.
    pub fn new() -> Self
    {
        RuleTable {
            rules: Vec::new(),
            revision: 0,
        }
    }

    /// Adds a weighted (soft) rule.
    ///
    /// Returns the [`RuleId`] of the added rule, or `Err` if `weight` is negative or not finite.
    pub fn add_weighted(&mut self, name: &str, weight: F) -> Result<RuleId, ReasonerError>
    {
        let id = RuleId(self.rules.len());
        Self::check_weight(id, weight)?;

        self.rules.push(RuleEntry {
            name: name.to_string(),
            weight: Some(weight),
        });
        Ok(id)
    }

    /// Adds a hard constraint rule.
    pub fn add_constraint(&mut self, name: &str) -> RuleId
    {
        let id = RuleId(self.rules.len());

        self.rules.push(RuleEntry {
            name: name.to_string(),
            weight: None,
        });
        id
    }

    pub fn len(&self) -> usize
    {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.rules.is_empty()
    }

    pub fn contains(&self, id: RuleId) -> bool
    {
        id.0 < self.rules.len()
    }

    /// Name given on addition.
    pub fn name(&self, id: RuleId) -> Result<&str, ReasonerError>
    {
        Ok(&self.entry(id)?.name)
    }

    /// `true` if the rule is weighted, `false` if it is a hard constraint.
    pub fn is_weighted(&self, id: RuleId) -> Result<bool, ReasonerError>
    {
        Ok(self.entry(id)?.weight.is_some())
    }

    /// Current weight of a weighted rule.
    pub fn weight(&self, id: RuleId) -> Result<F, ReasonerError>
    {
        self.entry(id)?.weight.ok_or(ReasonerError::NotWeighted { rule: id.0 })
    }

    /// Changes the weight of a weighted rule.
    ///
    /// Terms of the rule read the new weight at their next minimization.
    pub fn set_weight(&mut self, id: RuleId, weight: F) -> Result<(), ReasonerError>
    {
        Self::check_weight(id, weight)?;

        let len = self.rules.len();
        let entry = self.rules.get_mut(id.0).ok_or(ReasonerError::UnknownRule { rule: id.0, len })?;
        match entry.weight.as_mut() {
            Some(w) => {
                *w = weight;
                self.revision += 1;
                Ok(())
            },
            None => Err(ReasonerError::NotWeighted { rule: id.0 }),
        }
    }

    /// Counter incremented by every successful [`RuleTable::set_weight`].
    pub fn revision(&self) -> u64
    {
        self.revision
    }

    /// Iterates over all rule ids in order.
    pub fn ids(&self) -> impl Iterator<Item=RuleId>
    {
        (0.. self.rules.len()).map(RuleId)
    }

    /// Weight used by a term: zero for hard constraints, which ignore it.
    pub(crate) fn weight_or_zero(&self, id: RuleId) -> F
    {
        self.rules.get(id.0).and_then(|e| e.weight).unwrap_or_else(F::zero)
    }

    fn entry(&self, id: RuleId) -> Result<&RuleEntry<F>, ReasonerError>
    {
        self.rules.get(id.0).ok_or(ReasonerError::UnknownRule { rule: id.0, len: self.rules.len() })
    }

    fn check_weight(id: RuleId, weight: F) -> Result<(), ReasonerError>
    {
        if weight.is_finite() && weight >= F::zero() {
            Ok(())
        }
        else {
            Err(ReasonerError::InvalidWeight { rule: id.0 })
        }
    }
}
