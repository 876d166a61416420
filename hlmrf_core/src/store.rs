//! Term store and per-atom local records

use num_traits::Float;
use rand::prelude::*;
use serde::{Serialize, Deserialize};
use crate::{Term, RuleId, RuleTable};

//

/// Index of a term in a [`TermStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub usize);

/// Location of one local copy of an atom: a term and a local slot in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalRecord
{
    pub term: usize,
    pub slot: usize,
}

/// Initial local values set by [`TermStore::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialValue
{
    /// Current consensus value of the atom.
    Atom,
    /// Zero.
    Zero,
    /// Uniform on [0, 1), drawn in term and slot order from a generator seeded with `seed`.
    Random { seed: u64 },
}

impl Default for InitialValue
{
    fn default() -> Self
    {
        InitialValue::Atom
    }
}

/// Objective of the whole term collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objective<F>
{
    /// Sum of weighted loss potentials.
    pub value: F,
    /// Number of constraints violated beyond the tolerance.
    pub violated_constraints: usize,
}

//

/// Owner of all terms, with the reverse index from atoms to their local copies.
///
/// Terms are appended and never removed individually; the store is cleared and refilled
/// when the grounding changes.
#[derive(Debug, Clone, Default)]
pub struct TermStore<F>
{
    terms: Vec<Term<F>>,
    // per atom index
    records: Vec<Vec<LocalRecord>>,
    // per rule index
    rule_terms: Vec<Vec<usize>>,
    num_records: usize,
}

impl<F: Float> TermStore<F>
{
    /// Creates an empty store.
    pub fn new() -> Self
    {
        TermStore {
            terms: Vec::new(),
            records: Vec::new(),
            rule_terms: Vec::new(),
            num_records: 0,
        }
    }

    /// Grows the per-atom index so that atoms `0..num_atoms` can be referenced.
    ///
    /// Never shrinks.
    pub fn ensure_atom_capacity(&mut self, num_atoms: usize)
    {
        if self.records.len() < num_atoms {
            self.records.resize_with(num_atoms, Vec::new);
        }
    }

    /// Reserves room for `additional` more terms.
    pub fn reserve(&mut self, additional: usize)
    {
        self.terms.reserve(additional);
    }

    /// Appends a term and records a [`LocalRecord`] for each of its slots.
    ///
    /// Returns the [`TermId`] of the added term.
    pub fn add(&mut self, term: Term<F>) -> TermId
    {
        let id = self.terms.len();

        self.ensure_atom_capacity(term.hyperplane().max_atom() + 1);
        for (slot, atom) in term.atoms().iter().enumerate() {
            self.records[*atom].push(LocalRecord { term: id, slot });
        }
        self.num_records += term.size();

        let rule = term.rule().0;
        if self.rule_terms.len() <= rule {
            self.rule_terms.resize_with(rule + 1, Vec::new);
        }
        self.rule_terms[rule].push(id);

        self.terms.push(term);
        TermId(id)
    }

    pub fn len(&self) -> usize
    {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.terms.is_empty()
    }

    /// Number of atoms the per-atom index covers.
    pub fn num_atoms(&self) -> usize
    {
        self.records.len()
    }

    /// Total number of local copies over all terms.
    pub fn num_records(&self) -> usize
    {
        self.num_records
    }

    pub fn get(&self, id: TermId) -> Option<&Term<F>>
    {
        self.terms.get(id.0)
    }

    pub fn get_mut(&mut self, id: TermId) -> Option<&mut Term<F>>
    {
        self.terms.get_mut(id.0)
    }

    pub fn terms(&self) -> &[Term<F>]
    {
        &self.terms
    }

    pub fn terms_mut(&mut self) -> &mut [Term<F>]
    {
        &mut self.terms
    }

    /// Local records of an atom; empty if no term references it.
    pub fn records(&self, atom: usize) -> &[LocalRecord]
    {
        self.records.get(atom).map_or(&[], |r| r.as_slice())
    }

    pub(crate) fn all_records(&self) -> &[Vec<LocalRecord>]
    {
        &self.records
    }

    /// Terms grounded from a rule.
    pub fn rule_terms(&self, rule: RuleId) -> impl Iterator<Item=&Term<F>>
    {
        self.rule_terms.get(rule.0)
            .map_or(&[][..], |t| t.as_slice())
            .iter()
            .map(move |i| &self.terms[*i])
    }

    /// Largest rule index referenced by a term, if any.
    pub fn max_rule(&self) -> Option<usize>
    {
        self.rule_terms.iter().rposition(|t| !t.is_empty())
    }

    /// Resets every local copy and zeroes every multiplier.
    ///
    /// * `consensus` gives atom values for [`InitialValue::Atom`]; atoms beyond it start at zero.
    /// * `initial` chooses the initial local values.
    pub fn reset(&mut self, consensus: &[F], initial: InitialValue)
    {
        log::debug!("resetting {} terms ({:?})", self.terms.len(), initial);

        match initial {
            InitialValue::Atom => {
                for term in self.terms.iter_mut() {
                    term.reset(|i| consensus.get(i).copied().unwrap_or_else(F::zero));
                }
            },
            InitialValue::Zero => {
                for term in self.terms.iter_mut() {
                    term.reset(|_| F::zero());
                }
            },
            InitialValue::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                for term in self.terms.iter_mut() {
                    term.reset(|_| F::from(rng.gen::<f64>()).unwrap_or_else(F::zero));
                }
            },
        }
    }

    /// Sum of weight-free term values of a rule at the consensus.
    pub fn incompatibility(&self, rule: RuleId, consensus: &[F]) -> F
    {
        self.rule_terms(rule).fold(F::zero(), |acc, t| acc + t.incompatibility(consensus))
    }

    /// Sum of weight-free term values of a rule at the local copies.
    pub fn dual_incompatibility(&self, rule: RuleId) -> F
    {
        self.rule_terms(rule).fold(F::zero(), |acc, t| acc + t.dual_incompatibility())
    }

    /// Weighted objective of loss terms at the consensus and the count of violated constraints.
    ///
    /// * `tolerance` is the violation a constraint may have and still count as satisfied.
    pub fn objective(&self, rules: &RuleTable<F>, consensus: &[F], tolerance: F) -> Objective<F>
    {
        let mut value = F::zero();
        let mut violated_constraints = 0;

        for term in self.terms.iter() {
            if term.kind().is_constraint() {
                if term.incompatibility(consensus) > tolerance {
                    violated_constraints += 1;
                }
            }
            else {
                value = value + term.evaluate(rules, consensus);
            }
        }

        Objective { value, violated_constraints }
    }

    /// Drops all terms and records, keeping allocated memory.
    pub fn clear(&mut self)
    {
        log::debug!("clearing {} terms", self.terms.len());

        self.terms.clear();
        self.records.clear();
        self.rule_terms.clear();
        self.num_records = 0;
    }

    /// Drops all terms and records and releases memory.
    pub fn close(&mut self)
    {
        self.clear();

        self.terms.shrink_to_fit();
        self.records.shrink_to_fit();
        self.rule_terms.shrink_to_fit();
    }
}
