use num_traits::Float;
use std::collections::HashMap;
use crate::ModelError;

//

/// Index of an atom in an [`AtomStore`], which is also its index in the consensus array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub usize);

/// Named ground atoms and their truth values in \[0, 1\].
///
/// An atom is either a random variable, whose value the reasoner optimizes,
/// or observed, whose value is fixed and folded into hyperplane constants at grounding.
/// [`AtomStore::values`] is the consensus array handed to the reasoner.
#[derive(Debug, Clone, Default)]
pub struct AtomStore<F>
{
    index: HashMap<String, usize>,
    names: Vec<String>,
    values: Vec<F>,
    observed: Vec<bool>,
}

impl<F: Float> AtomStore<F>
{
    pub fn new() -> Self
    {
        AtomStore {
            index: HashMap::new(),
            names: Vec::new(),
            values: Vec::new(),
            observed: Vec::new(),
        }
    }

    /// Adds a random variable atom with its initial value.
    pub fn add_random(&mut self, name: &str, value: F) -> Result<AtomId, ModelError>
    {
        self.add(name, value, false)
    }

    /// Adds an observed atom with its fixed value.
    pub fn add_observed(&mut self, name: &str, value: F) -> Result<AtomId, ModelError>
    {
        self.add(name, value, true)
    }

    fn add(&mut self, name: &str, value: F, observed: bool) -> Result<AtomId, ModelError>
    {
        let id = self.names.len();

        if self.index.contains_key(name) {
            return Err(ModelError::DuplicateAtom(name.to_string()));
        }
        Self::check_value(id, value)?;

        self.index.insert(name.to_string(), id);
        self.names.push(name.to_string());
        self.values.push(value);
        self.observed.push(observed);
        Ok(AtomId(id))
    }

    fn check_value(atom: usize, value: F) -> Result<(), ModelError>
    {
        if value >= F::zero() && value <= F::one() {
            Ok(())
        }
        else {
            Err(ModelError::AtomValueOutOfRange { atom })
        }
    }

    fn check_id(&self, id: AtomId) -> Result<usize, ModelError>
    {
        if id.0 < self.names.len() {
            Ok(id.0)
        }
        else {
            Err(ModelError::UnknownAtom { atom: id.0, len: self.names.len() })
        }
    }

    pub fn len(&self) -> usize
    {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.names.is_empty()
    }

    /// Looks up an atom by name.
    pub fn id(&self, name: &str) -> Option<AtomId>
    {
        self.index.get(name).map(|i| AtomId(*i))
    }

    pub fn name(&self, id: AtomId) -> Result<&str, ModelError>
    {
        let i = self.check_id(id)?;
        Ok(&self.names[i])
    }

    pub fn value(&self, id: AtomId) -> Result<F, ModelError>
    {
        let i = self.check_id(id)?;
        Ok(self.values[i])
    }

    /// Changes the value of an atom.
    ///
    /// For an observed atom the new value takes effect at the next grounding.
    pub fn set_value(&mut self, id: AtomId, value: F) -> Result<(), ModelError>
    {
        let i = self.check_id(id)?;
        Self::check_value(i, value)?;

        self.values[i] = value;
        Ok(())
    }

    pub fn is_observed(&self, id: AtomId) -> Result<bool, ModelError>
    {
        let i = self.check_id(id)?;
        Ok(self.observed[i])
    }

    /// Values of all atoms indexed by [`AtomId`].
    pub fn values(&self) -> &[F]
    {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [F]
    {
        &mut self.values
    }

    /// Iterates over all atoms as `(id, name, value)`.
    pub fn iter(&self) -> impl Iterator<Item=(AtomId, &str, F)>
    {
        self.names.iter().zip(&self.values)
            .enumerate()
            .map(|(i, (n, v))| (AtomId(i), n.as_str(), *v))
    }
}
