use hlmrf_core::{AdmmFloat, AdmmReasoner, AdmmReport, Canceller, Objective, RuleId, TermStore};
use crate::{HlmrfConfig, InferenceParam, Model, ModelError, TermGenerator};

/// Result of [`MpeInference::infer`].
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult<F>
{
    pub report: AdmmReport<F>,
    pub objective: Objective<F>,
}

/// Most probable explanation (MAP) inference of a [`Model`].
///
/// Terms are generated once on creation. Random variable atom values are the starting point
/// of every [`MpeInference::infer`] and receive its solution.
/// Changing rule weights keeps the terms and their local state, so the next run is a warm restart.
pub struct MpeInference<F: AdmmFloat>
{
    model: Model<F>,
    store: TermStore<F>,
    reasoner: AdmmReasoner<F>,
    par: InferenceParam<F>,
}

impl<F: AdmmFloat> MpeInference<F>
{
    /// Creates an instance with default parameters and generates terms.
    pub fn new(model: Model<F>) -> Result<Self, ModelError>
    {
        Self::with_config(model, HlmrfConfig::default())
    }

    /// Creates an instance and generates terms.
    pub fn with_config(model: Model<F>, config: HlmrfConfig<F>) -> Result<Self, ModelError>
    {
        config.check()?;

        let mut reasoner = AdmmReasoner::new();
        reasoner.par = config.admm;

        let mut inference = MpeInference {
            model,
            store: TermStore::new(),
            reasoner,
            par: config.inference,
        };
        inference.rebuild()?;

        Ok(inference)
    }

    /// Regenerates all terms from the current ground rules and observed values, and resets them.
    ///
    /// Returns the number of generated terms.
    pub fn rebuild(&mut self) -> Result<usize, ModelError>
    {
        self.store.clear();
        let n = TermGenerator::generate(&self.model, &mut self.store)?;
        self.reset();

        log::info!("{} terms over {} atoms", n, self.model.atoms().len());
        Ok(n)
    }

    /// Resets local copies per [`InferenceParam::initial_value`] and zeroes multipliers.
    pub fn reset(&mut self)
    {
        self.store.reset(self.model.atoms().values(), self.par.initial_value);
    }

    /// Runs the reasoner and writes the solution to the random variable atoms.
    pub fn infer(&mut self) -> Result<InferenceResult<F>, ModelError>
    {
        log::info!("----- MPE inference");

        let (rules, consensus) = self.model.split_mut();
        let report = self.reasoner.optimize(&mut self.store, rules, consensus)?;

        let objective = self.objective();
        log::info!("objective {:.6e}, violated constraints {}", objective.value, objective.violated_constraints);

        Ok(InferenceResult { report, objective })
    }

    /// Changes the weight of a weighted rule for the next [`MpeInference::infer`].
    pub fn set_weight(&mut self, rule: RuleId, weight: F) -> Result<(), ModelError>
    {
        self.model.set_weight(rule, weight)
    }

    /// Weighted objective and violated constraints at the current atom values.
    pub fn objective(&self) -> Objective<F>
    {
        self.store.objective(self.model.rules(), self.model.atoms().values(), self.par.constraint_tolerance)
    }

    /// Sum of weight-free potentials of a rule at the current atom values.
    pub fn incompatibility(&self, rule: RuleId) -> F
    {
        self.store.incompatibility(rule, self.model.atoms().values())
    }

    /// Sum of weight-free potentials of a rule at the local copies of the last run.
    pub fn dual_incompatibility(&self, rule: RuleId) -> F
    {
        self.store.dual_incompatibility(rule)
    }

    pub fn model(&self) -> &Model<F>
    {
        &self.model
    }

    /// Mutable model; call [`MpeInference::rebuild`] after changing ground rules or observed values.
    pub fn model_mut(&mut self) -> &mut Model<F>
    {
        &mut self.model
    }

    pub fn store(&self) -> &TermStore<F>
    {
        &self.store
    }

    pub fn reasoner(&self) -> &AdmmReasoner<F>
    {
        &self.reasoner
    }

    /// Returns a handle to cancel a running [`MpeInference::infer`] from another thread.
    pub fn canceller(&self) -> Canceller
    {
        self.reasoner.canceller()
    }

    /// Releases terms and cached factorizations.
    pub fn close(&mut self)
    {
        self.store.close();
        self.reasoner.close();
    }
}
