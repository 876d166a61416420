use num_traits::Float;
use serde::{Serialize, Deserialize};
use std::path::Path;
use hlmrf_core::{AdmmParam, InitialValue, ReasonerError};
use crate::ModelError;

/// MPE inference parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceParam<F: Float>
{
    /// Initial local values on term reset.
    pub initial_value: InitialValue,
    /// Violation a hard constraint may have and still count as satisfied in the objective report.
    pub constraint_tolerance: F,
}

impl<F: Float> Default for InferenceParam<F>
{
    fn default() -> Self
    {
        InferenceParam {
            initial_value: InitialValue::Atom,
            constraint_tolerance: F::from(1e-5).unwrap_or_else(F::epsilon),
        }
    }
}

impl<F: Float> InferenceParam<F>
{
    /// Checks the parameters.
    pub fn check(&self) -> Result<(), ReasonerError>
    {
        if !(self.constraint_tolerance.is_finite() && self.constraint_tolerance >= F::zero()) {
            return Err(ReasonerError::InvalidParam("constraint_tolerance must be non-negative"));
        }
        Ok(())
    }
}

/// Configuration of [`crate::MpeInference`].
///
/// Loaded from TOML with an optional `[admm]` table of [`AdmmParam`] fields
/// and an optional `[inference]` table of [`InferenceParam`] fields:
/// ```toml
/// [admm]
/// step_size = 1.0
/// max_iter = 25000
/// num_threads = 4
///
/// [inference]
/// initial_value = "zero"
/// constraint_tolerance = 1e-5
/// ```
/// Random initial values take a seed: `initial_value = { random = { seed = 7 } }`.
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HlmrfConfig<F: Float>
{
    pub admm: AdmmParam<F>,
    pub inference: InferenceParam<F>,
}

impl<F: Float> Default for HlmrfConfig<F>
{
    fn default() -> Self
    {
        HlmrfConfig {
            admm: AdmmParam::default(),
            inference: InferenceParam::default(),
        }
    }
}

impl<F: Float> HlmrfConfig<F>
{
    /// Checks both parameter tables.
    pub fn check(&self) -> Result<(), ReasonerError>
    {
        self.admm.check()?;
        self.inference.check()
    }
}

impl<F: Float + for<'de> Deserialize<'de>> HlmrfConfig<F>
{
    /// Parses a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ModelError>
    {
        let config: Self = toml::from_str(s)?;
        config.check()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError>
    {
        let path = path.as_ref();
        log::debug!("loading config {}", path.display());

        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
