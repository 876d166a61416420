use num_traits::Float;
use serde::{Serialize, Deserialize};
use std::time::Duration;
use crate::ReasonerError;
use crate::float::lit;

/// ADMM reasoner parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmmParam<F: Float>
{
    /// Step size (penalty parameter, sometimes called rho or eta). Constant across a run.
    pub step_size: F,
    /// Max iteration number of a run.
    pub max_iter: usize,
    /// Absolute error component of the stopping criteria.
    pub eps_abs: F,
    /// Relative error component of the stopping criteria.
    pub eps_rel: F,
    /// Runs all of `max_iter` iterations even after the stopping criteria are met.
    pub run_full_iterations: bool,
    /// Period of iterations to compute residuals and test the stopping criteria.
    /// The last iteration before `max_iter` is always tested.
    pub stop_check: usize,
    /// Period of iterations to output progress log(for debug/trace level).
    pub log_period: usize,
    /// Number of worker threads. `None` means the global rayon pool.
    pub num_threads: Option<usize>,
    /// Wall-clock limit of a run. `None` means no limit.
    pub time_limit: Option<Duration>,
}

impl<F: Float> Default for AdmmParam<F>
{
    fn default() -> Self
    {
        AdmmParam {
            step_size: F::one(),
            max_iter: 25_000,
            eps_abs: lit(1e-5),
            eps_rel: lit(1e-3),
            run_full_iterations: false,
            stop_check: 1,
            log_period: 50,
            num_threads: None,
            time_limit: None,
        }
    }
}

impl<F: Float> AdmmParam<F>
{
    /// Checks the parameters.
    ///
    /// Returns `Err` with [`ReasonerError::InvalidParam`] naming the first invalid field.
    pub fn check(&self) -> Result<(), ReasonerError>
    {
        if !(self.step_size.is_finite() && self.step_size > F::zero()) {
            return Err(ReasonerError::InvalidParam("step_size must be positive"));
        }
        if self.max_iter == 0 {
            return Err(ReasonerError::InvalidParam("max_iter must be positive"));
        }
        if !(self.eps_abs.is_finite() && self.eps_abs > F::zero()) {
            return Err(ReasonerError::InvalidParam("eps_abs must be positive"));
        }
        if !(self.eps_rel.is_finite() && self.eps_rel > F::zero()) {
            return Err(ReasonerError::InvalidParam("eps_rel must be positive"));
        }
        if self.stop_check == 0 {
            return Err(ReasonerError::InvalidParam("stop_check must be positive"));
        }
        if self.num_threads == Some(0) {
            return Err(ReasonerError::InvalidParam("num_threads must be positive"));
        }
        Ok(())
    }
}
