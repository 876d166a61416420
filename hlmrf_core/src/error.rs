use thiserror::Error;

/// Reasoner errors.
///
/// Construction errors are reported before any optimization starts.
/// [`ReasonerError::FactorizationFailed`] and [`ReasonerError::ThreadPool`] indicate
/// an internal failure and are not meant to be retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReasonerError
{
    /// Hyperplane without any variable.
    #[error("EmptyHyperplane: hyperplane has no variable")]
    EmptyHyperplane,
    /// Length of coefficients and atom indexes differ.
    #[error("SizeMismatch: {coeffs} coefficients for {atoms} atoms")]
    SizeMismatch { coeffs: usize, atoms: usize },
    /// Zero coefficient at a local slot.
    #[error("ZeroCoefficient: coefficient of slot {slot} is zero")]
    ZeroCoefficient { slot: usize },
    /// NaN or infinite value given to a hyperplane or a consensus array.
    #[error("NonFinite: {0} is not finite")]
    NonFinite(&'static str),

    /// Negative or non-finite rule weight.
    #[error("InvalidWeight: weight of rule {rule} must be finite and non-negative")]
    InvalidWeight { rule: usize },
    /// Rule index out of the rule table.
    #[error("UnknownRule: rule {rule} is not in the table of {len} rules")]
    UnknownRule { rule: usize, len: usize },
    /// Weight access to a hard constraint rule.
    #[error("NotWeighted: rule {rule} is a hard constraint")]
    NotWeighted { rule: usize },

    /// Consensus array shorter than the atoms referenced by terms.
    #[error("ConsensusTooShort: consensus has {len} values but {required} atoms are referenced")]
    ConsensusTooShort { len: usize, required: usize },
    /// Invalid [`crate::AdmmParam`].
    #[error("InvalidParam: {0}")]
    InvalidParam(&'static str),

    /// Cholesky factorization of a matrix positive-definite by construction failed.
    #[error("FactorizationFailed: non-positive pivot at row {row}")]
    FactorizationFailed { row: usize },
    /// Worker pool could not be built.
    #[error("ThreadPool: {0}")]
    ThreadPool(String),
}
