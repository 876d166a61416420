use num_traits::Float;
use core::fmt::{Debug, LowerExp};

/// Floating point data type used as scalars of terms and consensus values.
///
/// Blanket-implemented for every `num_traits::Float` that can be shared among worker threads.
pub trait AdmmFloat: Float + Debug + LowerExp + Send + Sync + 'static {}

impl<F> AdmmFloat for F
where F: Float + Debug + LowerExp + Send + Sync + 'static {}

/// Converts a literal into `F`.
///
/// Every `Float` can represent small literals, so this never fails for the constants used in this crate.
pub(crate) fn lit<F: Float>(v: f64) -> F
{
    F::from(v).unwrap_or_else(F::nan)
}
