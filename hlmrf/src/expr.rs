use num_traits::Float;
use crate::AtomId;

/// Linear expression builder
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// \\(\sum_i a_i x_{{\rm atom}_i} + k\\), the body of a ground rule.
/// An atom may appear more than once; summands are merged at grounding.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearExpr<F>
{
    summands: Vec<(AtomId, F)>,
    constant: F,
}

impl<F: Float> LinearExpr<F>
{
    /// Creates an empty expression, that is zero.
    pub fn new() -> Self
    {
        LinearExpr {
            summands: Vec::new(),
            constant: F::zero(),
        }
    }

    /// Adds \\(a x_{\rm atom}\\).
    pub fn atom(mut self, atom: AtomId, coeff: F) -> Self
    {
        self.summands.push((atom, coeff));
        self
    }

    /// Adds a constant \\(k\\).
    pub fn constant(mut self, k: F) -> Self
    {
        self.constant = self.constant + k;
        self
    }

    pub fn summands(&self) -> &[(AtomId, F)]
    {
        &self.summands
    }

    pub fn constant_value(&self) -> F
    {
        self.constant
    }
}

impl<F: Float> Default for LinearExpr<F>
{
    fn default() -> Self
    {
        Self::new()
    }
}
