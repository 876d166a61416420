//! Hyperplane algebra

use num_traits::Float;
use crate::{ReasonerError, CholeskyFactor};
use crate::float::lit;

/// Hyperplane over a small set of atoms.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// \\[
/// \left\lbrace x \in \mathbb{R}^n \ \middle|\ a^T x = c \right\rbrace
/// \\]
/// where the \\(i\\)-th local slot \\(x_i\\) is a copy of the consensus variable `atoms[i]`.
/// Every coefficient \\(a_i\\) is non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperplane<F>
{
    coeffs: Vec<F>,
    atoms: Vec<usize>,
    constant: F,
}

impl<F: Float> Hyperplane<F>
{
    /// Creates a hyperplane.
    ///
    /// Returns `Err` if there is no variable, lengths differ, a coefficient is zero,
    /// or a value is not finite.
    /// * `coeffs` is \\(a\\).
    /// * `atoms` are indexes into the consensus array, one per local slot.
    /// * `constant` is \\(c\\).
    pub fn new(coeffs: Vec<F>, atoms: Vec<usize>, constant: F) -> Result<Self, ReasonerError>
    {
        if coeffs.len() != atoms.len() {
            return Err(ReasonerError::SizeMismatch { coeffs: coeffs.len(), atoms: atoms.len() });
        }
        if coeffs.is_empty() {
            return Err(ReasonerError::EmptyHyperplane);
        }
        for (slot, a) in coeffs.iter().enumerate() {
            if !a.is_finite() {
                return Err(ReasonerError::NonFinite("coefficient"));
            }
            if a.is_zero() {
                return Err(ReasonerError::ZeroCoefficient { slot });
            }
        }
        if !constant.is_finite() {
            return Err(ReasonerError::NonFinite("constant"));
        }

        Ok(Hyperplane {
            coeffs,
            atoms,
            constant,
        })
    }

    /// Number of local slots.
    pub fn size(&self) -> usize
    {
        self.coeffs.len()
    }

    pub fn coeffs(&self) -> &[F]
    {
        &self.coeffs
    }

    pub fn atoms(&self) -> &[usize]
    {
        &self.atoms
    }

    pub fn constant(&self) -> F
    {
        self.constant
    }

    /// Largest atom index referenced.
    pub fn max_atom(&self) -> usize
    {
        self.atoms.iter().copied().max().unwrap_or(0)
    }

    /// Calculates \\(a^T x\\) of local slot values `x`.
    pub fn dot(&self, x: &[F]) -> F
    {
        assert_eq!(x.len(), self.size());

        let mut sum = F::zero();
        for (a, v) in self.coeffs.iter().zip(x) {
            sum = sum + *a * *v;
        }
        sum
    }

    /// Calculates \\(a^T x\\) where \\(x\\) is gathered from the consensus array by atom index.
    pub fn dot_consensus(&self, consensus: &[F]) -> F
    {
        let mut sum = F::zero();
        for (a, i) in self.coeffs.iter().zip(&self.atoms) {
            sum = sum + *a * consensus[*i];
        }
        sum
    }

    fn sq_norm(&self) -> F
    {
        let mut sum = F::zero();
        for a in &self.coeffs {
            sum = sum + *a * *a;
        }
        sum
    }

    /// Unconstrained minimizer of the augmented term \\(x_i = z_i - y_i / \rho\\).
    ///
    /// * `step` is \\(\rho\\).
    /// * `consensus` is the consensus array \\(z\\) indexed by atom.
    /// * `lagranges` are the local multipliers \\(y\\).
    /// * `x` is overwritten with the result.
    pub(crate) fn step(&self, step: F, consensus: &[F], lagranges: &[F], x: &mut [F])
    {
        assert_eq!(x.len(), self.size());
        assert_eq!(lagranges.len(), self.size());

        for ((v, i), y) in x.iter_mut().zip(&self.atoms).zip(lagranges) {
            *v = consensus[*i] - *y / step;
        }
    }

    /// Unconstrained step with an additional linear gradient \\(w a\\),
    /// that is \\(x_i = z_i - y_i / \rho - w a_i / \rho\\).
    pub(crate) fn linear_step(&self, step: F, weight: F, consensus: &[F], lagranges: &[F], x: &mut [F])
    {
        self.step(step, consensus, lagranges, x);

        for (v, a) in x.iter_mut().zip(&self.coeffs) {
            *v = *v - weight * *a / step;
        }
    }

    /// Projects the point `x` orthogonally onto the hyperplane, in place.
    ///
    /// When `x` holds the unconstrained step, the result minimizes the augmented term subject to \\(a^T x = c\\).
    pub(crate) fn project(&self, x: &mut [F])
    {
        assert_eq!(x.len(), self.size());

        let c = self.constant;

        match self.size() {
            1 => {
                x[0] = c / self.coeffs[0];
            },
            2 => {
                // eliminates x1 = (c - a0 x0) / a1
                let (a0, a1) = (self.coeffs[0], self.coeffs[1]);
                let (p0, p1) = (x[0], x[1]);

                let x0 = (a1 * a1 * p0 + a0 * c - a0 * a1 * p1) / (a0 * a0 + a1 * a1);
                x[0] = x0;
                x[1] = (c - a0 * x0) / a1;
            },
            _ => {
                let norm = self.sq_norm().sqrt();

                // signed distance from x to the plane along the unit normal
                let mut m = F::zero();
                for (v, a) in x.iter().zip(&self.coeffs) {
                    m = m + *v * (*a / norm);
                }
                m = m - c / norm;

                for (v, a) in x.iter_mut().zip(&self.coeffs) {
                    *v = *v - m * (*a / norm);
                }
            },
        }
    }

    /// Builds the right-hand side \\(b_i = \rho z_i - y_i + 2 w a_i c\\) of the weighted squared system into `x`.
    pub(crate) fn squared_rhs(&self, step: F, weight: F, consensus: &[F], lagranges: &[F], x: &mut [F])
    {
        let f2 = lit::<F>(2.);

        self.step(step, consensus, lagranges, x);

        for (v, a) in x.iter_mut().zip(&self.coeffs) {
            *v = step * *v + f2 * weight * *a * self.constant;
        }
    }

    /// Minimizes \\(w (a^T x - c)^2 + {\rho \over 2} \\|x - z + y / \rho\\|_2^2\\) for one or two slots.
    ///
    /// `x` holds the right-hand side from [`Hyperplane::squared_rhs`] on entry, the minimizer on exit.
    /// Returns `false` without touching `x` if the size needs a factorization.
    pub(crate) fn solve_squared_small(&self, step: F, weight: F, x: &mut [F]) -> bool
    {
        let f2 = lit::<F>(2.);

        match self.size() {
            1 => {
                let a = self.coeffs[0];
                x[0] = x[0] / (f2 * weight * a * a + step);
                true
            },
            2 => {
                let (c0, c1) = (self.coeffs[0], self.coeffs[1]);

                let a0 = f2 * weight * c0 * c0 + step;
                let b1 = f2 * weight * c1 * c1 + step;
                let a1b0 = f2 * weight * c0 * c1;

                let x1 = (x[1] - a1b0 * x[0] / a0) / (b1 - a1b0 * a1b0 / a0);
                x[0] = (x[0] - a1b0 * x1) / a0;
                x[1] = x1;
                true
            },
            _ => false,
        }
    }

    /// Factorizes \\(M = 2 w a a^T + \rho I\\) for the weighted squared system of any size.
    pub fn factor_squared(&self, step: F, weight: F) -> Result<CholeskyFactor<F>, ReasonerError>
    {
        CholeskyFactor::factor_rank_one(step, weight, &self.coeffs)
    }
}
