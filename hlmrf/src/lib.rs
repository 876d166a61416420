/*!
Hinge-Loss Markov Random Field (HL-MRF) models and their MPE inference, solved by [`hlmrf_core`].

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

# General usage

1. Create a [`Model`] and register atoms in its [`AtomStore`]:
   random variables to infer and observed atoms with fixed values.
1. Add weighted rules with their [`RuleShape`] and hard constraint rules.
1. Ground the rules with [`LinearExpr`] bodies.
   A loss rule grounded with \\(e\\) contributes \\(w \max(0, e)\\), \\(w e\\), or their squares;
   a constraint rule contributes \\(e \ \square\ 0\\).
1. Create an [`MpeInference`], optionally from an [`HlmrfConfig`], and invoke [`MpeInference::infer`].

# Examples

Two mutually exclusive labels, with evidence favoring the first:
\\[
\begin{array}{ll}
{\rm minimize} & 2 \max(0, 0.8 - x_a) + \max(0, 0.5 - x_b) \\\\
{\rm subject \ to} & x_a + x_b = 1
\end{array}
\\]

```
use float_eq::assert_float_eq;
use hlmrf::prelude::*;
use hlmrf::*;

//env_logger::init(); // Use any logger crate as `hlmrf` uses `log` crate.

let mut model = Model::<f64>::new();
let a = model.atoms_mut().add_random("Label(x, a)", 0.5).unwrap();
let b = model.atoms_mut().add_random("Label(x, b)", 0.5).unwrap();
let ev = model.atoms_mut().add_observed("Evidence(x, a)", 0.8).unwrap();

let prior_a = model.add_loss_rule("Evidence -> Label", 2., true, false).unwrap();
let prior_b = model.add_loss_rule("Label b", 1., true, false).unwrap();
let exclusive = model.add_constraint_rule("functional", Comparator::Eq);

model.ground(prior_a, LinearExpr::new().atom(ev, 1.).atom(a, -1.)).unwrap();
model.ground(prior_b, LinearExpr::new().atom(b, -1.).constant(0.5)).unwrap();
model.ground(exclusive, LinearExpr::new().atom(a, 1.).atom(b, 1.).constant(-1.)).unwrap();

let mut mpe = MpeInference::new(model).unwrap();
let rslt = mpe.infer().unwrap();

assert!(rslt.report.converged());
let atoms = mpe.model().atoms();
assert_float_eq!(atoms.value(a).unwrap(), 0.8, abs <= 1e-2);
assert_float_eq!(atoms.value(b).unwrap(), 0.2, abs <= 1e-2);
```
*/

mod error;

pub use error::*;

//

mod atom;
mod expr;
mod model;
mod generator;

pub use atom::*;
pub use expr::*;
pub use model::*;
pub use generator::*;

//

mod config;
mod inference;

pub use config::*;
pub use inference::*;

//

/// Prelude
pub mod prelude
{
    pub use hlmrf_core::{AdmmParam, AdmmReasoner, AdmmReport, Comparator, InitialValue, Objective, RuleId, StopReason};
}
