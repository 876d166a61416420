/*!
A consensus ADMM reasoner for Hinge-Loss Markov Random Field (HL-MRF) MAP inference.

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

An HL-MRF objective is a weighted sum of convex potentials over variables \\(z \in [0, 1]^N\\),
each potential being linear, hinge, squared linear or squared hinge in a hyperplane \\(a^T x - c\\),
plus hard linear constraints.
[`AdmmReasoner`] splits the objective into one small sub-problem per [`Term`],
solves each in closed form, and drives the local copies to consensus.

# General usage

1. Register rules and their weights in a [`RuleTable`].
1. Build a [`Hyperplane`] for each grounded potential, wrap it in a [`Term`] of the right [`TermKind`],
   and [`TermStore::add`] it.
1. [`TermStore::reset`] the local copies from the starting consensus values.
1. Create an [`AdmmReasoner`], optionally set its parameters, and call [`AdmmReasoner::optimize`].

The `log` crate is used for progress output; install any logger to see it.

# Examples

```
use float_eq::assert_float_eq;
use hlmrf_core::*;

let mut rules = RuleTable::<f64>::new();
let sum_to_one = rules.add_constraint("x0 + x1 = 1");
let prior = rules.add_weighted("x0 near 0.3", 2.0).unwrap();

let mut store = TermStore::new();
store.add(Term::new(
    TermKind::LinearConstraint(Comparator::Eq), sum_to_one,
    Hyperplane::new(vec![1., 1.], vec![0, 1], 1.).unwrap(),
));
store.add(Term::new(
    TermKind::SquaredLinearLoss, prior,
    Hyperplane::new(vec![1.], vec![0], 0.3).unwrap(),
));

let mut z = vec![0.5, 0.5];
store.reset(&z, InitialValue::Atom);

let reasoner = AdmmReasoner::new().par(|p| {
    p.max_iter = 10_000;
    p.eps_abs = 1e-8;
    p.eps_rel = 1e-8;
});
let report = reasoner.optimize(&mut store, &rules, &mut z).unwrap();

assert!(report.converged());
assert_float_eq!(z, vec![0.3, 0.7], abs_all <= 1e-4);
```
*/

mod float;

pub use float::AdmmFloat;

//

mod error;
mod param;

pub use error::*;
pub use param::*;

//

mod rule;
mod hyperplane;
mod cholesky;
mod term;
mod store;

pub use rule::*;
pub use hyperplane::*;
pub use cholesky::*;
pub use term::*;
pub use store::*;

//

mod admm;

pub use admm::*;
