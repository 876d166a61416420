use float_eq::assert_float_eq;
use hlmrf::prelude::*;
use hlmrf::*;
use hlmrf_core::{ReasonerError, TermKind, TermStore};

//

#[test]
fn test_atom_store()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut atoms = AtomStore::<f64>::new();
    let x = atoms.add_random("X", 0.25).unwrap();
    let y = atoms.add_observed("Y", 1.).unwrap();

    assert_eq!(atoms.len(), 2);
    assert_eq!(atoms.id("Y"), Some(y));
    assert_eq!(atoms.id("Z"), None);
    assert_eq!(atoms.name(x).unwrap(), "X");
    assert!(!atoms.is_observed(x).unwrap());
    assert!(atoms.is_observed(y).unwrap());
    assert_eq!(atoms.values(), &[0.25, 1.]);

    atoms.set_value(x, 0.75).unwrap();
    assert_eq!(atoms.value(x).unwrap(), 0.75);

    assert!(matches!(atoms.add_random("X", 0.5), Err(ModelError::DuplicateAtom(n)) if n == "X"));
    assert!(matches!(atoms.add_random("W", 1.5), Err(ModelError::AtomValueOutOfRange { atom: 2 })));
    assert!(matches!(atoms.add_observed("W", f64::NAN), Err(ModelError::AtomValueOutOfRange { .. })));
    assert!(matches!(atoms.set_value(x, -0.1), Err(ModelError::AtomValueOutOfRange { atom: 0 })));
    assert!(matches!(atoms.value(AtomId(5)), Err(ModelError::UnknownAtom { atom: 5, len: 2 })));

    let names: Vec<&str> = atoms.iter().map(|(_, n, _)| n).collect();
    assert_eq!(names, vec!["X", "Y"]);
}

#[test]
fn test_ground_errors()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = Model::<f64>::new();
    let x = model.atoms_mut().add_random("X", 0.5).unwrap();
    let r = model.add_loss_rule("r", 1., true, false).unwrap();

    assert!(matches!(
        model.ground(RuleId(3), LinearExpr::new().atom(x, 1.)),
        Err(ModelError::Reasoner(ReasonerError::UnknownRule { rule: 3, .. }))
    ));
    assert!(matches!(
        model.ground(r, LinearExpr::new().atom(AtomId(9), 1.)),
        Err(ModelError::UnknownAtom { atom: 9, .. })
    ));
    assert!(matches!(
        model.add_loss_rule("neg", -1., true, false),
        Err(ModelError::Reasoner(ReasonerError::InvalidWeight { .. }))
    ));
    assert!(model.ground_rules().is_empty());

    model.ground(r, LinearExpr::new().atom(x, 1.)).unwrap();
    assert_eq!(model.ground_rules().len(), 1);
    model.clear_groundings();
    assert!(model.ground_rules().is_empty());
}

#[test]
fn test_process_hyperplane()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut atoms = AtomStore::<f64>::new();
    let x = atoms.add_random("X", 0.5).unwrap();
    let y = atoms.add_random("Y", 0.5).unwrap();
    let o = atoms.add_observed("O", 0.4).unwrap();

    // 2x + 0.5 o - y + x + 0.3 = 3x - y + 0.5  ->  3x - y = -0.5
    let e = LinearExpr::new().atom(x, 2.).atom(o, 0.5).atom(y, -1.).atom(x, 1.).constant(0.3);
    let hp = TermGenerator::process_hyperplane(&e, &atoms, false).unwrap().unwrap();
    assert_eq!(hp.atoms(), &[0, 1]);
    assert_eq!(hp.coeffs(), &[3., -1.]);
    assert_float_eq!(hp.constant(), -0.5, abs <= 1e-12);

    // x cancels
    let e = LinearExpr::new().atom(x, 0.5).atom(y, 1.).atom(x, -0.5);
    let hp = TermGenerator::process_hyperplane(&e, &atoms, false).unwrap().unwrap();
    assert_eq!(hp.atoms(), &[1]);

    // only observed atoms and constants
    let e = LinearExpr::new().atom(o, 1.).constant(-1.);
    assert!(TermGenerator::process_hyperplane(&e, &atoms, false).unwrap().is_none());
    let e = LinearExpr::new().atom(x, 1.).atom(x, -1.);
    assert!(TermGenerator::process_hyperplane(&e, &atoms, false).unwrap().is_none());

    // x cancels in a hinge as well, and max(0, 1 - y) is still a potential
    let e = LinearExpr::new().constant(1.).atom(x, -1.).atom(y, -1.).atom(x, 1.);
    let hp = TermGenerator::process_hyperplane(&e, &atoms, true).unwrap().unwrap();
    assert_eq!(hp.atoms(), &[1]);
    assert_eq!(hp.coeffs(), &[-1.]);
    let e = LinearExpr::new().atom(x, 1.).atom(x, -1.).atom(y, 1.).constant(-0.5);
    let hp = TermGenerator::process_hyperplane(&e, &atoms, true).unwrap().unwrap();
    assert_eq!(hp.atoms(), &[1]);
    assert_float_eq!(hp.constant(), 0.5, abs <= 1e-12);

    // a hinge that is zero on the whole box: max(0, x - y - 1), max(0, -x - 2 o)
    let e = LinearExpr::new().atom(x, 1.).atom(y, -1.).constant(-1.);
    assert!(TermGenerator::process_hyperplane(&e, &atoms, true).unwrap().is_none());
    assert!(TermGenerator::process_hyperplane(&e, &atoms, false).unwrap().is_some());
    let e = LinearExpr::new().atom(x, -1.).atom(o, -2.);
    assert!(TermGenerator::process_hyperplane(&e, &atoms, true).unwrap().is_none());

    // active only at the corner x = y = 1: kept
    let e = LinearExpr::new().atom(x, 1.).atom(y, 1.).constant(-1.9);
    assert!(TermGenerator::process_hyperplane(&e, &atoms, true).unwrap().is_some());

    let e = LinearExpr::new().atom(x, f64::INFINITY);
    assert!(matches!(
        TermGenerator::process_hyperplane(&e, &atoms, false),
        Err(ModelError::Reasoner(ReasonerError::NonFinite(_)))
    ));
}

#[test]
fn test_generate()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = Model::<f64>::new();
    let x = model.atoms_mut().add_random("X", 0.5).unwrap();
    let y = model.atoms_mut().add_random("Y", 0.5).unwrap();
    let o = model.atoms_mut().add_observed("O", 1.).unwrap();

    let shapes = [(false, false), (true, false), (false, true), (true, true)];
    let mut loss = Vec::new();
    for (hinge, squared) in shapes {
        loss.push(model.add_loss_rule("loss", 1., hinge, squared).unwrap());
    }
    let c = model.add_constraint_rule("c", Comparator::Lte);

    for r in loss.iter() {
        model.ground(*r, LinearExpr::new().atom(x, 1.).atom(y, -1.)).unwrap();
    }
    model.ground(c, LinearExpr::new().atom(x, 1.).atom(y, 1.).constant(-1.)).unwrap();
    model.ground(c, LinearExpr::new().atom(o, 1.).constant(-1.)).unwrap();

    let mut store = TermStore::new();
    let n = TermGenerator::generate(&model, &mut store).unwrap();
    assert_eq!(n, 5);
    assert_eq!(store.num_atoms(), 3);
    assert!(store.records(o.0).is_empty());

    let kinds: Vec<TermKind> = store.terms().iter().map(|t| t.kind()).collect();
    assert_eq!(kinds, vec![
        TermKind::LinearLoss,
        TermKind::HingeLoss,
        TermKind::SquaredLinearLoss,
        TermKind::SquaredHingeLoss,
        TermKind::LinearConstraint(Comparator::Lte),
    ]);
    assert_eq!(store.terms()[4].hyperplane().constant(), 1.);
    assert_eq!(store.rule_terms(c).count(), 1);
}
