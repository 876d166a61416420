use float_eq::assert_float_eq;
use hlmrf_core::*;

//

fn hinge(rule: RuleId, coeffs: Vec<f64>, atoms: Vec<usize>, constant: f64) -> Term<f64>
{
    Term::new(TermKind::HingeLoss, rule, Hyperplane::new(coeffs, atoms, constant).unwrap())
}

#[test]
fn test_add_records()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut rules = RuleTable::new();
    let r = rules.add_weighted("r", 1.).unwrap();

    let mut store = TermStore::new();
    assert!(store.is_empty());
    assert_eq!(store.num_atoms(), 0);

    let t0 = store.add(hinge(r, vec![1., -1.], vec![0, 3], 0.));
    let t1 = store.add(hinge(r, vec![2.], vec![3], 1.));

    assert_eq!(t0, TermId(0));
    assert_eq!(t1, TermId(1));
    assert_eq!(store.len(), 2);
    assert_eq!(store.num_atoms(), 4);
    assert_eq!(store.num_records(), 3);

    assert_eq!(store.records(0), &[LocalRecord { term: 0, slot: 0 }]);
    assert!(store.records(1).is_empty());
    assert_eq!(store.records(3), &[LocalRecord { term: 0, slot: 1 }, LocalRecord { term: 1, slot: 0 }]);
    assert!(store.records(100).is_empty());

    assert_eq!(store.get(t1).map(|t| t.size()), Some(1));
    assert!(store.get(TermId(2)).is_none());
}

#[test]
fn test_capacity_grows_only()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut store = TermStore::<f64>::new();
    store.ensure_atom_capacity(10);
    assert_eq!(store.num_atoms(), 10);

    store.ensure_atom_capacity(5);
    assert_eq!(store.num_atoms(), 10);

    store.add(hinge(RuleId(0), vec![1.], vec![2], 0.));
    assert_eq!(store.num_atoms(), 10);
    assert_eq!(store.records(2).len(), 1);
}

#[test]
fn test_reset()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut store = TermStore::new();
    let id = store.add(hinge(RuleId(0), vec![1., 1.], vec![1, 2], 0.));

    if let Some(t) = store.get_mut(id) {
        t.lagranges_mut().copy_from_slice(&[0.5, -0.5]);
    }

    // atom 2 lies beyond the consensus array
    store.reset(&[0.1, 0.2], InitialValue::Atom);
    let t = store.get(id).unwrap();
    assert_eq!(t.values(), &[0.2, 0.]);
    assert_eq!(t.lagranges(), &[0., 0.]);

    store.reset(&[0.1, 0.2, 0.3], InitialValue::Zero);
    assert_eq!(store.get(id).unwrap().values(), &[0., 0.]);
}

#[test]
fn test_reset_random()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut store = TermStore::new();
    store.add(hinge(RuleId(0), vec![1., 1.], vec![0, 1], 0.));
    store.add(hinge(RuleId(0), vec![1., -1., 2.], vec![1, 2, 3], 0.5));

    let values = |store: &TermStore<f64>| -> Vec<f64> {
        store.terms().iter().flat_map(|t| t.values().to_vec()).collect()
    };

    store.terms_mut()[1].lagranges_mut()[0] = 0.7;
    store.reset(&[], InitialValue::Random { seed: 11 });
    let first = values(&store);

    assert_eq!(first.len(), 5);
    assert!(first.iter().all(|v| (0. ..1.).contains(v)));
    assert!(store.terms().iter().all(|t| t.lagranges().iter().all(|y| *y == 0.)));

    // same seed, same values
    store.reset(&[], InitialValue::Zero);
    store.reset(&[], InitialValue::Random { seed: 11 });
    assert_eq!(values(&store), first);

    store.reset(&[], InitialValue::Random { seed: 12 });
    assert_ne!(values(&store), first);
}

#[test]
fn test_rule_terms()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut rules = RuleTable::new();
    let c = rules.add_constraint("c");
    let a = rules.add_weighted("a", 2.).unwrap();
    let b = rules.add_weighted("b", 0.5).unwrap();

    let mut store = TermStore::new();
    store.add(hinge(a, vec![1.], vec![0], 0.2));
    store.add(Term::new(
        TermKind::LinearConstraint(Comparator::Lte), c,
        Hyperplane::new(vec![1., 1.], vec![0, 1], 1.).unwrap(),
    ));
    store.add(hinge(a, vec![-1.], vec![1], -0.5));

    assert_eq!(store.rule_terms(a).count(), 2);
    assert_eq!(store.rule_terms(c).count(), 1);
    assert_eq!(store.rule_terms(b).count(), 0);
    assert_eq!(store.max_rule(), Some(a.0));

    let z = [0.6, 0.7];
    // max(0, 0.6 - 0.2) + max(0, -0.7 + 0.5)
    assert_float_eq!(store.incompatibility(a, &z), 0.4, abs <= 1e-12);
    assert_float_eq!(store.incompatibility(c, &z), 0.3, abs <= 1e-12);

    store.reset(&z, InitialValue::Atom);
    assert_float_eq!(store.dual_incompatibility(a), 0.4, abs <= 1e-12);

    let obj = store.objective(&rules, &z, 1e-6);
    assert_float_eq!(obj.value, 0.8, abs <= 1e-12);
    assert_eq!(obj.violated_constraints, 1);

    let obj = store.objective(&rules, &z, 0.5);
    assert_eq!(obj.violated_constraints, 0);
}

#[test]
fn test_clear()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut store = TermStore::new();
    store.add(hinge(RuleId(0), vec![1.], vec![4], 0.));
    store.clear();

    assert!(store.is_empty());
    assert_eq!(store.num_atoms(), 0);
    assert_eq!(store.num_records(), 0);
    assert_eq!(store.max_rule(), None);

    store.add(hinge(RuleId(0), vec![1.], vec![1], 0.));
    assert_eq!(store.num_atoms(), 2);

    store.close();
    assert!(store.is_empty());
}
