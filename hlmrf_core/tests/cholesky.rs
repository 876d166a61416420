use float_eq::assert_float_eq;
use hlmrf_core::*;

//

#[test]
fn test_factor_solve()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mat = [
        4., 2., 2.,
        2., 5., 3.,
        2., 3., 6.,
    ];
    let l = CholeskyFactor::factor(3, &mat).unwrap();

    assert_eq!(l.dim(), 3);
    assert_eq!(l.get(0, 0), 2.);
    assert_eq!(l.get(0, 2), 0.);

    // L L^T reproduces the matrix
    for i in 0.. 3 {
        for j in 0.. 3 {
            let v: f64 = (0.. 3).map(|k| l.get(i, k) * l.get(j, k)).sum();
            assert_float_eq!(v, mat[i * 3 + j], abs <= 1e-12);
        }
    }

    let x_exp = [1., -2., 0.5];
    let mut x: Vec<f64> = (0.. 3).map(|i| (0.. 3).map(|j| mat[i * 3 + j] * x_exp[j]).sum()).collect();
    l.solve(&mut x);

    assert_float_eq!(x, x_exp.to_vec(), abs_all <= 1e-12);
}

#[test]
fn test_not_positive_definite()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mat = [
        1., 2.,
        2., 1.,
    ];
    assert_eq!(CholeskyFactor::factor(2, &mat), Err(ReasonerError::FactorizationFailed { row: 1 }));
}

#[test]
fn test_rank_one()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let a = [1., -0.5, 2.];
    let l = CholeskyFactor::factor_rank_one(0.5, 2., &a).unwrap();

    for i in 0.. 3 {
        for j in 0.. 3 {
            let v: f64 = (0.. 3).map(|k| l.get(i, k) * l.get(j, k)).sum();
            let m = 4. * a[i] * a[j] + if i == j {0.5} else {0.};
            assert_float_eq!(v, m, abs <= 1e-12);
        }
    }
}

#[test]
fn test_cache_stats()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let cache = CholeskyCache::<f64>::new();
    assert!(cache.is_empty());

    let a = [1., 1., 1.];
    let b = [1., 1., -1.];

    let l1 = cache.get_or_factor(1., 2., &a).unwrap();
    let l2 = cache.get_or_factor(1., 2., &a).unwrap();
    let _ = cache.get_or_factor(1., 3., &a).unwrap();
    let _ = cache.get_or_factor(1., 2., &b).unwrap();
    let _ = cache.get_or_factor(2., 2., &a).unwrap();

    assert!(std::sync::Arc::ptr_eq(&l1, &l2));
    assert_eq!(cache.len(), 4);
    assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 4, factorizations: 4 });

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats(), CacheStats::default());
}

#[test]
fn test_cache_concurrent()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let cache = CholeskyCache::<f64>::new();
    let a = [0.5, -1., 1.5, 2., -0.25];

    let factors: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0.. 8)
            .map(|_| s.spawn(|| cache.get_or_factor(1., 2., &a).unwrap()))
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // every thread sees the single surviving factor
    let stats = cache.stats();
    assert_eq!(stats.factorizations, 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(stats.hits + stats.misses, 8);
    for l in factors.iter() {
        assert!(std::sync::Arc::ptr_eq(l, &factors[0]));
    }
}

#[test]
fn test_cache_concurrent_keys()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let cache = CholeskyCache::<f64>::new();
    let a = [0.5, -1., 1.5, 2.];
    let weights = [0.5, 1., 2., 4., 8., 16.];

    let cache_ref = &cache;
    std::thread::scope(|s| {
        for w in weights {
            for _ in 0.. 4 {
                s.spawn(move || {
                    let l = cache_ref.get_or_factor(1., w, &a).unwrap();
                    assert_eq!(l.dim(), 4);
                });
            }
        }
    });

    // one factor per weight, stale weights stay cached
    let stats = cache.stats();
    assert_eq!(stats.factorizations, weights.len());
    assert_eq!(cache.len(), weights.len());
    assert_eq!(stats.hits + stats.misses, 4 * weights.len());

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats(), CacheStats::default());
}
