use hlmrf::prelude::*;
use hlmrf::*;
use hlmrf_core::ReasonerError;
use std::io::Write;
use std::time::Duration;

//

#[test]
fn test_from_toml_str()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let config = HlmrfConfig::<f64>::from_toml_str(r#"
        [admm]
        step_size = 0.5
        max_iter = 1000
        num_threads = 2
        time_limit = { secs = 3, nanos = 0 }

        [inference]
        initial_value = "zero"
        constraint_tolerance = 1e-4
    "#).unwrap();

    assert_eq!(config.admm.step_size, 0.5);
    assert_eq!(config.admm.max_iter, 1000);
    assert_eq!(config.admm.num_threads, Some(2));
    assert_eq!(config.admm.time_limit, Some(Duration::from_secs(3)));
    assert_eq!(config.admm.eps_abs, AdmmParam::<f64>::default().eps_abs);
    assert_eq!(config.inference.initial_value, InitialValue::Zero);
    assert_eq!(config.inference.constraint_tolerance, 1e-4);
}

#[test]
fn test_defaults()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let config = HlmrfConfig::<f64>::from_toml_str("").unwrap();
    assert_eq!(config, HlmrfConfig::default());

    let config = HlmrfConfig::<f64>::from_toml_str("[inference]\ninitial_value = \"atom\"\n").unwrap();
    assert_eq!(config.inference.initial_value, InitialValue::Atom);
    assert_eq!(config.admm, AdmmParam::default());

    let config = HlmrfConfig::<f64>::from_toml_str(r#"
        [admm]
        stop_check = 5

        [inference]
        initial_value = { random = { seed = 7 } }
    "#).unwrap();
    assert_eq!(config.admm.stop_check, 5);
    assert_eq!(config.inference.initial_value, InitialValue::Random { seed: 7 });
}

#[test]
fn test_invalid()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let rslt = HlmrfConfig::<f64>::from_toml_str("[inference]\ninitial_value = \"random\"\n");
    assert!(matches!(rslt, Err(ModelError::Config(_))));

    let rslt = HlmrfConfig::<f64>::from_toml_str("[admm]\nstep_size = -1.0\n");
    assert!(matches!(rslt, Err(ModelError::Reasoner(_))));

    let rslt = HlmrfConfig::<f64>::from_toml_str("[inference]\nconstraint_tolerance = -1e-6\n");
    assert!(matches!(rslt, Err(ModelError::Reasoner(ReasonerError::InvalidParam(_)))));

    let rslt = HlmrfConfig::<f64>::from_toml_str("[admm]\nstop_check = 0\n");
    assert!(matches!(rslt, Err(ModelError::Reasoner(ReasonerError::InvalidParam(_)))));

    let rslt = HlmrfConfig::<f64>::from_file("/nonexistent/hlmrf.toml");
    assert!(matches!(rslt, Err(ModelError::Io(_))));
}

#[test]
fn test_from_file()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[admm]\nmax_iter = 42\nrun_full_iterations = true").unwrap();

    let config = HlmrfConfig::<f64>::from_file(file.path()).unwrap();
    assert_eq!(config.admm.max_iter, 42);
    assert!(config.admm.run_full_iterations);
}
