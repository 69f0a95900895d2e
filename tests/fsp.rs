//! End-to-end FSP runs against analytically known solutions.

use fsp_core::fsp::{CmeOptions, FspSolver, FullBoundaryExpander, SupportExpander};
use fsp_core::model::{Model, Reaction};
use fsp_core::state::LexicalSet;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two independent unit-rate pure-birth reactions.
fn independent_births() -> Model {
    Model::new(
        "independent-births",
        vec![
            Reaction::new(|_| 1.0, vec![1, 0]),
            Reaction::new(|_| 1.0, vec![0, 1]),
        ],
        vec![0, 0],
    )
}

fn poisson_pmf(lambda: f64, k: usize) -> f64 {
    let mut factorial = 1.0;
    for i in 1..=k {
        factorial *= i as f64;
    }
    (-lambda).exp() * lambda.powi(k as i32) / factorial
}

#[test]
fn test_poisson_product_accuracy() {
    init_logging();

    let model = independent_births();
    let domain = LexicalSet::from_rect(&[11, 11]);
    let expander = Box::new(FullBoundaryExpander::new(model.transitions(), 1));
    let mut solver =
        FspSolver::new(model, domain, expander, CmeOptions::default()).unwrap();

    solver.step(1.0, 1e-6).unwrap();
    let (p, p_sink) = solver.y().unwrap();

    // the interior matches the product of two Poisson(1.0) marginals;
    // boundary coordinate 10 is excluded since its outflow is clipped
    for i in 0..10 {
        for j in 0..10 {
            let expected = poisson_pmf(1.0, i) * poisson_pmf(1.0, j);
            let got = p.get(&[i as i32, j as i32]);
            assert!(
                (got - expected).abs() < 1e-6,
                "p({i},{j}) = {got}, expected {expected}"
            );
        }
    }

    // pure-birth flux never re-enters the domain, so the sink holds
    // exactly the mass the untruncated process puts outside {0..10}^2
    let in_domain: f64 = (0..=10).map(|k| poisson_pmf(1.0, k)).sum();
    let escaped = 1.0 - in_domain * in_domain;
    assert!(p_sink > 0.0);
    assert!(
        (p_sink - escaped).abs() < 0.05 * escaped,
        "p_sink = {p_sink}, true escaped mass = {escaped}"
    );

    // conservation across domain and sink
    assert!((p.total() + p_sink - 1.0).abs() < 1e-8);
}

#[test]
fn test_adaptive_expansion_from_minimal_domain() {
    init_logging();

    // start from just the initial state; the controller must grow the
    // domain until the truncation budget is met
    let model = independent_births();
    let transitions = model.transitions();
    let domain = LexicalSet::from_states(2, vec![vec![0, 0]]);
    let expander = Box::new(FullBoundaryExpander::new(transitions, 2));
    let mut solver =
        FspSolver::new(model, domain, expander, CmeOptions::default()).unwrap();

    solver.step(1.0, 1e-4).unwrap();
    let (p, p_sink) = solver.y().unwrap();
    assert!(p_sink <= 1e-4);
    assert!(solver.domain().len() > 1);
    assert!((p.total() + p_sink - 1.0).abs() < 1e-6);

    let expected = poisson_pmf(1.0, 0) * poisson_pmf(1.0, 0);
    assert!((p.get(&[0, 0]) - expected).abs() < 1e-4);
}

#[test]
fn test_support_guided_expansion() {
    init_logging();

    let model = independent_births();
    let transitions = model.transitions();
    let domain = LexicalSet::from_states(2, vec![vec![0, 0]]);
    let expander = Box::new(SupportExpander::new(transitions, 2, 1e-8));
    let mut solver =
        FspSolver::new(model, domain, expander, CmeOptions::default()).unwrap();

    // several monotone steps, each allowed a fresh slice of error
    for (step, t) in [0.25, 0.5, 1.0].iter().enumerate() {
        solver.step(*t, 1e-5).unwrap();
        let (p, p_sink) = solver.y().unwrap();
        assert!(
            p_sink <= 1e-5 * (step as f64 + 1.0) + 1e-12,
            "cumulative budget exceeded at t = {t}"
        );
        assert!((p.total() + p_sink - 1.0).abs() < 1e-6);
    }
    assert_eq!(solver.t(), 1.0);
}

#[test]
fn test_domain_serde_round_trip() {
    let domain = LexicalSet::from_rect(&[3, 2]);
    let json = serde_json::to_string(&domain).unwrap();
    let back: LexicalSet = serde_json::from_str(&json).unwrap();
    assert_eq!(domain, back);
}
