//! End-to-end runs against known target functions.

use std::sync::Arc;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use geneq::{Config, OperatorSet, SymbolicRegressor, TreeGenerator};

fn linspace(start: f64, end: f64, n: usize) -> Array1<f64> {
    let step = (end - start) / (n.saturating_sub(1).max(1)) as f64;
    Array1::from_iter((0..n).map(|i| start + step * i as f64))
}

fn regressor(config: Config) -> SymbolicRegressor {
    let ops = Arc::new(OperatorSet::standard());
    let generator = TreeGenerator::new(vec!["x".into()], ops).unwrap();
    SymbolicRegressor::new(generator, config).unwrap()
}

#[test]
fn fits_a_linear_target_and_predicts_over_the_inputs() {
    let config = Config {
        population_size: 60,
        generations: 8,
        initial_depth: 3,
        crossover_rate: 0.3,
        mutation_rate: 0.2,
        ..Config::default()
    };
    let mut model = regressor(config);

    let inputs = linspace(-3.0, 3.0, 40);
    let targets = inputs.mapv(|x| 2.0 * x + 1.0);

    let mut rng = StdRng::seed_from_u64(2024);
    model.fit(&mut rng, &inputs, &targets).unwrap();

    let best = model.best().unwrap();
    assert!(best.fitness.is_finite());
    assert!(best.fitness >= 0.0);
    assert_eq!(model.population().len(), 60);

    let equation = model.prediction_equation().unwrap();
    assert!(!equation.is_empty());

    let predictions = model.predict(&inputs).unwrap();
    assert_eq!(predictions.len(), inputs.len());
    for &p in predictions.iter() {
        assert!(p.is_finite());
    }
}

#[test]
fn zero_generations_still_scores_an_initial_population() {
    let config = Config {
        population_size: 30,
        generations: 0,
        initial_depth: 4,
        ..Config::default()
    };
    let mut model = regressor(config);

    let inputs = linspace(0.0, 5.0, 20);
    let targets = inputs.mapv(|x| x * x);

    let mut rng = StdRng::seed_from_u64(7);
    model.fit(&mut rng, &inputs, &targets).unwrap();

    assert_eq!(model.population().len(), 30);
    // Every individual carries a score; the worst-rank sentinel is the
    // only non-finite value allowed.
    for individual in model.population() {
        assert!(individual.fitness >= 0.0);
    }
    model.best().unwrap();
}

#[test]
fn seeded_runs_reproduce_the_same_best_equation() {
    let config = Config {
        population_size: 40,
        generations: 4,
        initial_depth: 3,
        ..Config::default()
    };
    let inputs = linspace(-2.0, 2.0, 25);
    let targets = inputs.mapv(|x| x * 3.0);

    let mut first = regressor(config.clone());
    let mut rng = StdRng::seed_from_u64(99);
    first.fit(&mut rng, &inputs, &targets).unwrap();

    let mut second = regressor(config);
    let mut rng = StdRng::seed_from_u64(99);
    second.fit(&mut rng, &inputs, &targets).unwrap();

    assert_eq!(
        first.prediction_equation().unwrap(),
        second.prediction_equation().unwrap()
    );
    assert_eq!(first.best().unwrap().fitness, second.best().unwrap().fitness);
}

#[test]
fn custom_registry_drives_the_search() {
    let mut ops = OperatorSet::new();
    ops.insert_binary("+", |a, b| a + b);
    ops.insert_binary("-", |a, b| a - b);
    let generator = TreeGenerator::new(vec!["x".into()], Arc::new(ops)).unwrap();
    let config = Config {
        population_size: 25,
        generations: 5,
        initial_depth: 3,
        crossover_rate: 0.4,
        mutation_rate: 0.3,
        ..Config::default()
    };
    let mut model = SymbolicRegressor::new(generator, config).unwrap();

    let inputs = linspace(-1.0, 1.0, 15);
    let targets = inputs.mapv(|x| x + 4.0);

    let mut rng = StdRng::seed_from_u64(5);
    model.fit(&mut rng, &inputs, &targets).unwrap();

    // Only the registered symbols can appear in the winning equation.
    let equation = model.prediction_equation().unwrap();
    for symbol in ["*", "/", "sqrt", "sin", "cos"] {
        assert!(!equation.contains(symbol), "unexpected `{}` in {}", symbol, equation);
    }
}
