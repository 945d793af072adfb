use std::collections::HashMap;
use std::mem;

use ndarray::Array1;
use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::expr::Tree;
use crate::generator::TreeGenerator;

/// One member of the population: a tree and its score against the
/// current sample set. Lower fitness is better.
#[derive(Debug, Clone)]
pub struct Individual {
    pub tree: Tree,
    pub fitness: f64,
}

/// Evolves a population of expression trees against sampled
/// (input, target) pairs.
///
/// Fitness is the sum of squared residuals over the samples. Each
/// generation selects parents by tournament over a shrinking candidate
/// pool, breeds offspring by subtree crossover and point mutation, and
/// truncates the grown population back to `population_size`, keeping
/// the fittest.
#[derive(Debug)]
pub struct SymbolicRegressor {
    config: Config,
    generator: TreeGenerator,
    population: Vec<Individual>,
}

impl SymbolicRegressor {
    pub fn new(generator: TreeGenerator, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(SymbolicRegressor { config, generator, population: Vec::new() })
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// The minimum-fitness individual.
    pub fn best(&self) -> Result<&Individual> {
        self.population
            .iter()
            .min_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .ok_or(Error::EmptyPopulation)
    }

    /// Initialize a random population and evolve it for the configured
    /// number of generations.
    pub fn fit(
        &mut self,
        rng: &mut impl Rng,
        inputs: &Array1<f64>,
        targets: &Array1<f64>,
    ) -> Result<()> {
        if inputs.len() != targets.len() {
            return Err(Error::SampleMismatch { inputs: inputs.len(), targets: targets.len() });
        }

        self.population = (0..self.config.population_size)
            .map(|_| {
                let tree =
                    self.generator.generate(rng, self.config.initial_depth, &self.config.growth)?;
                Ok(Individual { tree, fitness: f64::INFINITY })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::score_all(&mut self.population, self.generator.variables(), inputs, targets)?;

        for generation in 0..self.config.generations {
            self.evolve(rng, inputs, targets)?;
            let best = self.best()?;
            debug!(
                generation,
                population = self.population.len(),
                best_fitness = best.fitness,
                best_size = best.tree.root().size(),
                "generation complete"
            );
        }
        Ok(())
    }

    /// Evaluate the best individual on every input.
    pub fn predict(&self, inputs: &Array1<f64>) -> Result<Array1<f64>> {
        let best = self.best()?;
        let mut bindings = self.empty_bindings();
        let mut predictions = Vec::with_capacity(inputs.len());
        for &x in inputs.iter() {
            for value in bindings.values_mut() {
                *value = x;
            }
            predictions.push(best.tree.evaluate(&bindings)?);
        }
        Ok(Array1::from_vec(predictions))
    }

    /// Human-readable rendering of the best individual.
    pub fn prediction_equation(&self) -> Result<String> {
        Ok(self.best()?.tree.to_string())
    }

    /// One generation: shrinking-pool parent selection, crossover,
    /// mutation, then elitist truncation back to `population_size`.
    fn evolve(
        &mut self,
        rng: &mut impl Rng,
        inputs: &Array1<f64>,
        targets: &Array1<f64>,
    ) -> Result<()> {
        let mut parents = self.select_parents(rng)?;
        Self::score_all(&mut parents, self.generator.variables(), inputs, targets)?;

        let mut offspring = Vec::new();
        for i in 0..parents.len() {
            if rng.gen::<f64>() < self.config.crossover_rate {
                let mate = Self::tournament(&parents, self.config.tournament_size, rng)?;
                let (a, b) = Self::crossover(&parents[i].tree, &parents[mate].tree, rng);
                offspring.push(Individual { tree: a, fitness: f64::INFINITY });
                offspring.push(Individual { tree: b, fitness: f64::INFINITY });
            }
        }
        for i in 0..parents.len() {
            if rng.gen::<f64>() < self.config.mutation_rate {
                let mut tree = parents[i].tree.clone();
                self.generator.mutate(&mut tree, rng);
                offspring.push(Individual { tree, fitness: f64::INFINITY });
            }
        }
        Self::score_all(&mut offspring, self.generator.variables(), inputs, targets)?;

        parents.append(&mut offspring);
        parents.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
        parents.truncate(self.config.population_size);
        self.population = parents;
        Ok(())
    }

    /// Draw `population_size` parents by repeated tournaments over a
    /// pool that loses each winner, so no individual is selected twice.
    fn select_parents(&self, rng: &mut impl Rng) -> Result<Vec<Individual>> {
        let mut pool = self.population.clone();
        let mut parents = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let winner = Self::tournament(&pool, self.config.tournament_size, rng)?;
            parents.push(pool.swap_remove(winner));
        }
        Ok(parents)
    }

    /// Index of the fitness-minimum among `tournament_size` entrants
    /// sampled uniformly without replacement.
    fn tournament(
        entries: &[Individual],
        tournament_size: usize,
        rng: &mut impl Rng,
    ) -> Result<usize> {
        if entries.is_empty() {
            return Err(Error::EmptyPopulation);
        }
        let count = tournament_size.min(entries.len());
        rand::seq::index::sample(rng, entries.len(), count)
            .iter()
            .min_by(|&a, &b| entries[a].fitness.total_cmp(&entries[b].fitness))
            .ok_or(Error::EmptyPopulation)
    }

    /// Clone both parents and swap one child slot between a random
    /// operator node of each. When either tree is a single leaf there is
    /// no slot to swap and the untouched clones are returned.
    fn crossover(a: &Tree, b: &Tree, rng: &mut impl Rng) -> (Tree, Tree) {
        let mut first = a.clone();
        let mut second = b.clone();
        if let (Some(path_a), Some(path_b)) =
            (first.random_branch_path(rng), second.random_branch_path(rng))
        {
            let take_right = rng.gen_bool(0.5);
            if let (Some(slot_a), Some(slot_b)) = (
                first.node_at_mut(&path_a).branch_child_mut(take_right),
                second.node_at_mut(&path_b).branch_child_mut(take_right),
            ) {
                mem::swap(slot_a, slot_b);
            }
        }
        (first, second)
    }

    /// Score every individual in parallel: sum of squared residuals,
    /// with non-finite predictions and unbound variables demoted to
    /// infinite fitness. Unknown operators abort the run.
    fn score_all(
        individuals: &mut [Individual],
        variables: &[String],
        inputs: &Array1<f64>,
        targets: &Array1<f64>,
    ) -> Result<()> {
        individuals.par_iter_mut().try_for_each(|individual| {
            individual.fitness = Self::score_tree(&individual.tree, variables, inputs, targets)?;
            Ok(())
        })
    }

    fn score_tree(
        tree: &Tree,
        variables: &[String],
        inputs: &Array1<f64>,
        targets: &Array1<f64>,
    ) -> Result<f64> {
        let mut bindings: HashMap<String, f64> =
            variables.iter().map(|name| (name.clone(), 0.0)).collect();
        let mut total = 0.0;
        for (&x, &y) in inputs.iter().zip(targets.iter()) {
            for value in bindings.values_mut() {
                *value = x;
            }
            let prediction = match tree.evaluate(&bindings) {
                Ok(value) => value,
                Err(Error::NonFinite { .. }) | Err(Error::UnboundVariable { .. }) => {
                    return Ok(f64::INFINITY)
                }
                Err(err) => return Err(err),
            };
            let residual = prediction - y;
            total += residual * residual;
        }
        // Residuals can overflow to infinity even when every prediction
        // was finite.
        Ok(if total.is_finite() { total } else { f64::INFINITY })
    }

    fn empty_bindings(&self) -> HashMap<String, f64> {
        self.generator.variables().iter().map(|name| (name.clone(), 0.0)).collect()
    }
}
