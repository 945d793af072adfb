use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Probabilities steering random tree growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthParams {
    /// Chance of cutting growth short with a leaf once below the root
    /// depth budget.
    pub leaf_probability: f64,
    /// Chance of a unary node over a binary one at each operator step.
    pub unary_probability: f64,
    /// Chance of a leaf being a variable rather than a constant.
    pub variable_probability: f64,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            leaf_probability: 0.3,
            unary_probability: 0.3,
            variable_probability: 0.5,
        }
    }
}

/// Hyperparameters for a regression run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of individuals kept across generations.
    pub population_size: usize,
    /// Number of evolution steps run by `fit`.
    pub generations: usize,
    /// Depth budget for the randomly grown initial population.
    pub initial_depth: usize,
    /// Per-parent chance of producing a crossover offspring pair.
    pub crossover_rate: f64,
    /// Per-parent chance of producing a point-mutated offspring.
    pub mutation_rate: f64,
    /// Entrants per selection tournament.
    pub tournament_size: usize,
    #[serde(default)]
    pub growth: GrowthParams,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::InvalidConfig {
                field: "population_size",
                message: "must be greater than zero".into(),
            });
        }
        if self.tournament_size == 0 {
            return Err(Error::InvalidConfig {
                field: "tournament_size",
                message: "must be greater than zero".into(),
            });
        }
        Self::check_rate("crossover_rate", self.crossover_rate)?;
        Self::check_rate("mutation_rate", self.mutation_rate)?;
        Self::check_rate("growth.leaf_probability", self.growth.leaf_probability)?;
        Self::check_rate("growth.unary_probability", self.growth.unary_probability)?;
        Self::check_rate("growth.variable_probability", self.growth.variable_probability)?;
        Ok(())
    }

    fn check_rate(field: &'static str, value: f64) -> Result<()> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(Error::InvalidConfig {
                field,
                message: format!("{} is not in [0, 1]", value),
            })
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 20,
            initial_depth: 5,
            crossover_rate: 0.1,
            mutation_rate: 0.1,
            tournament_size: 5,
            growth: GrowthParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn zero_population_is_rejected() {
        let config = Config { population_size: 0, ..Config::default() };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "population_size", .. }));
    }

    #[test]
    fn out_of_range_rate_is_rejected_by_name() {
        let config = Config { crossover_rate: 1.5, ..Config::default() };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "crossover_rate", .. }));

        let config = Config {
            growth: GrowthParams { leaf_probability: -0.1, ..GrowthParams::default() },
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "growth.leaf_probability", .. }));
    }

    #[test]
    fn parses_toml_with_partial_growth_section() {
        let config: Config = toml::from_str(
            r#"
            population_size = 50
            generations = 10
            initial_depth = 4
            crossover_rate = 0.2
            mutation_rate = 0.05
            tournament_size = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.growth, GrowthParams::default());

        let config: Config = toml::from_str(
            r#"
            population_size = 50
            generations = 10
            initial_depth = 4
            crossover_rate = 0.2
            mutation_rate = 0.05
            tournament_size = 3

            [growth]
            leaf_probability = 0.5
            unary_probability = 0.1
            variable_probability = 0.9
            "#,
        )
        .unwrap();
        assert_eq!(config.growth.leaf_probability, 0.5);
        config.validate().unwrap();
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
