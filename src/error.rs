//! Error types for tree evaluation and the evolutionary loop.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A node references an operator symbol missing from its registry.
    /// Indicates structural corruption; evaluation cannot continue.
    #[error("no {arity} operator `{symbol}` in the registry")]
    UnknownOperator { symbol: String, arity: &'static str },

    /// A registered operator produced a non-finite value (division by
    /// zero, domain error in a transcendental, overflow).
    #[error("operator `{symbol}` produced a non-finite value")]
    NonFinite { symbol: String },

    /// Evaluation reached a variable with no entry in the bindings map.
    #[error("variable `{name}` has no binding")]
    UnboundVariable { name: String },

    /// Selection or a best-individual query ran against an empty
    /// population.
    #[error("selection requested from an empty population")]
    EmptyPopulation,

    /// The generator was built over a registry that cannot supply the
    /// operators it needs.
    #[error("the {arity} operator registry is empty")]
    EmptyRegistry { arity: &'static str },

    #[error("inputs ({inputs}) and targets ({targets}) differ in length")]
    SampleMismatch { inputs: usize, targets: usize },

    #[error("invalid value for `{field}`: {message}")]
    InvalidConfig { field: &'static str, message: String },

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = Error::UnknownOperator { symbol: "%".into(), arity: "binary" };
        assert!(err.to_string().contains('%'));
        assert!(err.to_string().contains("binary"));

        let err = Error::UnboundVariable { name: "t".into() };
        assert!(err.to_string().contains('t'));

        let err = Error::SampleMismatch { inputs: 10, targets: 8 };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains('8'));
    }

    #[test]
    fn config_errors_name_the_field() {
        let err = Error::InvalidConfig {
            field: "crossover_rate",
            message: "must lie in [0, 1]".into(),
        };
        assert!(err.to_string().contains("crossover_rate"));
    }
}
