//! Operator registries mapping symbols to numeric functions.

use std::collections::BTreeMap;

use rand::Rng;

pub type UnaryFn = fn(f64) -> f64;
pub type BinaryFn = fn(f64, f64) -> f64;

/// The unary and binary operator tables shared by every tree in a
/// population. Built once, wrapped in an `Arc`, and never mutated
/// afterwards. Keys are ordered so that uniform random choice over the
/// registry is stable for a given random sequence.
#[derive(Debug, Clone, Default)]
pub struct OperatorSet {
    unary: BTreeMap<String, UnaryFn>,
    binary: BTreeMap<String, BinaryFn>,
}

impl OperatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The arithmetic table used by the examples: `+ - * /` plus
    /// `sqrt`, `sin` and `cos`.
    pub fn standard() -> Self {
        let mut set = Self::new();
        set.insert_binary("+", |a, b| a + b);
        set.insert_binary("-", |a, b| a - b);
        set.insert_binary("*", |a, b| a * b);
        set.insert_binary("/", |a, b| a / b);
        set.insert_unary("sqrt", f64::sqrt);
        set.insert_unary("sin", f64::sin);
        set.insert_unary("cos", f64::cos);
        set
    }

    pub fn insert_unary(&mut self, symbol: impl Into<String>, f: UnaryFn) {
        self.unary.insert(symbol.into(), f);
    }

    pub fn insert_binary(&mut self, symbol: impl Into<String>, f: BinaryFn) {
        self.binary.insert(symbol.into(), f);
    }

    pub fn unary(&self, symbol: &str) -> Option<UnaryFn> {
        self.unary.get(symbol).copied()
    }

    pub fn binary(&self, symbol: &str) -> Option<BinaryFn> {
        self.binary.get(symbol).copied()
    }

    pub fn unary_len(&self) -> usize {
        self.unary.len()
    }

    pub fn binary_len(&self) -> usize {
        self.binary.len()
    }

    /// Uniform choice over the unary symbols, `None` if the registry is
    /// empty.
    pub fn random_unary(&self, rng: &mut impl Rng) -> Option<&str> {
        if self.unary.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.unary.len());
        self.unary.keys().nth(idx).map(String::as_str)
    }

    /// Uniform choice over the binary symbols, `None` if the registry is
    /// empty.
    pub fn random_binary(&self, rng: &mut impl Rng) -> Option<&str> {
        if self.binary.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.binary.len());
        self.binary.keys().nth(idx).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn standard_table_evaluates() {
        let ops = OperatorSet::standard();
        assert_eq!(ops.binary("+").map(|f| f(3.0, 4.0)), Some(7.0));
        assert_eq!(ops.binary("/").map(|f| f(8.0, 4.0)), Some(2.0));
        assert_eq!(ops.unary("sqrt").map(|f| f(9.0)), Some(3.0));
        assert!(ops.unary("tan").is_none());
        assert!(ops.binary("%").is_none());
    }

    #[test]
    fn random_choice_stays_in_registry() {
        let ops = OperatorSet::standard();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let sym = ops.random_binary(&mut rng).unwrap();
            assert!(ops.binary(sym).is_some());
            let sym = ops.random_unary(&mut rng).unwrap();
            assert!(ops.unary(sym).is_some());
        }
    }

    #[test]
    fn random_choice_covers_every_symbol() {
        let ops = OperatorSet::standard();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            seen.insert(ops.random_binary(&mut rng).unwrap().to_owned());
        }
        assert_eq!(seen.len(), ops.binary_len());
    }

    #[test]
    fn empty_registry_yields_none() {
        let ops = OperatorSet::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(ops.random_unary(&mut rng).is_none());
        assert!(ops.random_binary(&mut rng).is_none());
    }
}
