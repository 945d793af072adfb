use std::sync::Arc;

use rand::Rng;

use crate::config::GrowthParams;
use crate::error::{Error, Result};
use crate::expr::{Node, Tree};
use crate::ops::OperatorSet;

/// Constants are drawn uniformly from [0, CONSTANT_RANGE).
const CONSTANT_RANGE: f64 = 10.0;

/// Factory for random expression trees over a fixed variable set and a
/// shared operator registry.
#[derive(Debug, Clone)]
pub struct TreeGenerator {
    variables: Vec<String>,
    ops: Arc<OperatorSet>,
}

impl TreeGenerator {
    /// The variable set must be non-empty and the registry must offer at
    /// least one binary operator, since the growth policy can demand a
    /// binary node at any depth.
    pub fn new(variables: Vec<String>, ops: Arc<OperatorSet>) -> Result<Self> {
        if variables.is_empty() {
            return Err(Error::InvalidConfig {
                field: "variables",
                message: "at least one variable name is required".into(),
            });
        }
        if ops.binary_len() == 0 {
            return Err(Error::EmptyRegistry { arity: "binary" });
        }
        Ok(TreeGenerator { variables, ops })
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn ops(&self) -> &Arc<OperatorSet> {
        &self.ops
    }

    /// Grow a random tree of height at most `depth`.
    ///
    /// At each step: produce a leaf if the depth budget is exhausted, or
    /// early with probability `leaf_probability` once below the root
    /// budget; otherwise produce a unary node with probability
    /// `unary_probability` (when the registry has unary operators) and a
    /// binary node the rest of the time. Each child is grown
    /// independently with a budget one smaller. Leaves are variables
    /// with probability `variable_probability`, constants otherwise.
    pub fn generate(&self, rng: &mut impl Rng, depth: usize, growth: &GrowthParams) -> Result<Tree> {
        let root = self.grow(rng, depth, growth)?;
        Ok(Tree::new(root, Arc::clone(&self.ops)))
    }

    fn grow(&self, rng: &mut impl Rng, depth: usize, growth: &GrowthParams) -> Result<Node> {
        if depth == 0 || (depth > 1 && rng.gen::<f64>() < growth.leaf_probability) {
            return Ok(self.leaf(rng, growth));
        }

        if self.ops.unary_len() > 0 && rng.gen::<f64>() < growth.unary_probability {
            let op = self
                .ops
                .random_unary(rng)
                .ok_or(Error::EmptyRegistry { arity: "unary" })?
                .to_owned();
            let child = Box::new(self.grow(rng, depth - 1, growth)?);
            Ok(Node::Unary { op, child })
        } else {
            let op = self
                .ops
                .random_binary(rng)
                .ok_or(Error::EmptyRegistry { arity: "binary" })?
                .to_owned();
            let left = Box::new(self.grow(rng, depth - 1, growth)?);
            let right = Box::new(self.grow(rng, depth - 1, growth)?);
            Ok(Node::Binary { op, left, right })
        }
    }

    fn leaf(&self, rng: &mut impl Rng, growth: &GrowthParams) -> Node {
        if rng.gen::<f64>() < growth.variable_probability {
            let idx = rng.gen_range(0..self.variables.len());
            Node::Variable(self.variables[idx].clone())
        } else {
            Node::Constant(rng.gen_range(0.0..CONSTANT_RANGE))
        }
    }

    /// Point-mutate one randomly chosen node of the tree in place.
    ///
    /// Operator nodes get a freshly drawn symbol of the same arity, so
    /// the tree's shape is preserved. Leaves are resampled: a constant
    /// gets a new uniform draw, a variable a new uniform name.
    pub(crate) fn mutate(&self, tree: &mut Tree, rng: &mut impl Rng) {
        enum Patch {
            Leaf(Node),
            Op(String),
            Keep,
        }

        let path = tree.sample_path(rng);
        let patch = match tree.node_at(&path) {
            Node::Constant(_) => Patch::Leaf(Node::Constant(rng.gen_range(0.0..CONSTANT_RANGE))),
            Node::Variable(_) => {
                let idx = rng.gen_range(0..self.variables.len());
                Patch::Leaf(Node::Variable(self.variables[idx].clone()))
            }
            node => match tree.random_op_for(node, rng) {
                Some(symbol) => Patch::Op(symbol),
                None => Patch::Keep,
            },
        };

        match (patch, tree.node_at_mut(&path)) {
            (Patch::Leaf(leaf), slot) => *slot = leaf,
            (Patch::Op(symbol), Node::Unary { op, .. })
            | (Patch::Op(symbol), Node::Binary { op, .. }) => *op = symbol,
            _ => {}
        }
    }
}
