use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::error::{Error, Result};
use crate::ops::OperatorSet;

/// A single vertex of an expression tree. The variant fixes the arity:
/// leaves own no children, unary nodes exactly one, binary nodes exactly
/// two. Children are exclusively owned, so trees are strict hierarchies
/// with no sharing.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Constant(f64),
    Variable(String),
    Unary { op: String, child: Box<Node> },
    Binary { op: String, left: Box<Node>, right: Box<Node> },
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Constant(_) | Node::Variable(_))
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        match self {
            Node::Constant(_) | Node::Variable(_) => 1,
            Node::Unary { child, .. } => 1 + child.size(),
            Node::Binary { left, right, .. } => 1 + left.size() + right.size(),
        }
    }

    /// Height of this subtree; a lone leaf has height 0.
    pub fn depth(&self) -> usize {
        match self {
            Node::Constant(_) | Node::Variable(_) => 0,
            Node::Unary { child, .. } => 1 + child.depth(),
            Node::Binary { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// The child slot a crossover swap acts on. A unary node exposes its
    /// only child for either side so a swap against it is never a no-op.
    pub(crate) fn branch_child_mut(&mut self, take_right: bool) -> Option<&mut Box<Node>> {
        match self {
            Node::Unary { child, .. } => Some(child),
            Node::Binary { left, right, .. } => Some(if take_right { right } else { left }),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Constant(val) => write!(f, "{}", val),
            Node::Variable(name) => write!(f, "{}", name),
            Node::Unary { op, child } => write!(f, "{}({})", op, child),
            Node::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

/// An expression tree: a root [`Node`] plus a shared handle to the
/// operator registries needed to evaluate it. Cloning is a deep
/// structural copy of the nodes; the registries stay shared.
#[derive(Debug, Clone)]
pub struct Tree {
    root: Node,
    ops: Arc<OperatorSet>,
}

impl Tree {
    pub fn new(root: Node, ops: Arc<OperatorSet>) -> Self {
        Tree { root, ops }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn ops(&self) -> &Arc<OperatorSet> {
        &self.ops
    }

    /// Recursively evaluate the tree under the given variable bindings.
    ///
    /// Constants evaluate to themselves, variables to their bound value.
    /// Operator nodes look their symbol up in the registry and apply the
    /// registered function to their children's values, left then right.
    /// A missing registry entry or an unbound variable is a structural
    /// failure; a registered function returning a non-finite value is
    /// reported as [`Error::NonFinite`] rather than propagated as a
    /// bare float.
    pub fn evaluate(&self, bindings: &HashMap<String, f64>) -> Result<f64> {
        Self::eval_node(&self.root, &self.ops, bindings)
    }

    fn eval_node(node: &Node, ops: &OperatorSet, bindings: &HashMap<String, f64>) -> Result<f64> {
        match node {
            Node::Constant(val) => Ok(*val),
            Node::Variable(name) => bindings
                .get(name)
                .copied()
                .ok_or_else(|| Error::UnboundVariable { name: name.clone() }),
            Node::Unary { op, child } => {
                let f = ops.unary(op).ok_or_else(|| Error::UnknownOperator {
                    symbol: op.clone(),
                    arity: "unary",
                })?;
                let value = f(Self::eval_node(child, ops, bindings)?);
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(Error::NonFinite { symbol: op.clone() })
                }
            }
            Node::Binary { op, left, right } => {
                let f = ops.binary(op).ok_or_else(|| Error::UnknownOperator {
                    symbol: op.clone(),
                    arity: "binary",
                })?;
                let lhs = Self::eval_node(left, ops, bindings)?;
                let rhs = Self::eval_node(right, ops, bindings)?;
                let value = f(lhs, rhs);
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(Error::NonFinite { symbol: op.clone() })
                }
            }
        }
    }

    /// Biased random walk from the root. A leaf ends the walk; a unary
    /// node stops here with probability 1/2, otherwise descends; a binary
    /// node stops, goes left, or goes right with probability 1/3 each.
    /// Nodes near the root are therefore favored.
    pub fn random_node_mut(&mut self, rng: &mut impl Rng) -> &mut Node {
        let path = self.sample_path(rng);
        self.node_at_mut(&path)
    }

    /// Uniform choice of a replacement symbol matching the node's arity.
    /// Leaves have no operator to replace.
    pub fn random_op_for(&self, node: &Node, rng: &mut impl Rng) -> Option<String> {
        match node {
            Node::Unary { .. } => self.ops.random_unary(rng).map(str::to_owned),
            Node::Binary { .. } => self.ops.random_binary(rng).map(str::to_owned),
            _ => None,
        }
    }

    /// Walk the biased-descent distribution and record the steps taken,
    /// 0 for left/only child and 1 for right.
    pub(crate) fn sample_path(&self, rng: &mut impl Rng) -> Vec<usize> {
        let mut path = Vec::new();
        let mut node = &self.root;
        loop {
            match node {
                Node::Constant(_) | Node::Variable(_) => return path,
                Node::Unary { child, .. } => {
                    if rng.gen_bool(0.5) {
                        return path;
                    }
                    path.push(0);
                    node = &**child;
                }
                Node::Binary { left, right, .. } => match rng.gen_range(0..3) {
                    0 => return path,
                    1 => {
                        path.push(0);
                        node = &**left;
                    }
                    _ => {
                        path.push(1);
                        node = &**right;
                    }
                },
            }
        }
    }

    /// Re-roll the walk until it lands on an operator node. `None` when
    /// the whole tree is a single leaf.
    pub(crate) fn random_branch_path(&self, rng: &mut impl Rng) -> Option<Vec<usize>> {
        if self.root.is_leaf() {
            return None;
        }
        loop {
            let path = self.sample_path(rng);
            if !self.node_at(&path).is_leaf() {
                return Some(path);
            }
        }
    }

    pub(crate) fn node_at(&self, path: &[usize]) -> &Node {
        let mut node = &self.root;
        for &step in path {
            node = match node {
                Node::Unary { child, .. } => &**child,
                Node::Binary { left, right, .. } => {
                    if step == 0 {
                        &**left
                    } else {
                        &**right
                    }
                }
                other => other,
            };
        }
        node
    }

    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> &mut Node {
        let mut node = &mut self.root;
        for &step in path {
            node = match node {
                Node::Unary { child, .. } => &mut **child,
                Node::Binary { left, right, .. } => {
                    if step == 0 {
                        &mut **left
                    } else {
                        &mut **right
                    }
                }
                other => other,
            };
        }
        node
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
