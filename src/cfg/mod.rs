//! Control flow graphs for single Python functions.
//!
//! A function body is split into basic blocks of statements connected by
//! control-flow edges. Compound statements (`if`, loops, `try`, `with`,
//! `match`) are lowered into branches and joins; `return` and `raise` end
//! their block with no successor. Nested function and class definitions are
//! opaque single statements.
//!
//! The graph only exists to find the blocks where execution can leave the
//! function, see [`returns::returns_nonconstant`].

mod builder;
pub mod returns;

pub use builder::CfgBuilder;
pub use returns::{is_constant_expression, returns_nonconstant};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tree_sitter::Node;

/// A straight-line run of statements
#[derive(Debug, Clone, Default)]
pub struct BasicBlock<'t> {
    pub statements: Vec<Node<'t>>,
}

impl<'t> BasicBlock<'t> {
    /// First `return` statement in the block
    pub fn return_statement(&self) -> Option<Node<'t>> {
        self.statements
            .iter()
            .find(|stmt| stmt.kind() == "return_statement")
            .copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Sequential,
    Branch { condition: bool },
    LoopBack,
    Exception,
}

#[derive(Debug)]
pub struct ControlFlowGraph<'t> {
    pub graph: DiGraph<BasicBlock<'t>, Edge>,
    pub entry: NodeIndex,
}

impl<'t> ControlFlowGraph<'t> {
    /// Build the CFG of a `function_definition` node
    pub fn from_function(function: Node<'t>) -> Self {
        CfgBuilder::new().build(function)
    }

    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn block(&self, index: NodeIndex) -> &BasicBlock<'t> {
        &self.graph[index]
    }

    pub fn successors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(index, Direction::Outgoing)
            .collect()
    }

    /// Blocks with no successor: the places execution leaves the function
    pub fn terminal_blocks(&self) -> Vec<NodeIndex> {
        self.graph.externals(Direction::Outgoing).collect()
    }
}
