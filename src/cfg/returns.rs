//! Return-value filtering.
//!
//! A benchmark function has to compute something: at least one of the ways
//! it can finish must return a value that is not a literal.

use super::ControlFlowGraph;
use crate::analyzers::python::{code_children, node_text, ParsedSource};
use crate::errors::ClassificationResult;
use tree_sitter::Node;

/// Whether some terminal block of the function's CFG returns a non-constant
/// expression. Functions that never return explicitly fail.
pub fn returns_nonconstant(source: &str) -> ClassificationResult<bool> {
    let parsed = ParsedSource::parse(source)?;
    let function = parsed.function()?;
    let cfg = ControlFlowGraph::from_function(function);

    let passes = cfg
        .terminal_blocks()
        .into_iter()
        .filter_map(|index| cfg.block(index).return_statement())
        .any(|stmt| {
            return_value(&stmt)
                .is_some_and(|value| !is_constant_expression(&value, parsed.source()))
        });
    Ok(passes)
}

fn return_value<'t>(stmt: &Node<'t>) -> Option<Node<'t>> {
    code_children(stmt).into_iter().next()
}

/// Literals and containers built only from literals.
///
/// A sign applied to a numeric literal is constant. Strings with
/// interpolations and dictionaries with `**` splats are not.
pub fn is_constant_expression(node: &Node, source: &str) -> bool {
    match node.kind() {
        "integer" | "float" | "true" | "false" | "none" | "ellipsis" => true,
        "string" => !code_children(node)
            .iter()
            .any(|child| child.kind() == "interpolation"),
        "concatenated_string" | "parenthesized_expression" | "list" | "tuple" | "set"
        | "expression_list" => code_children(node)
            .iter()
            .all(|child| is_constant_expression(child, source)),
        "dictionary" => code_children(node).iter().all(|child| {
            child.kind() == "pair"
                && child
                    .child_by_field_name("key")
                    .is_some_and(|key| is_constant_expression(&key, source))
                && child
                    .child_by_field_name("value")
                    .is_some_and(|value| is_constant_expression(&value, source))
        }),
        "unary_operator" => {
            let is_sign = node
                .child_by_field_name("operator")
                .is_some_and(|op| matches!(node_text(&op, source), "-" | "+"));
            let is_number = node
                .child_by_field_name("argument")
                .is_some_and(|arg| matches!(arg.kind(), "integer" | "float"));
            is_sign && is_number
        }
        _ => false,
    }
}
