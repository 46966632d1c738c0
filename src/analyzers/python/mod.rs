//! Tree-sitter integration for Python function sources
//!
//! Function sources arrive as they were cut out of their files, so methods keep
//! their class indentation. Everything here dedents first and then parses the
//! snippet as a module.

pub mod builtins;
pub mod calls;
pub mod decorators;
pub mod scope;
pub mod type_hints;

pub use calls::{extract_function_calls, CallSite};
pub use decorators::has_class_or_static_decorator;
pub use scope::PythonScopeResolver;
pub use type_hints::{extract_type_hints, has_non_basic_type_hint};

use crate::errors::{ClassificationError, ClassificationResult};
use tree_sitter::{Node, Parser, Tree};

/// A dedented Python snippet together with its syntax tree
pub struct ParsedSource {
    source: String,
    tree: Tree,
}

impl ParsedSource {
    /// Parse a snippet, rejecting sources with syntax errors
    pub fn parse(content: &str) -> ClassificationResult<Self> {
        let source = dedent(content);
        let tree = parse_tree(&source)?;
        if tree.root_node().has_error() {
            return Err(ClassificationError::parse("Python source contains syntax errors"));
        }
        Ok(Self { source, tree })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The first function definition in the snippet
    pub fn function(&self) -> ClassificationResult<Node<'_>> {
        find_function_definition(self.root()).ok_or(ClassificationError::NoFunctionDefinition)
    }

    pub fn text(&self, node: &Node) -> &str {
        node_text(node, &self.source)
    }
}

fn parse_tree(source: &str) -> ClassificationResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ClassificationError::parse(format!("Failed to set Python language: {}", e)))?;
    parser
        .parse(source, None)
        .ok_or_else(|| ClassificationError::parse("Failed to parse Python source"))
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Named children, skipping comments
pub fn code_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Unwrap a `decorated_definition` to the definition it decorates
pub fn undecorate<'t>(node: Node<'t>) -> Node<'t> {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

/// Pre-order search for the first `function_definition`
pub fn find_function_definition(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "function_definition" {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(find_function_definition)
}

/// Top-level function definitions of a module, decorators unwrapped
pub fn top_level_functions(root: Node<'_>) -> Vec<Node<'_>> {
    code_children(&root)
        .into_iter()
        .map(undecorate)
        .filter(|node| node.kind() == "function_definition")
        .collect()
}

/// Name of the function defined by `source`, e.g. `helper` for
/// `def helper(x):`
pub fn function_name(source: &str) -> Option<String> {
    let parsed = ParsedSource::parse(source).ok()?;
    let function = parsed.function().ok()?;
    let name = function.child_by_field_name("name")?;
    Some(parsed.text(&name).to_string())
}

/// Remove the common leading whitespace from every non-blank line.
///
/// Whitespace-only lines are emptied and do not take part in computing the
/// margin.
pub fn dedent(source: &str) -> String {
    let margin = source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(leading_whitespace)
        .reduce(common_prefix)
        .unwrap_or("");

    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        if !line.trim().is_empty() {
            out.push_str(&line[margin.len()..]);
        }
        out.push('\n');
    }
    out
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, ca), cb)| ca == cb)
        .last()
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(0);
    &a[..len]
}
