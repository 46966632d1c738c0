use super::{code_children, ParsedSource};
use tree_sitter::Node;

const EXCLUDED_DECORATORS: [&str; 2] = ["classmethod", "staticmethod"];

/// Whether any function in `source` carries a bare `@classmethod` or
/// `@staticmethod` decorator. Sources that fail to parse are treated as
/// decorated so they are excluded too.
pub fn has_class_or_static_decorator(source: &str) -> bool {
    match ParsedSource::parse(source) {
        Ok(parsed) => contains_excluded_decorator(parsed.root(), &parsed),
        Err(e) => {
            log::debug!("Treating unparseable source as decorated: {}", e);
            true
        }
    }
}

fn contains_excluded_decorator(node: Node, parsed: &ParsedSource) -> bool {
    if node.kind() == "decorator" {
        let is_excluded = code_children(&node).first().is_some_and(|expr| {
            expr.kind() == "identifier" && EXCLUDED_DECORATORS.contains(&parsed.text(expr))
        });
        if is_excluded {
            return true;
        }
    }
    code_children(&node)
        .into_iter()
        .any(|child| contains_excluded_decorator(child, parsed))
}
