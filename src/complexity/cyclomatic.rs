use crate::analyzers::python::ParsedSource;
use crate::errors::ClassificationResult;
use tree_sitter::Node;

/// Cyclomatic complexity of the first function in `source`
pub fn cyclomatic_complexity(source: &str) -> ClassificationResult<u32> {
    let parsed = ParsedSource::parse(source)?;
    let function = parsed.function()?;
    Ok(calculate_cyclomatic(&function))
}

/// Decision points of a function node plus one. Nested functions and
/// lambdas count towards the enclosing function.
pub fn calculate_cyclomatic(node: &Node) -> u32 {
    let mut complexity: u32 = 1;
    traverse_for_cyclomatic(node, &mut complexity);
    complexity
}

fn traverse_for_cyclomatic(node: &Node, complexity: &mut u32) {
    match node.kind() {
        "if_statement" | "elif_clause" => *complexity += 1,
        "for_statement" | "while_statement" => {
            *complexity += 1;
            if node.child_by_field_name("alternative").is_some() {
                *complexity += 1;
            }
        }
        "except_clause" | "except_group_clause" => *complexity += 1,
        "case_clause" => *complexity += 1,
        "boolean_operator" => *complexity += 1,
        "conditional_expression" => *complexity += 1,
        // Each `for` and `if` of a comprehension
        "for_in_clause" | "if_clause" => *complexity += 1,
        "assert_statement" => *complexity += 1,
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        traverse_for_cyclomatic(&child, complexity);
    }
}
