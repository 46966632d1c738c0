//! Call-site extraction.
//!
//! Only calls whose callee is a bare identifier are reported; `obj.f(x)` and
//! `f(x)(y)`'s outer call never name a pool function directly.

use super::{code_children, node_text, ParsedSource};
use crate::errors::ClassificationResult;
use tree_sitter::Node;

/// A direct call `name(arg, ...)` inside a function body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub name: String,
    /// Positional, keyword and splat arguments all count
    pub arg_count: usize,
}

/// Calls in source order whose callee name satisfies `wanted`
pub fn extract_function_calls<F>(source: &str, wanted: F) -> ClassificationResult<Vec<CallSite>>
where
    F: Fn(&str) -> bool,
{
    let parsed = ParsedSource::parse(source)?;
    let function = parsed.function()?;
    let mut calls = Vec::new();
    collect_calls(function, parsed.source(), &wanted, &mut calls);
    Ok(calls)
}

fn collect_calls<F>(node: Node, source: &str, wanted: &F, calls: &mut Vec<CallSite>)
where
    F: Fn(&str) -> bool,
{
    if node.kind() == "call" {
        if let Some(site) = call_site(&node, source) {
            if wanted(&site.name) {
                calls.push(site);
            }
        }
    }
    for child in code_children(&node) {
        collect_calls(child, source, wanted, calls);
    }
}

fn call_site(call: &Node, source: &str) -> Option<CallSite> {
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != "identifier" {
        return None;
    }
    let arguments = call.child_by_field_name("arguments")?;
    let arg_count = match arguments.kind() {
        "argument_list" => code_children(&arguments).len(),
        // `f(x for x in xs)`
        "generator_expression" => 1,
        _ => 0,
    };
    Some(CallSite {
        name: node_text(&callee, source).to_string(),
        arg_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn site(name: &str, arg_count: usize) -> CallSite {
        CallSite {
            name: name.to_string(),
            arg_count,
        }
    }

    #[test]
    fn test_counts_all_argument_forms() {
        let source = indoc! {"
            def caller(xs, opts):
                a = helper(1, 2)
                b = helper(*xs, key=3, **opts)
                c = helper()
                return a, b, c
        "};
        let calls = extract_function_calls(source, |_| true).unwrap();
        assert_eq!(calls, vec![site("helper", 2), site("helper", 3), site("helper", 0)]);
    }

    #[test]
    fn test_skips_attribute_calls_and_filters_names() {
        let source = indoc! {"
            def caller(x):
                y = obj.helper(x)
                z = other(helper(x, # trailing comment
                                 y))
                return sum(v for v in z)
        "};
        let calls = extract_function_calls(source, |name| name != "sum").unwrap();
        assert_eq!(calls, vec![site("other", 1), site("helper", 2)]);

        let all = extract_function_calls(source, |_| true).unwrap();
        assert_eq!(all.last(), Some(&site("sum", 1)));
    }

    #[test]
    fn test_unparseable_source() {
        assert!(extract_function_calls("def broken(:", |_| true).is_err());
    }
}
