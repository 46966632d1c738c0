//! Type-hint filtering.
//!
//! Functions whose annotations mention anything beyond plain builtins and the
//! common `typing` containers need project types to be constructed, so they
//! are not benchmark material.

use super::{code_children, ParsedSource};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashSet};
use tree_sitter::Node;

static BASIC_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "int", "str", "bool", "float", "None", "Any",
        "List", "Tuple", "Optional", "Dict", "Iterable",
        "list", "tuple", "optional", "dict", "iterable",
        "typing.List", "typing.Tuple", "typing.Optional", "typing.Dict", "typing.Union",
        "typing.Iterable", "typing.Any",
    ]
    .into_iter()
    .collect()
});

const GENERIC_CONTAINERS: [&str; 5] = ["List", "Tuple", "Optional", "Dict", "Iterable"];

/// Annotation texts of the first function in `source`: positional and
/// keyword parameters, the return type and annotated assignments anywhere in
/// the body. `*args`/`**kwargs` annotations are not collected.
///
/// Unparseable source yields no hints.
pub fn extract_type_hints(source: &str) -> Vec<String> {
    let Ok(parsed) = ParsedSource::parse(source) else {
        return Vec::new();
    };
    let Ok(function) = parsed.function() else {
        return Vec::new();
    };

    let mut hints = BTreeSet::new();
    if let Some(parameters) = function.child_by_field_name("parameters") {
        for parameter in code_children(&parameters) {
            if !matches!(parameter.kind(), "typed_parameter" | "typed_default_parameter") {
                continue;
            }
            let is_splat = code_children(&parameter).first().is_some_and(|first| {
                matches!(
                    first.kind(),
                    "list_splat_pattern" | "dictionary_splat_pattern"
                )
            });
            if is_splat {
                continue;
            }
            if let Some(annotation) = parameter.child_by_field_name("type") {
                hints.insert(parsed.text(&annotation).trim().to_string());
            }
        }
    }
    if let Some(return_type) = function.child_by_field_name("return_type") {
        hints.insert(parsed.text(&return_type).trim().to_string());
    }
    collect_annotated_assignments(function, &parsed, &mut hints);

    hints.into_iter().filter(|hint| !hint.is_empty()).collect()
}

fn collect_annotated_assignments(node: Node, parsed: &ParsedSource, hints: &mut BTreeSet<String>) {
    if node.kind() == "assignment" {
        if let Some(annotation) = node.child_by_field_name("type") {
            hints.insert(parsed.text(&annotation).trim().to_string());
        }
    }
    for child in code_children(&node) {
        collect_annotated_assignments(child, parsed, hints);
    }
}

/// Whether any hint in `source` is a non-basic type
pub fn has_non_basic_type_hint(source: &str) -> bool {
    extract_type_hints(source)
        .iter()
        .any(|hint| is_non_basic_type(hint))
}

/// Classify one annotation text.
///
/// Generic hints (`Head[A, B]`) are non-basic when the head is, otherwise
/// each top-level argument is checked recursively. Plain hints are judged by
/// their first dotted segment; a leading underscore (type variables) is
/// always non-basic.
pub fn is_non_basic_type(hint: &str) -> bool {
    let hint = hint.trim();
    if hint.is_empty() {
        return false;
    }

    if let (Some(open), Some(close)) = (hint.find('['), hint.rfind(']')) {
        if open < close {
            let head = hint[..open].trim();
            if !BASIC_TYPES.contains(head) && !GENERIC_CONTAINERS.contains(&head) {
                return true;
            }
            return split_top_level(&hint[open + 1..close])
                .into_iter()
                .any(is_non_basic_type);
        }
    }

    let base = hint.split('.').next().unwrap_or(hint).trim();
    base.starts_with('_') || !BASIC_TYPES.contains(base)
}

/// Split on commas that are not nested inside brackets
fn split_top_level(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(inner[start..].trim());
    parts
}
