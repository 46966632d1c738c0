//! Unresolved-reference analysis for a single Python function.
//!
//! The function is treated as a closed unit: a name it reads is resolved only
//! if it is bound inside the function (parameters, locals, nested definitions,
//! imports in the body) or is a builtin. Module-level names of the file the
//! function came from are deliberately unresolved.
//!
//! Scoping follows Python's static rules. A name bound anywhere in a scope is
//! local to the whole scope, nested functions/lambdas/comprehensions/classes
//! get their own scope whose free names are looked up in the enclosing one,
//! and class-body names are invisible to the methods of that class.

use super::builtins::is_builtin;
use super::{code_children, node_text, ParsedSource};
use crate::analyzers::ScopeResolver;
use crate::errors::ClassificationResult;
use std::collections::{BTreeSet, HashSet};
use tree_sitter::Node;

/// Tree-sitter backed [`ScopeResolver`] for Python
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonScopeResolver;

impl PythonScopeResolver {
    pub fn new() -> Self {
        Self
    }
}

impl ScopeResolver for PythonScopeResolver {
    fn unresolved_refs(&self, source: &str) -> ClassificationResult<BTreeSet<String>> {
        let parsed = ParsedSource::parse(source)?;
        let function = parsed.function()?;
        Ok(unresolved_in_function(parsed.source(), function))
    }
}

/// Free names of `function`, including the ones its decorators, defaults and
/// annotations need, minus builtins
pub fn unresolved_in_function(source: &str, function: Node) -> BTreeSet<String> {
    let mut outer = ScopeCollector::new(source);
    if let Some(parent) = function.parent() {
        if parent.kind() == "decorated_definition" {
            for decorator in code_children(&parent)
                .into_iter()
                .filter(|child| child.kind() == "decorator")
            {
                outer.visit(decorator);
            }
        }
    }
    outer.visit_signature(function);

    outer
        .into_free()
        .into_iter()
        .chain(function_scope_free(function, source))
        .filter(|name| !is_builtin(name))
        .collect()
}

fn function_scope_free(function: Node, source: &str) -> HashSet<String> {
    let mut scope = ScopeCollector::new(source);
    if let Some(parameters) = function.child_by_field_name("parameters") {
        scope.bind_parameters(parameters);
    }
    if let Some(body) = function.child_by_field_name("body") {
        scope.visit(body);
    }
    scope.into_free()
}

fn class_scope_free(class: Node, source: &str) -> HashSet<String> {
    let mut scope = ScopeCollector::new(source);
    if let Some(body) = class.child_by_field_name("body") {
        scope.visit(body);
    }
    // Methods skip the class scope when resolving, so their free names pass
    // through unfiltered.
    let nested = std::mem::take(&mut scope.nested_free);
    let mut free = scope.into_free();
    free.extend(nested);
    free
}

fn comprehension_free(comprehension: Node, source: &str) -> HashSet<String> {
    let mut scope = ScopeCollector::new(source);
    for child in code_children(&comprehension) {
        if child.kind() == "for_in_clause" {
            let left = child.child_by_field_name("left");
            if let Some(left) = left {
                scope.bind_target(left);
            }
            for part in code_children(&child) {
                if Some(part.id()) != left.map(|l| l.id()) {
                    scope.visit(part);
                }
            }
        } else {
            scope.visit(child);
        }
    }
    scope.into_free()
}

struct ScopeCollector<'s> {
    source: &'s str,
    bound: HashSet<String>,
    reads: HashSet<String>,
    declared_global: HashSet<String>,
    nested_free: HashSet<String>,
}

impl<'s> ScopeCollector<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            bound: HashSet::new(),
            reads: HashSet::new(),
            declared_global: HashSet::new(),
            nested_free: HashSet::new(),
        }
    }

    fn into_free(self) -> HashSet<String> {
        let local: HashSet<&String> = self.bound.difference(&self.declared_global).collect();
        self.reads
            .iter()
            .chain(self.nested_free.iter())
            .filter(|name| !local.contains(name))
            .cloned()
            .collect()
    }

    fn text(&self, node: &Node) -> String {
        node_text(node, self.source).to_string()
    }

    fn bind(&mut self, node: &Node) {
        let name = self.text(node);
        self.bound.insert(name);
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "comment" => {}
            "identifier" => {
                let name = self.text(&node);
                self.reads.insert(name);
            }
            "attribute" => {
                if let Some(object) = node.child_by_field_name("object") {
                    self.visit(object);
                }
            }
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(value);
                }
            }
            "function_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind(&name);
                }
                self.visit_signature(node);
                let free = function_scope_free(node, self.source);
                self.nested_free.extend(free);
            }
            "lambda" => {
                self.visit_signature(node);
                let free = function_scope_free(node, self.source);
                self.nested_free.extend(free);
            }
            "class_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind(&name);
                }
                if let Some(superclasses) = node.child_by_field_name("superclasses") {
                    self.visit(superclasses);
                }
                let free = class_scope_free(node, self.source);
                self.nested_free.extend(free);
            }
            "list_comprehension" | "set_comprehension" | "dictionary_comprehension"
            | "generator_expression" => {
                let free = comprehension_free(node, self.source);
                self.nested_free.extend(free);
            }
            "assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.bind_target(left);
                }
                if let Some(annotation) = node.child_by_field_name("type") {
                    self.visit(annotation);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.visit(right);
                }
            }
            "augmented_assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    if left.kind() == "identifier" {
                        self.bind(&left);
                    }
                    self.visit(left);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.visit(right);
                }
            }
            "named_expression" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind(&name);
                }
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(value);
                }
            }
            "for_statement" => {
                let left = node.child_by_field_name("left");
                if let Some(left) = left {
                    self.bind_target(left);
                }
                for child in code_children(&node) {
                    if Some(child.id()) != left.map(|l| l.id()) {
                        self.visit(child);
                    }
                }
            }
            "as_pattern" => {
                let alias = node.child_by_field_name("alias");
                for child in code_children(&node) {
                    if Some(child.id()) == alias.map(|a| a.id()) {
                        self.bind_target(child);
                    } else {
                        self.visit(child);
                    }
                }
            }
            "except_clause" | "except_group_clause" => self.visit_except_clause(node),
            "import_statement" => {
                for child in code_children(&node) {
                    self.bind_import(child, true);
                }
            }
            "import_from_statement" => {
                let mut cursor = node.walk();
                let names: Vec<_> = node.children_by_field_name("name", &mut cursor).collect();
                for name in names {
                    self.bind_import(name, false);
                }
            }
            "future_import_statement" => {}
            "global_statement" | "nonlocal_statement" => {
                for child in code_children(&node) {
                    if child.kind() == "identifier" {
                        let name = self.text(&child);
                        self.declared_global.insert(name);
                    }
                }
            }
            "case_clause" => {
                for child in code_children(&node) {
                    if child.kind() == "case_pattern" {
                        self.bind_pattern(child);
                    } else {
                        self.visit(child);
                    }
                }
            }
            _ => {
                for child in code_children(&node) {
                    self.visit(child);
                }
            }
        }
    }

    /// Decorators, defaults and annotations are evaluated where the function
    /// is defined, not inside it
    fn visit_signature(&mut self, function: Node) {
        if let Some(parameters) = function.child_by_field_name("parameters") {
            for parameter in code_children(&parameters) {
                match parameter.kind() {
                    "default_parameter" | "typed_parameter" | "typed_default_parameter" => {
                        if let Some(annotation) = parameter.child_by_field_name("type") {
                            self.visit(annotation);
                        }
                        if let Some(value) = parameter.child_by_field_name("value") {
                            self.visit(value);
                        }
                    }
                    _ => {}
                }
            }
        }
        if let Some(return_type) = function.child_by_field_name("return_type") {
            self.visit(return_type);
        }
    }

    fn bind_parameters(&mut self, parameters: Node) {
        for parameter in code_children(&parameters) {
            match parameter.kind() {
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(name) = parameter.child_by_field_name("name") {
                        self.bind_identifiers(name);
                    }
                }
                "typed_parameter" => {
                    for child in code_children(&parameter) {
                        if child.kind() != "type" {
                            self.bind_identifiers(child);
                        }
                    }
                }
                "identifier" | "list_splat_pattern" | "dictionary_splat_pattern"
                | "tuple_pattern" => self.bind_identifiers(parameter),
                _ => {}
            }
        }
    }

    fn bind_identifiers(&mut self, node: Node) {
        if node.kind() == "identifier" {
            self.bind(&node);
            return;
        }
        for child in code_children(&node) {
            self.bind_identifiers(child);
        }
    }

    /// Assignment-like targets: names bind, attribute/subscript targets read
    /// their base
    fn bind_target(&mut self, node: Node) {
        match node.kind() {
            "identifier" => self.bind(&node),
            "as_pattern_target" if node.named_child_count() == 0 => self.bind(&node),
            "as_pattern_target" | "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple"
            | "list" | "parenthesized_expression" | "expression_list" | "list_splat_pattern"
            | "list_splat" => {
                for child in code_children(&node) {
                    self.bind_target(child);
                }
            }
            _ => self.visit(node),
        }
    }

    fn bind_import(&mut self, node: Node, plain_import: bool) {
        match node.kind() {
            "aliased_import" => {
                if let Some(alias) = node.child_by_field_name("alias") {
                    self.bind(&alias);
                }
            }
            "dotted_name" => {
                // `import a.b` binds `a`; `from m import b` binds `b`
                let parts = code_children(&node);
                let bound = if plain_import {
                    parts.first()
                } else {
                    parts.last()
                };
                if let Some(part) = bound {
                    self.bind(part);
                }
            }
            "identifier" => self.bind(&node),
            _ => {}
        }
    }

    fn visit_except_clause(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        let mut bind_next = false;
        for child in children {
            if !child.is_named() {
                bind_next = child.kind() == "as";
                continue;
            }
            if bind_next {
                self.bind_target(child);
                bind_next = false;
            } else {
                self.visit(child);
            }
        }
    }

    /// `match` patterns: bare names capture, dotted names and class patterns
    /// read
    fn bind_pattern(&mut self, node: Node) {
        match node.kind() {
            "identifier" => self.bind(&node),
            "dotted_name" => {
                let parts = code_children(&node);
                match parts.as_slice() {
                    [single] => self.bind(single),
                    [first, ..] => self.visit(*first),
                    [] => {}
                }
            }
            "class_pattern" => {
                let children = code_children(&node);
                if let Some((class, arguments)) = children.split_first() {
                    if let Some(first) = code_children(class).first() {
                        self.visit(*first);
                    }
                    for argument in arguments {
                        self.bind_pattern(*argument);
                    }
                }
            }
            "keyword_pattern" => {
                for child in code_children(&node).into_iter().skip(1) {
                    self.bind_pattern(child);
                }
            }
            "as_pattern" => {
                let alias = node.child_by_field_name("alias");
                for child in code_children(&node) {
                    if Some(child.id()) == alias.map(|a| a.id()) {
                        self.bind_target(child);
                    } else {
                        self.bind_pattern(child);
                    }
                }
            }
            "string" | "concatenated_string" | "integer" | "float" | "true" | "false"
            | "none" | "complex_pattern" => {}
            _ => {
                for child in code_children(&node) {
                    self.bind_pattern(child);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn refs(source: &str) -> Vec<String> {
        PythonScopeResolver
            .unresolved_refs(source)
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_parameters_and_locals_resolve() {
        let source = indoc! {"
            def add(a, b=2, *args, c: int = 3, **kwargs):
                total = a + b + c
                for item in args:
                    total += item
                return total + len(kwargs)
        "};
        assert!(refs(source).is_empty());
    }

    #[test]
    fn test_attribute_base_is_reference() {
        let source = indoc! {"
            def to_array(values):
                return np.array(values).reshape(-1)
        "};
        assert_eq!(refs(source), vec!["np"]);
    }

    #[test]
    fn test_module_level_names_are_unresolved() {
        let source = indoc! {"
            def scaled(x):
                return helper(x) * SCALE
        "};
        assert_eq!(refs(source), vec!["SCALE", "helper"]);
    }

    #[test]
    fn test_local_bound_after_use_is_still_local() {
        let source = indoc! {"
            def f(flag):
                if flag:
                    value = 1
                else:
                    value = 2
                return value
        "};
        assert!(refs(source).is_empty());
    }

    #[test]
    fn test_comprehension_and_lambda_scopes() {
        let source = indoc! {"
            def f(rows):
                squares = [x * x for x in rows if x > LIMIT]
                pairs = {k: v for k, v in zip(rows, squares)}
                key = lambda item, default=OFFSET: item + default
                return sorted(pairs, key=key), x
        "};
        assert_eq!(refs(source), vec!["LIMIT", "OFFSET", "x"]);
    }

    #[test]
    fn test_closure_reads_enclosing_locals() {
        let source = indoc! {"
            def outer(n):
                factor = 3
                def inner(m):
                    return m * factor + n + missing
                return inner(n)
        "};
        assert_eq!(refs(source), vec!["missing"]);
    }

    #[test]
    fn test_class_body_names_hidden_from_methods() {
        let source = indoc! {"
            def make():
                class Box:
                    size = 1
                    def get(self):
                        return size
                return Box
        "};
        assert_eq!(refs(source), vec!["size"]);
    }

    #[test]
    fn test_global_declaration_is_not_local() {
        let source = indoc! {"
            def bump():
                global counter
                counter = counter + 1
                return counter
        "};
        assert_eq!(refs(source), vec!["counter"]);
    }

    #[test]
    fn test_binding_statements() {
        let source = indoc! {"
            def load(path):
                import json
                from os import path as osp
                with open(path) as handle, open(osp.join(path, 'x')) as (a, b):
                    data = json.load(handle)
                try:
                    (first, second), *rest = data
                except ValueError as err:
                    raise RuntimeError(str(err))
                if (n := len(rest)) > 0:
                    return first, second, n, a, b
                return None
        "};
        assert!(refs(source).is_empty(), "{:?}", refs(source));
    }

    #[test]
    fn test_signature_references() {
        let source = indoc! {"
            @functools.cache
            def f(x: np.ndarray = DEFAULT, *, y: Optional[int] = None) -> pd.DataFrame:
                return x
        "};
        assert_eq!(
            refs(source),
            vec!["DEFAULT", "Optional", "functools", "np", "pd"]
        );
    }

    #[test]
    fn test_keyword_names_are_not_references() {
        let source = indoc! {"
            def build(value):
                return dict(key=value, other=CONSTANT)
        "};
        assert_eq!(refs(source), vec!["CONSTANT"]);
    }

    #[test]
    fn test_fstring_interpolation_is_read() {
        let source = indoc! {r#"
            def greet():
                return f"hello {name!r} from {self_name:>{width}}"
        "#};
        assert_eq!(refs(source), vec!["name", "self_name", "width"]);
    }

    #[test]
    fn test_attribute_target_reads_object() {
        let source = indoc! {"
            def set_value(value):
                registry.value = value
                cache[value] = True
                return value
        "};
        assert_eq!(refs(source), vec!["cache", "registry"]);
    }

    #[test]
    fn test_match_capture_patterns() {
        let source = indoc! {"
            def describe(command):
                match command:
                    case Point(x=px, y=0):
                        return px
                    case [first, *others]:
                        return first, others
                    case Color.RED:
                        return 'red'
                    case other:
                        return other
        "};
        assert_eq!(refs(source), vec!["Color", "Point"]);
    }

    #[test]
    fn test_indented_method_source() {
        let source = "    def area(self):\n        return self.w * self.h * math.pi\n";
        assert_eq!(refs(source), vec!["math"]);
    }

    #[test]
    fn test_recursive_call_is_unresolved() {
        let source = indoc! {"
            def fact(n):
                return 1 if n <= 1 else n * fact(n - 1)
        "};
        assert_eq!(refs(source), vec!["fact"]);
    }
}
