//! Property-based tests for self-containment classification
//!
//! - No unresolved references always means fully self-contained
//! - References drawn from the allowed set are always attributed
//! - Without an import table, one unexplained name rejects the function
//! - Classification of generated functions agrees with their free names

use benchmine::core::{FileImportTable, ImportEntry, ImportTarget};
use benchmine::{classify, ContainmentResult, PythonScopeResolver, ScopeResolver};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Python keywords to avoid
const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "case", "class", "continue", "def", "del",
    "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is",
    "lambda", "match", "nonlocal", "not", "or", "pass", "raise", "return", "try", "type",
    "while", "with", "yield",
];

/// Generate a valid Python identifier that is neither a keyword nor a builtin.
/// The `zq` prefix keeps clear of every builtin name.
fn python_identifier() -> impl Strategy<Value = String> {
    "zq[a-z0-9_]{0,12}".prop_filter("not a keyword", |s| !PYTHON_KEYWORDS.contains(&s.as_str()))
}

fn identifier_set(max: usize) -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(python_identifier(), 0..max)
}

proptest! {
    #[test]
    fn prop_empty_refs_are_fully_self_contained(allowed in identifier_set(6)) {
        prop_assert_eq!(
            classify(&BTreeSet::new(), &allowed, None),
            ContainmentResult::FullySelfContained
        );
    }

    #[test]
    fn prop_allowed_refs_are_weakly_self_contained(
        allowed in identifier_set(8),
        pick in prop::collection::vec(any::<prop::sample::Index>(), 1..4),
    ) {
        prop_assume!(!allowed.is_empty());
        let pool: Vec<&String> = allowed.iter().collect();
        let refs: BTreeSet<String> = pick.iter().map(|i| i.get(&pool).to_string()).collect();

        prop_assert_eq!(
            classify(&refs, &allowed, None),
            ContainmentResult::WeaklySelfContained { attributed_libraries: refs.clone() }
        );
    }

    #[test]
    fn prop_unexplained_name_without_table_is_rejected(
        allowed in identifier_set(6),
        stranger in python_identifier(),
    ) {
        prop_assume!(!allowed.contains(&stranger));
        let refs: BTreeSet<String> = [stranger].into_iter().collect();
        prop_assert_eq!(classify(&refs, &allowed, None), ContainmentResult::Rejected);
    }

    #[test]
    fn prop_aliased_import_of_allowed_root_is_attributed(
        alias in python_identifier(),
        root in python_identifier(),
        submodule in python_identifier(),
    ) {
        prop_assume!(alias != root);
        let mut table = FileImportTable::new("m.py");
        table.imports.push(ImportEntry::new(
            alias.clone(),
            ImportTarget::Aliased { alias: alias.clone(), from: format!("{}.{}", root, submodule) },
        ));
        let allowed: BTreeSet<String> = [root].into_iter().collect();
        let refs: BTreeSet<String> = [alias].into_iter().collect();

        prop_assert!(classify(&refs, &allowed, Some(&table)).is_accepted());
        prop_assert_eq!(classify(&refs, &BTreeSet::new(), Some(&table)), ContainmentResult::Rejected);
    }

    #[test]
    fn prop_generated_function_refs_match_free_names(
        param in python_identifier(),
        free in python_identifier(),
    ) {
        prop_assume!(param != free);
        let source = format!("def f({p}):\n    y = {p} + {g}\n    return y\n", p = param, g = free);

        let refs = PythonScopeResolver::new().unresolved_refs(&source).unwrap();
        prop_assert_eq!(refs.iter().cloned().collect::<Vec<_>>(), vec![free.clone()]);

        let allowed: BTreeSet<String> = [free].into_iter().collect();
        let is_weak = matches!(
            classify(&refs, &allowed, None),
            ContainmentResult::WeaklySelfContained { .. }
        );
        prop_assert!(is_weak);
    }
}
