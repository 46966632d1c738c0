use crate::analyzers::python::{node_text, top_level_functions, ParsedSource};
use crate::analyzers::{get_resolver, ScopeResolver};
use crate::cfg::returns_nonconstant;
use crate::complexity::cyclomatic_complexity;
use crate::core::ContainmentResult;
use crate::selection::classify;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use super::select::{resolve_config, resolve_settings};

pub struct InspectConfig {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub allowed_libraries: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    FullySelfContained,
    WeaklySelfContained,
    Rejected,
}

/// Per-function analysis report, printed as one JSON line
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FunctionReport {
    pub name: String,
    pub unresolved_refs: BTreeSet<String>,
    pub classification: Classification,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub attributed: BTreeSet<String>,
    pub returns_nonconstant: Option<bool>,
    pub cyclomatic_complexity: Option<u32>,
}

pub fn inspect_file(config: InspectConfig) -> Result<Vec<FunctionReport>> {
    let file_config = resolve_config(config.config.as_deref())?;
    let settings = resolve_settings(&file_config, config.allowed_libraries, None);

    let content = fs::read_to_string(&config.path)
        .with_context(|| format!("Failed to read {}", config.path.display()))?;
    let reports = analyze_source(&content, &settings.allowed_libraries, get_resolver().as_ref())
        .with_context(|| format!("Failed to analyze {}", config.path.display()))?;

    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }
    Ok(reports)
}

/// Analyze every top-level function of a module. Without an import table
/// only direct references to allowed libraries are attributed.
pub fn analyze_source(
    content: &str,
    allowed_libraries: &BTreeSet<String>,
    resolver: &dyn ScopeResolver,
) -> Result<Vec<FunctionReport>> {
    let parsed = ParsedSource::parse(content)?;
    let mut reports = Vec::new();

    for function in top_level_functions(parsed.root()) {
        // Include decorators in the analyzed slice
        let outer = function
            .parent()
            .filter(|parent| parent.kind() == "decorated_definition")
            .unwrap_or(function);
        let code = node_text(&outer, parsed.source());
        let name = function
            .child_by_field_name("name")
            .map(|node| parsed.text(&node).to_string())
            .unwrap_or_default();

        let unresolved_refs = match resolver.unresolved_refs(code) {
            Ok(refs) => refs,
            Err(e) => {
                log::warn!("Skipping {}: {}", name, e);
                continue;
            }
        };
        let (classification, attributed) =
            match classify(&unresolved_refs, allowed_libraries, None) {
                ContainmentResult::FullySelfContained => {
                    (Classification::FullySelfContained, BTreeSet::new())
                }
                ContainmentResult::WeaklySelfContained {
                    attributed_libraries,
                } => (Classification::WeaklySelfContained, attributed_libraries),
                ContainmentResult::Rejected => (Classification::Rejected, BTreeSet::new()),
            };

        reports.push(FunctionReport {
            name,
            unresolved_refs,
            classification,
            attributed,
            returns_nonconstant: returns_nonconstant(code).ok(),
            cyclomatic_complexity: cyclomatic_complexity(code).ok(),
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::PythonScopeResolver;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn allowed(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_analyze_module_functions() {
        let source = indoc! {"
            import math

            def area(r):
                return math.pi * r * r

            def scaled(x):
                return helper(x) * 2

            def constant():
                return 1
        "};
        let reports =
            analyze_source(source, &allowed(&["math"]), &PythonScopeResolver::new()).unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].name, "area");
        assert_eq!(reports[0].classification, Classification::WeaklySelfContained);
        assert_eq!(reports[0].attributed, allowed(&["math"]));
        assert_eq!(reports[0].returns_nonconstant, Some(true));

        assert_eq!(reports[1].name, "scaled");
        assert_eq!(reports[1].classification, Classification::Rejected);
        assert_eq!(reports[1].unresolved_refs, allowed(&["helper"]));

        assert_eq!(reports[2].classification, Classification::FullySelfContained);
        assert_eq!(reports[2].returns_nonconstant, Some(false));
        assert_eq!(reports[2].cyclomatic_complexity, Some(1));
    }

    #[test]
    fn test_decorator_references_count() {
        let source = indoc! {"
            @cache
            def f(x):
                return x + 1
        "};
        let reports = analyze_source(source, &allowed(&[]), &PythonScopeResolver::new()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].name, "f");
        assert_eq!(reports[0].unresolved_refs, allowed(&["cache"]));
    }

    #[test]
    fn test_syntax_error_fails() {
        let result = analyze_source("def f(:\n", &allowed(&[]), &PythonScopeResolver::new());
        assert!(result.is_err());
    }
}
