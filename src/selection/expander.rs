//! Containment expansion.
//!
//! A function that would be rejected only because it calls functions already
//! accepted is itself accepted one level up, as long as at least one of those
//! calls passes the target's arity. Each round looks one call deep; the
//! pipeline chains rounds to reach deeper levels.

use crate::analyzers::python::{extract_function_calls, function_name};
use crate::analyzers::ScopeResolver;
use crate::core::{FunctionRecord, SelectedFunction, SelectionKind};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Accepted functions of one expansion round
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelOutput {
    pub level: u32,
    pub self_contained: Vec<SelectedFunction>,
    pub class_methods: Vec<SelectedFunction>,
    pub weakly_self_contained: Vec<SelectedFunction>,
}

impl LevelOutput {
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.self_contained
            .iter()
            .chain(&self.class_methods)
            .chain(&self.weakly_self_contained)
            .map(|f| f.uri.as_str())
    }
}

pub struct ContainmentExpander<'a> {
    resolver: &'a dyn ScopeResolver,
    allowed_libraries: &'a BTreeSet<String>,
}

impl<'a> ContainmentExpander<'a> {
    pub fn new(resolver: &'a dyn ScopeResolver, allowed_libraries: &'a BTreeSet<String>) -> Self {
        Self {
            resolver,
            allowed_libraries,
        }
    }

    /// Promote candidates that call into `pool`. Candidates whose uri is in
    /// `accepted_uris` were accepted by an earlier pass and are skipped.
    pub fn expand(
        &self,
        candidates: &[FunctionRecord],
        pool: &[SelectedFunction],
        level: u32,
        accepted_uris: &HashSet<String>,
    ) -> LevelOutput {
        let targets = build_targets(pool);
        let mut output = LevelOutput {
            level,
            ..LevelOutput::default()
        };
        if targets.is_empty() {
            return output;
        }

        let promoted: Vec<SelectedFunction> = candidates
            .par_iter()
            .filter(|candidate| !accepted_uris.contains(&candidate.uri))
            .filter_map(|candidate| self.promote(candidate, &targets, level))
            .collect();

        for function in promoted {
            match function.kind {
                SelectionKind::Function => output.self_contained.push(function),
                SelectionKind::ClassMethod => output.class_methods.push(function),
                SelectionKind::WeaklySelfContained => output.weakly_self_contained.push(function),
            }
        }
        log::info!(
            "Level {} expansion accepted {} functions, {} class methods, {} weakly self-contained",
            level,
            output.self_contained.len(),
            output.class_methods.len(),
            output.weakly_self_contained.len()
        );
        output
    }

    fn promote(
        &self,
        candidate: &FunctionRecord,
        targets: &HashMap<String, &SelectedFunction>,
        level: u32,
    ) -> Option<SelectedFunction> {
        let calls = match extract_function_calls(&candidate.source, |name| {
            targets.contains_key(name)
        }) {
            Ok(calls) => calls,
            Err(e) => {
                log::debug!("Skipping {} during expansion: {}", candidate.uri, e);
                return None;
            }
        };
        if calls.is_empty() {
            return None;
        }

        let unresolved = match self.resolver.unresolved_refs(&candidate.source) {
            Ok(refs) => refs,
            Err(e) => {
                log::debug!("Skipping {} during expansion: {}", candidate.uri, e);
                return None;
            }
        };

        let unexplained = unresolved
            .iter()
            .any(|name| !targets.contains_key(name) && !self.allowed_libraries.contains(name));
        if unexplained {
            return None;
        }

        let target_refs: BTreeSet<&String> = unresolved
            .iter()
            .filter(|name| targets.contains_key(name.as_str()))
            .collect();
        if target_refs.is_empty() {
            return None;
        }
        let library_refs: Vec<String> = unresolved
            .iter()
            .filter(|name| self.allowed_libraries.contains(name.as_str()))
            .cloned()
            .collect();

        // A local that shadows a target never reaches `target_refs`, so calls
        // to it cannot promote.
        let target = calls.iter().find_map(|call| {
            let target = targets.get(&call.name)?;
            (target_refs.contains(&call.name) && call.arg_count == target.arity).then_some(*target)
        })?;

        if library_refs.is_empty() {
            let kind = if candidate.is_instance_method() {
                SelectionKind::ClassMethod
            } else {
                SelectionKind::Function
            };
            Some(SelectedFunction::from_record(kind, candidate).with_level(level, target))
        } else if candidate.is_instance_method() {
            None
        } else {
            Some(
                SelectedFunction::from_record(SelectionKind::WeaklySelfContained, candidate)
                    .with_libraries(library_refs)
                    .with_level(level, target),
            )
        }
    }
}

/// Pool functions by defined name; the first function with a name wins
fn build_targets(pool: &[SelectedFunction]) -> HashMap<String, &SelectedFunction> {
    let mut targets = HashMap::new();
    for function in pool {
        match function_name(&function.code) {
            Some(name) => {
                targets.entry(name).or_insert(function);
            }
            None => log::debug!("Pool function {} has no parseable name", function.uri),
        }
    }
    targets
}
