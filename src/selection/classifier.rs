//! Self-containment classification.

use crate::analyzers::{PythonScopeResolver, ScopeResolver};
use crate::core::{
    ContainmentResult, FileImportTable, FunctionRecord, SelectedFunction, SelectionKind,
};
use crate::errors::ClassificationResult;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Classify a function from its unresolved references.
///
/// References are explained either directly (the name itself is an allowed
/// library) or through the file's imports (the name is bound by an import
/// whose root module is allowed). Without an import table only the direct
/// route exists.
pub fn classify(
    unresolved_refs: &BTreeSet<String>,
    allowed_libraries: &BTreeSet<String>,
    file_imports: Option<&FileImportTable>,
) -> ContainmentResult {
    if unresolved_refs.is_empty() {
        return ContainmentResult::FullySelfContained;
    }

    if unresolved_refs.is_subset(allowed_libraries) {
        return ContainmentResult::WeaklySelfContained {
            attributed_libraries: unresolved_refs.clone(),
        };
    }

    let Some(table) = file_imports else {
        return ContainmentResult::Rejected;
    };

    let attributed: BTreeSet<String> = unresolved_refs
        .iter()
        .filter(|name| is_allowed_import(table, name, allowed_libraries))
        .cloned()
        .collect();

    if attributed.len() == unresolved_refs.len() {
        ContainmentResult::WeaklySelfContained {
            attributed_libraries: attributed,
        }
    } else {
        ContainmentResult::Rejected
    }
}

fn is_allowed_import(table: &FileImportTable, name: &str, allowed: &BTreeSet<String>) -> bool {
    table
        .entries()
        .filter(|entry| entry.bound_name == name)
        .filter_map(|entry| entry.root_module())
        .any(|module| allowed.contains(module))
}

/// The three output buckets of a classification pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassifiedFunctions {
    pub self_contained: Vec<SelectedFunction>,
    pub class_methods: Vec<SelectedFunction>,
    pub weakly_self_contained: Vec<SelectedFunction>,
}

impl ClassifiedFunctions {
    pub fn total(&self) -> usize {
        self.self_contained.len() + self.class_methods.len() + self.weakly_self_contained.len()
    }
}

/// Classifies function records against an allowed-library set and the import
/// tables of their files
pub struct FunctionSelector {
    resolver: Box<dyn ScopeResolver>,
    allowed_libraries: BTreeSet<String>,
    file_imports: HashMap<String, FileImportTable>,
}

impl FunctionSelector {
    pub fn new<I>(allowed_libraries: BTreeSet<String>, file_imports: I) -> Self
    where
        I: IntoIterator<Item = FileImportTable>,
    {
        Self::with_resolver(
            Box::new(PythonScopeResolver::new()),
            allowed_libraries,
            file_imports,
        )
    }

    pub fn with_resolver<I>(
        resolver: Box<dyn ScopeResolver>,
        allowed_libraries: BTreeSet<String>,
        file_imports: I,
    ) -> Self
    where
        I: IntoIterator<Item = FileImportTable>,
    {
        let mut tables = HashMap::new();
        for table in file_imports {
            // First table per path wins
            tables.entry(table.file_path.clone()).or_insert(table);
        }
        Self {
            resolver,
            allowed_libraries,
            file_imports: tables,
        }
    }

    pub fn resolver(&self) -> &dyn ScopeResolver {
        self.resolver.as_ref()
    }

    pub fn allowed_libraries(&self) -> &BTreeSet<String> {
        &self.allowed_libraries
    }

    pub fn import_table(&self, file_path: &str) -> Option<&FileImportTable> {
        self.file_imports.get(file_path)
    }

    pub fn check_containment(
        &self,
        record: &FunctionRecord,
    ) -> ClassificationResult<ContainmentResult> {
        let unresolved = self.resolver.unresolved_refs(&record.source)?;
        Ok(classify(
            &unresolved,
            &self.allowed_libraries,
            self.import_table(&record.file_path),
        ))
    }

    /// Classify every record in parallel and sort the accepted ones into
    /// buckets, keeping input order. Functions that fail to analyze are
    /// logged and dropped; weakly self-contained methods are dropped.
    pub fn classify_all(&self, records: &[FunctionRecord]) -> ClassifiedFunctions {
        let results: Vec<_> = records
            .par_iter()
            .map(|record| (record, self.check_containment(record)))
            .collect();

        let mut classified = ClassifiedFunctions::default();
        for (record, result) in results {
            match result {
                Ok(ContainmentResult::FullySelfContained) => {
                    if record.is_instance_method() {
                        classified
                            .class_methods
                            .push(SelectedFunction::from_record(SelectionKind::ClassMethod, record));
                    } else {
                        classified
                            .self_contained
                            .push(SelectedFunction::from_record(SelectionKind::Function, record));
                    }
                }
                Ok(ContainmentResult::WeaklySelfContained {
                    attributed_libraries,
                }) => {
                    if record.is_instance_method() {
                        continue;
                    }
                    classified.weakly_self_contained.push(
                        SelectedFunction::from_record(SelectionKind::WeaklySelfContained, record)
                            .with_libraries(attributed_libraries),
                    );
                }
                Ok(ContainmentResult::Rejected) => {}
                Err(e) => {
                    log::debug!("Skipping {}: {}", record.uri, e);
                }
            }
        }
        classified
    }
}
