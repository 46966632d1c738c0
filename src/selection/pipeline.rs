//! End-to-end selection run over method/file metainfo.
//!
//! Stages run in sequence and each writes its JSON file in full before the
//! next starts: commit window, type-hint filter, classification, return
//! filter, expansion rounds, complexity band.

use super::classifier::{ClassifiedFunctions, FunctionSelector};
use super::expander::{ContainmentExpander, LevelOutput};
use super::filter::{filter_returns, select_benchmark_candidates};
use crate::analyzers::python::has_non_basic_type_hint;
use crate::complexity::ComplexityBand;
use crate::config::BenchmineConfig;
use crate::core::{FileImportTable, FunctionRecord, SelectedFunction};
use crate::git::{modified_functions, CommitHistory, CommitWindow};
use crate::io::{load_json, save_json};
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::info_span;

pub const MODIFIED_METHODS_FILE: &str = "modified_methods.json";
pub const SELF_CONTAINED_FILE: &str = "self_contained.json";
pub const SELF_CONTAINED_CLASS_METHOD_FILE: &str = "self_contained_class_method.json";
pub const WEAKLY_SELF_CONTAINED_FILE: &str = "weakly_self_contained.json";
pub const BENCHMARK_CANDIDATES_FILE: &str = "benchmark_candidates.json";

fn filtered(name: &str) -> String {
    format!("filtered_{}", name)
}

fn level_file(level: u32, name: &str) -> String {
    format!("level_{}_{}", level, name)
}

/// Settings resolved from configuration and command-line overrides
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSettings {
    pub allowed_libraries: BTreeSet<String>,
    pub expansion_depth: u32,
    pub complexity_band: ComplexityBand,
}

impl SelectionSettings {
    pub fn from_config(config: &BenchmineConfig) -> Self {
        Self {
            allowed_libraries: config.allowed_libraries(),
            expansion_depth: config.expansion_depth(),
            complexity_band: config.complexity_band(),
        }
    }
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self::from_config(&BenchmineConfig::default())
    }
}

/// Repository history restricting candidates to recently changed functions
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    pub repo_path: PathBuf,
    pub window: CommitWindow,
}

#[derive(Debug, Clone)]
pub struct PipelineInputs {
    /// Method metainfo: a JSON array of function records
    pub methods_path: PathBuf,
    /// File metainfo: a JSON array of import tables
    pub files_path: PathBuf,
    pub output_dir: PathBuf,
    pub history: Option<HistoryWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModifiedMethods {
    pub modified_methods: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct LevelSummary {
    pub level: u32,
    pub self_contained: usize,
    pub class_methods: usize,
    pub weakly_self_contained: usize,
    pub filtered_self_contained: usize,
    pub filtered_weakly_self_contained: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SelectionSummary {
    pub total_methods: usize,
    /// Present when a commit window was applied
    pub modified_methods: Option<usize>,
    pub candidates: usize,
    pub self_contained: usize,
    pub class_methods: usize,
    pub weakly_self_contained: usize,
    pub filtered_self_contained: usize,
    pub filtered_weakly_self_contained: usize,
    pub levels: Vec<LevelSummary>,
    pub benchmark_candidates: usize,
}

pub struct SelectionPipeline {
    settings: SelectionSettings,
}

impl SelectionPipeline {
    pub fn new(settings: SelectionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SelectionSettings {
        &self.settings
    }

    pub fn run(&self, inputs: &PipelineInputs) -> Result<SelectionSummary> {
        let (records, tables) = {
            let _span = info_span!("load_inputs").entered();
            let records: Vec<FunctionRecord> = load_json(&inputs.methods_path)?;
            let tables: Vec<FileImportTable> = load_json(&inputs.files_path)?;
            log::info!(
                "Loaded {} methods and {} files",
                records.len(),
                tables.len()
            );
            (records, tables)
        };
        let output_dir = inputs.output_dir.as_path();
        let mut summary = SelectionSummary {
            total_methods: records.len(),
            ..SelectionSummary::default()
        };

        let windowed = match &inputs.history {
            Some(history) => {
                let _span = info_span!("commit_window").entered();
                let modified = modified_in_window(history, &records)?;
                save_json(
                    &output_dir.join(MODIFIED_METHODS_FILE),
                    &ModifiedMethods {
                        modified_methods: modified.clone(),
                    },
                )?;
                summary.modified_methods = Some(modified.len());
                let modified: HashSet<String> = modified.into_iter().collect();
                records
                    .into_iter()
                    .filter(|record| modified.contains(&record.uri))
                    .collect()
            }
            None => records,
        };

        let candidates: Vec<FunctionRecord> = {
            let _span = info_span!("type_hint_filter").entered();
            windowed
                .into_par_iter()
                .filter(|record| !has_non_basic_type_hint(&record.source))
                .collect()
        };
        summary.candidates = candidates.len();
        log::info!("{} candidate functions after filtering", candidates.len());

        let selector = FunctionSelector::new(self.settings.allowed_libraries.clone(), tables);
        let classified = {
            let _span = info_span!("classification").entered();
            selector.classify_all(&candidates)
        };
        write_buckets(output_dir, None, &classified)?;
        summary.self_contained = classified.self_contained.len();
        summary.class_methods = classified.class_methods.len();
        summary.weakly_self_contained = classified.weakly_self_contained.len();

        let (filtered_self_contained, filtered_weakly) = {
            let _span = info_span!("return_filter").entered();
            (
                filter_returns(&classified.self_contained),
                filter_returns(&classified.weakly_self_contained),
            )
        };
        save_json(
            &output_dir.join(filtered(SELF_CONTAINED_FILE)),
            &filtered_self_contained,
        )?;
        save_json(
            &output_dir.join(filtered(WEAKLY_SELF_CONTAINED_FILE)),
            &filtered_weakly,
        )?;
        summary.filtered_self_contained = filtered_self_contained.len();
        summary.filtered_weakly_self_contained = filtered_weakly.len();

        let mut accepted_uris: HashSet<String> = classified
            .self_contained
            .iter()
            .chain(&classified.class_methods)
            .chain(&classified.weakly_self_contained)
            .map(|f| f.uri.clone())
            .collect();
        let mut benchmark_pool: Vec<SelectedFunction> = filtered_self_contained
            .iter()
            .chain(&filtered_weakly)
            .cloned()
            .collect();

        let expander =
            ContainmentExpander::new(selector.resolver(), &self.settings.allowed_libraries);
        let mut pool = filtered_self_contained;
        for level in 1..=self.settings.expansion_depth {
            let _span = info_span!("expansion", level = level).entered();
            let output = expander.expand(&candidates, &pool, level, &accepted_uris);
            accepted_uris.extend(output.uris().map(String::from));
            write_level(output_dir, &output)?;

            let level_self_contained = filter_returns(&output.self_contained);
            let level_weakly = filter_returns(&output.weakly_self_contained);
            save_json(
                &output_dir.join(filtered(&level_file(level, SELF_CONTAINED_FILE))),
                &level_self_contained,
            )?;
            save_json(
                &output_dir.join(filtered(&level_file(level, WEAKLY_SELF_CONTAINED_FILE))),
                &level_weakly,
            )?;

            summary.levels.push(LevelSummary {
                level,
                self_contained: output.self_contained.len(),
                class_methods: output.class_methods.len(),
                weakly_self_contained: output.weakly_self_contained.len(),
                filtered_self_contained: level_self_contained.len(),
                filtered_weakly_self_contained: level_weakly.len(),
            });
            benchmark_pool.extend(level_weakly);
            benchmark_pool.extend(level_self_contained.iter().cloned());
            pool = level_self_contained;
        }

        let benchmark =
            select_benchmark_candidates(&benchmark_pool, self.settings.complexity_band);
        save_json(&output_dir.join(BENCHMARK_CANDIDATES_FILE), &benchmark)?;
        summary.benchmark_candidates = benchmark.len();

        log::info!(
            "Selection finished: {} benchmark candidates",
            summary.benchmark_candidates
        );
        Ok(summary)
    }
}

fn modified_in_window(history: &HistoryWindow, records: &[FunctionRecord]) -> Result<Vec<String>> {
    let repo = CommitHistory::open(&history.repo_path)?;
    let ranges = repo.changed_line_ranges(&history.window)?;
    let modified = modified_functions(&ranges, records);
    log::info!(
        "{} methods modified between {} and {}",
        modified.len(),
        history.window.since,
        history.window.until
    );
    Ok(modified)
}

fn write_buckets(
    output_dir: &Path,
    level: Option<u32>,
    buckets: &ClassifiedFunctions,
) -> Result<()> {
    let name = |file: &str| match level {
        Some(level) => output_dir.join(level_file(level, file)),
        None => output_dir.join(file),
    };
    save_json(&name(SELF_CONTAINED_FILE), &buckets.self_contained)?;
    save_json(&name(SELF_CONTAINED_CLASS_METHOD_FILE), &buckets.class_methods)?;
    save_json(&name(WEAKLY_SELF_CONTAINED_FILE), &buckets.weakly_self_contained)?;
    Ok(())
}

fn write_level(output_dir: &Path, output: &LevelOutput) -> Result<()> {
    let buckets = ClassifiedFunctions {
        self_contained: output.self_contained.clone(),
        class_methods: output.class_methods.clone(),
        weakly_self_contained: output.weakly_self_contained.clone(),
    };
    write_buckets(output_dir, Some(output.level), &buckets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_file_names() {
        assert_eq!(filtered(SELF_CONTAINED_FILE), "filtered_self_contained.json");
        assert_eq!(
            filtered(&level_file(2, WEAKLY_SELF_CONTAINED_FILE)),
            "filtered_level_2_weakly_self_contained.json"
        );
        assert_eq!(
            level_file(1, SELF_CONTAINED_CLASS_METHOD_FILE),
            "level_1_self_contained_class_method.json"
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = SelectionSettings::default();
        assert_eq!(settings.expansion_depth, 2);
        assert_eq!(settings.complexity_band, ComplexityBand::new(4, 10));
    }
}
