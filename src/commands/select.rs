use crate::config::{load_config, load_config_file, BenchmineConfig};
use crate::git::CommitWindow;
use crate::selection::{
    HistoryWindow, PipelineInputs, SelectionPipeline, SelectionSettings, SelectionSummary,
};
use anyhow::Result;
use colored::*;
use std::path::{Path, PathBuf};

pub struct SelectConfig {
    pub methods: PathBuf,
    pub files: PathBuf,
    pub output_dir: PathBuf,
    pub repo: Option<PathBuf>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub config: Option<PathBuf>,
    pub allowed_libraries: Option<Vec<String>>,
    pub expansion_depth: Option<u32>,
}

/// Explicit config file, or discovery from the working directory
pub fn resolve_config(path: Option<&Path>) -> Result<BenchmineConfig> {
    match path {
        Some(path) => load_config_file(path),
        None => Ok(load_config()),
    }
}

/// Command-line flags override configuration values
pub fn resolve_settings(
    config: &BenchmineConfig,
    allowed_libraries: Option<Vec<String>>,
    expansion_depth: Option<u32>,
) -> SelectionSettings {
    let mut settings = SelectionSettings::from_config(config);
    if let Some(libraries) = allowed_libraries {
        settings.allowed_libraries = libraries
            .into_iter()
            .map(|lib| lib.trim().to_string())
            .filter(|lib| !lib.is_empty())
            .collect();
    }
    if let Some(depth) = expansion_depth {
        settings.expansion_depth = depth;
    }
    settings
}

pub fn select_functions(config: SelectConfig) -> Result<SelectionSummary> {
    let file_config = resolve_config(config.config.as_deref())?;
    let settings = resolve_settings(
        &file_config,
        config.allowed_libraries,
        config.expansion_depth,
    );

    let history = match (config.repo, config.since, config.until) {
        (Some(repo_path), Some(since), Some(until)) => Some(HistoryWindow {
            repo_path,
            window: CommitWindow::parse(&since, &until)?,
        }),
        (None, None, None) => None,
        _ => anyhow::bail!("--repo, --since and --until must be given together"),
    };

    let inputs = PipelineInputs {
        methods_path: config.methods,
        files_path: config.files,
        output_dir: config.output_dir,
        history,
    };
    let summary = SelectionPipeline::new(settings).run(&inputs)?;
    print_summary(&summary, &inputs.output_dir);
    Ok(summary)
}

fn print_summary(summary: &SelectionSummary, output_dir: &Path) {
    println!("{}", "Selection summary".bold());
    println!("  methods loaded:          {}", summary.total_methods);
    if let Some(modified) = summary.modified_methods {
        println!("  modified in window:      {}", modified);
    }
    println!("  candidates:              {}", summary.candidates);
    println!(
        "  self-contained:          {} ({} after return filter)",
        summary.self_contained.to_string().green(),
        summary.filtered_self_contained
    );
    println!(
        "  class methods:           {}",
        summary.class_methods.to_string().green()
    );
    println!(
        "  weakly self-contained:   {} ({} after return filter)",
        summary.weakly_self_contained.to_string().yellow(),
        summary.filtered_weakly_self_contained
    );
    for level in &summary.levels {
        println!(
            "  level {}:                 {} functions, {} class methods, {} weakly",
            level.level,
            level.self_contained.to_string().green(),
            level.class_methods,
            level.weakly_self_contained.to_string().yellow()
        );
    }
    println!(
        "  {} {}",
        "benchmark candidates:".bold(),
        summary.benchmark_candidates.to_string().bold().cyan()
    );
    println!("  written to {}", output_dir.display());
}
