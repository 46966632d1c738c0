// Export modules for library usage
pub mod analyzers;
pub mod cfg;
pub mod cli;
pub mod commands;
pub mod complexity;
pub mod config;
pub mod core;
pub mod errors;
pub mod git;
pub mod io;
pub mod selection;

// Re-export commonly used types
pub use crate::core::{
    ContainmentResult, FileImportTable, FunctionRecord, ImportEntry, ImportTarget,
    SelectedFunction, SelectionKind,
};

pub use crate::analyzers::{get_resolver, PythonScopeResolver, ScopeResolver};

pub use crate::cfg::{returns_nonconstant, ControlFlowGraph};

pub use crate::complexity::{cyclomatic_complexity, ComplexityBand};

pub use crate::config::{load_config, BenchmineConfig};

pub use crate::errors::{ClassificationError, ClassificationResult};

pub use crate::git::{CommitHistory, CommitWindow};

pub use crate::selection::{
    classify, filter_returns, select_benchmark_candidates, ContainmentExpander, FunctionSelector,
    SelectionPipeline, SelectionSettings, SelectionSummary,
};
