//! Function selection: classification, expansion and the filters between
//! them.

pub mod classifier;
pub mod expander;
pub mod filter;
pub mod pipeline;

pub use classifier::{classify, ClassifiedFunctions, FunctionSelector};
pub use expander::{ContainmentExpander, LevelOutput};
pub use filter::{filter_returns, select_benchmark_candidates};
pub use pipeline::{
    HistoryWindow, LevelSummary, ModifiedMethods, PipelineInputs, SelectionPipeline,
    SelectionSettings, SelectionSummary,
};
