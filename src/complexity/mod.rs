pub mod cyclomatic;

pub use cyclomatic::{calculate_cyclomatic, cyclomatic_complexity};

use serde::{Deserialize, Serialize};

/// Inclusive cyclomatic range a benchmark candidate must fall into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityBand {
    pub min_cyclomatic: u32,
    pub max_cyclomatic: u32,
}

impl Default for ComplexityBand {
    fn default() -> Self {
        Self {
            min_cyclomatic: 4,
            max_cyclomatic: 10,
        }
    }
}

impl ComplexityBand {
    pub fn new(min_cyclomatic: u32, max_cyclomatic: u32) -> Self {
        Self {
            min_cyclomatic,
            max_cyclomatic,
        }
    }

    pub fn contains(&self, complexity: u32) -> bool {
        (self.min_cyclomatic..=self.max_cyclomatic).contains(&complexity)
    }
}
