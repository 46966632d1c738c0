use crate::complexity::ComplexityBand;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Library roots accepted when no configuration names its own
pub static DEFAULT_ALLOWED_LIBRARIES: Lazy<BTreeSet<String>> = Lazy::new(|| {
    [
        // Typing and validation
        "typing", "typing_extensions", "types", "dataclasses", "enum", "abc", "pydantic", "attrs",
        "cerberus",
        // Numerics
        "math", "cmath", "decimal", "fractions", "statistics", "random", "numpy", "scipy",
        "sympy", "mpmath", "gmpy2", "uncertainties", "skimage", "pint",
        // Data structures
        "collections", "itertools", "functools", "operator", "copy", "heapq", "bisect", "array",
        "weakref", "graphlib", "toolz", "more_itertools", "sortedcontainers", "portion",
        "boltons", "networkx", "fn",
        // Text
        "re", "regex", "string", "textwrap", "unicodedata", "difflib", "glom", "jinja2",
        "pyparsing", "nltk",
        // Time
        "datetime", "time", "calendar", "dateutil", "pytz", "zoneinfo", "pandas.tseries.offsets",
        // Formats
        "json", "yaml", "toml", "csv", "pickle", "marshal", "configparser", "tomli", "base64",
        "binascii", "struct", "codecs", "xml", "urllib",
        // Frames
        "pandas", "polars", "xarray", "faker",
        // Introspection
        "ast", "inspect", "pprint",
        // Domain libraries
        "rdkit", "geopandas", "empyrical", "constraint", "music21", "ete3",
    ]
    .into_iter()
    .map(String::from)
    .collect()
});

pub const DEFAULT_EXPANSION_DEPTH: u32 = 2;

/// Root configuration structure, read from `.benchmine.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BenchmineConfig {
    /// Classification and expansion settings
    #[serde(default)]
    pub selection: Option<SelectionConfig>,

    /// Benchmark candidate complexity band
    #[serde(default)]
    pub complexity: Option<ComplexityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SelectionConfig {
    /// Replaces the default allowed-library set when present
    #[serde(default)]
    pub allowed_libraries: Option<Vec<String>>,

    /// Number of expansion rounds after the base classification
    #[serde(default)]
    pub expansion_depth: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ComplexityConfig {
    #[serde(default)]
    pub min_cyclomatic: Option<u32>,
    #[serde(default)]
    pub max_cyclomatic: Option<u32>,
}

impl BenchmineConfig {
    pub fn allowed_libraries(&self) -> BTreeSet<String> {
        self.selection
            .as_ref()
            .and_then(|s| s.allowed_libraries.as_ref())
            .map(|libs| libs.iter().cloned().collect())
            .unwrap_or_else(|| DEFAULT_ALLOWED_LIBRARIES.clone())
    }

    pub fn expansion_depth(&self) -> u32 {
        self.selection
            .as_ref()
            .and_then(|s| s.expansion_depth)
            .unwrap_or(DEFAULT_EXPANSION_DEPTH)
    }

    pub fn complexity_band(&self) -> ComplexityBand {
        let defaults = ComplexityBand::default();
        let complexity = self.complexity.clone().unwrap_or_default();
        ComplexityBand::new(
            complexity.min_cyclomatic.unwrap_or(defaults.min_cyclomatic),
            complexity.max_cyclomatic.unwrap_or(defaults.max_cyclomatic),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchmineConfig::default();
        assert_eq!(config.expansion_depth(), 2);
        assert_eq!(config.complexity_band(), ComplexityBand::new(4, 10));
        let libs = config.allowed_libraries();
        assert!(libs.contains("numpy"));
        assert!(libs.contains("math"));
        assert!(!libs.contains("requests"));
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: BenchmineConfig = toml::from_str(
            r#"
            [selection]
            allowed_libraries = ["math"]

            [complexity]
            max_cyclomatic = 15
            "#,
        )
        .unwrap();
        assert_eq!(config.expansion_depth(), 2);
        assert_eq!(config.complexity_band(), ComplexityBand::new(4, 15));
        assert_eq!(
            config.allowed_libraries().into_iter().collect::<Vec<_>>(),
            vec!["math"]
        );
    }
}
